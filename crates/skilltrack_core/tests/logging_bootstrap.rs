use skilltrack_core::{default_log_level, init_logging, logging_status};

#[test]
fn bootstrap_creates_the_log_dir_and_reports_status() {
    let workspace = tempfile::tempdir().unwrap();
    let log_dir = workspace.path().join("logs");
    let log_dir_str = log_dir.to_str().unwrap().to_string();

    init_logging(default_log_level(), &log_dir_str).unwrap();
    init_logging(default_log_level(), &log_dir_str).unwrap();

    let (level, active_dir) = logging_status().unwrap();
    assert_eq!(level, default_log_level());
    assert_eq!(active_dir, log_dir);
    assert!(log_dir.is_dir());

    let other_dir = workspace.path().join("elsewhere");
    let conflict = init_logging(default_log_level(), other_dir.to_str().unwrap()).unwrap_err();
    assert!(conflict.contains("refusing to switch"));
}

#[test]
fn invalid_bootstrap_inputs_are_rejected() {
    assert!(init_logging("loud", "/tmp/skilltrack-logs").is_err());
    assert!(init_logging("info", "relative/logs").is_err());
    assert!(init_logging("info", "   ").is_err());
}
