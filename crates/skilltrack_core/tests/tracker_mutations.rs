use skilltrack_core::{
    MemoryStore, QueryCache, SkillLevel, SkillPatch, SkillTracker, TrackerError, TrackerMetrics,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn tracker() -> SkillTracker<MemoryStore> {
    SkillTracker::new(
        MemoryStore::new(),
        QueryCache::new(),
        Arc::new(TrackerMetrics::default()),
        "u1",
    )
}

#[tokio::test]
async fn add_skill_persists_remotely_and_locally() {
    let tracker = tracker();
    let skill = tracker.add_skill("  Guitar  ", "strings").await.unwrap();

    assert_eq!(skill.name, "Guitar");
    assert_eq!(skill.progress, 0);
    assert_eq!(skill.current_level, SkillLevel::Beginner);
    assert!(skill.completed_levels.is_empty());
    assert_eq!(tracker.local_skills().len(), 1);
    assert_eq!(tracker.store().call_count("create_skill"), 1);
}

#[tokio::test]
async fn blank_skill_name_is_rejected_before_any_remote_call() {
    let tracker = tracker();
    let error = tracker.add_skill("   ", "whatever").await.unwrap_err();

    assert!(matches!(error, TrackerError::Validation(_)));
    assert_eq!(tracker.store().total_calls(), 0);
}

#[tokio::test]
async fn entry_hours_accumulate_across_entries() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    tracker.add_entry(skill.id, "scales", 1.0).await.unwrap();
    tracker.add_entry(skill.id, "chords", 2.0).await.unwrap();
    let updated = tracker
        .add_entry(skill.id, "songs", 1.0)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.total_hours, 4.0);
    assert_eq!(updated.entries.len(), 3);
    assert_eq!(updated.streak, 1);
    assert_eq!(tracker.get_skill(skill.id).unwrap().total_hours, 4.0);
}

#[tokio::test]
async fn invalid_entry_hours_are_rejected_before_any_remote_call() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    let negative = tracker.add_entry(skill.id, "bad", -0.5).await.unwrap_err();
    assert!(matches!(negative, TrackerError::Validation(_)));

    let not_a_number = tracker
        .add_entry(skill.id, "bad", f64::NAN)
        .await
        .unwrap_err();
    assert!(matches!(not_a_number, TrackerError::Validation(_)));

    // only the create_skill call above reached the store
    assert_eq!(tracker.store().total_calls(), 1);
}

#[tokio::test]
async fn mutations_on_unknown_skills_are_tolerated() {
    let tracker = tracker();
    let missing = Uuid::new_v4();

    assert!(tracker
        .add_entry(missing, "ghost", 1.0)
        .await
        .unwrap()
        .is_none());
    assert!(tracker
        .add_progress_update(missing, 50)
        .await
        .unwrap()
        .is_none());
    assert!(!tracker.delete_skill(missing).await.unwrap());
    assert_eq!(tracker.store().total_calls(), 0);
}

#[tokio::test]
async fn progress_below_threshold_updates_value_only() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    let updated = tracker
        .add_progress_update(skill.id, 55)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.progress, 55);
    assert_eq!(updated.current_level, SkillLevel::Beginner);
    assert!(updated.completed_levels.is_empty());
    assert_eq!(updated.progress_updates.len(), 1);
    assert!(updated.progress_updates[0].notes.contains("55"));
    assert!(!updated.progress_updates[0].notes.contains("Congratulations"));
}

#[tokio::test]
async fn full_progress_advances_the_tier_and_resets() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    tracker.add_progress_update(skill.id, 80).await.unwrap();

    let updated = tracker
        .add_progress_update(skill.id, 100)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.current_level, SkillLevel::Novice);
    assert_eq!(updated.progress, 0);
    assert!(updated.completed_levels.contains(&SkillLevel::Beginner));
    let last = updated.progress_updates.last().unwrap();
    assert!(last.notes.contains("Congratulations"));
    assert!(last.notes.contains("beginner"));
    assert!(last.notes.contains("novice"));
}

#[tokio::test]
async fn progress_above_threshold_is_rejected() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    let error = tracker.add_progress_update(skill.id, 101).await.unwrap_err();
    assert!(matches!(error, TrackerError::Validation(_)));
    assert_eq!(tracker.store().call_count("create_progress_update"), 0);
}

#[tokio::test]
async fn intermediate_completion_is_recorded_exactly_once() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    tracker.add_progress_update(skill.id, 100).await.unwrap();
    tracker.add_progress_update(skill.id, 100).await.unwrap();
    tracker.add_progress_update(skill.id, 60).await.unwrap();

    let advanced = tracker
        .add_progress_update(skill.id, 100)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(advanced.current_level, SkillLevel::Advanced);
    assert_eq!(advanced.progress, 0);
    assert!(advanced.completed_levels.contains(&SkillLevel::Intermediate));
    assert_eq!(advanced.completed_levels.len(), 3);

    // the next threshold crossing evaluates at the new tier; intermediate
    // stays recorded once
    let expert = tracker
        .add_progress_update(skill.id, 100)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expert.current_level, SkillLevel::Expert);
    assert_eq!(
        expert
            .completed_levels
            .iter()
            .filter(|level| **level == SkillLevel::Intermediate)
            .count(),
        1
    );
}

#[tokio::test]
async fn expert_tier_holds_at_full_progress() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    for _ in 0..4 {
        tracker.add_progress_update(skill.id, 100).await.unwrap();
    }

    let updated = tracker
        .add_progress_update(skill.id, 100)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.current_level, SkillLevel::Expert);
    assert_eq!(updated.progress, 100);
    assert_eq!(updated.completed_levels.len(), 4);
    assert!(!updated.completed_levels.contains(&SkillLevel::Expert));
}

#[tokio::test]
async fn update_skill_applies_only_patched_fields() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "strings").await.unwrap();

    let patch = SkillPatch {
        description: Some("acoustic only".to_string()),
        ..SkillPatch::default()
    };
    let updated = tracker.update_skill(skill.id, patch).await.unwrap();

    assert_eq!(updated.name, "Guitar");
    assert_eq!(updated.description, "acoustic only");
    assert_eq!(updated.progress, 0);
}

#[tokio::test]
async fn update_skill_validates_patch_fields() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    let blank_name = SkillPatch {
        name: Some("   ".to_string()),
        ..SkillPatch::default()
    };
    assert!(matches!(
        tracker.update_skill(skill.id, blank_name).await,
        Err(TrackerError::Validation(_))
    ));

    let out_of_range = SkillPatch {
        progress: Some(130),
        ..SkillPatch::default()
    };
    assert!(matches!(
        tracker.update_skill(skill.id, out_of_range).await,
        Err(TrackerError::Validation(_))
    ));
    assert_eq!(tracker.store().call_count("update_skill"), 0);
}

#[tokio::test]
async fn delete_skill_removes_local_state() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();

    assert!(tracker.delete_skill(skill.id).await.unwrap());
    assert!(tracker.get_skill(skill.id).is_none());
    assert!(tracker.local_skills().is_empty());
    assert_eq!(tracker.store().call_count("delete_skill"), 1);
}

#[tokio::test]
async fn aggregate_write_failure_surfaces_and_invalidates_cache() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    tracker.get_skills_paginated(None, None).await.unwrap();
    assert_eq!(tracker.get_performance_metrics().cache.size, 1);

    tracker.store().fail_operation("update_skill");
    let error = tracker.add_entry(skill.id, "scales", 1.0).await.unwrap_err();
    assert!(matches!(error, TrackerError::Store(_)));

    // the entry write landed, the aggregate write did not; cached listings
    // are dropped so the next read goes back to the store
    assert_eq!(tracker.store().call_count("create_entry"), 1);
    assert_eq!(tracker.get_performance_metrics().cache.size, 0);
    let local = tracker.get_skill(skill.id).unwrap();
    assert_eq!(local.total_hours, 0.0);
    assert!(local.entries.is_empty());
}

#[tokio::test]
async fn writes_invalidate_cached_listings() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    tracker.get_skills_paginated(None, None).await.unwrap();
    tracker.get_skills_minimal().await.unwrap();
    assert_eq!(tracker.get_performance_metrics().cache.size, 2);

    tracker.add_progress_update(skill.id, 40).await.unwrap();
    assert_eq!(tracker.get_performance_metrics().cache.size, 0);

    let page = tracker.get_skills_paginated(None, None).await.unwrap();
    assert_eq!(page[0].progress, 40);
}

#[tokio::test]
async fn concurrent_entries_on_one_skill_serialize() {
    let tracker = Arc::new(tracker());
    let skill = tracker.add_skill("Guitar", "").await.unwrap();
    tracker.store().set_latency(Some(Duration::from_millis(30)));

    let first = tokio::spawn({
        let tracker = Arc::clone(&tracker);
        async move { tracker.add_entry(skill.id, "morning", 1.0).await }
    });
    let second = tokio::spawn({
        let tracker = Arc::clone(&tracker);
        async move { tracker.add_entry(skill.id, "evening", 2.0).await }
    });
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let local = tracker.get_skill(skill.id).unwrap();
    assert_eq!(local.total_hours, 3.0);
    assert_eq!(local.entries.len(), 2);
    assert_eq!(local.streak, 1);
}

#[tokio::test]
async fn slow_store_calls_time_out() {
    let tracker = tracker().with_call_timeout(Duration::from_millis(20));
    tracker.store().set_latency(Some(Duration::from_millis(200)));

    let error = tracker.add_skill("Guitar", "").await.unwrap_err();
    assert!(matches!(
        error,
        TrackerError::Timeout {
            op: "create_skill"
        }
    ));
    assert_eq!(tracker.get_performance_metrics().counters.store_failures, 1);
    assert!(tracker.local_skills().is_empty());
}
