//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level tracker functions to Dart via FRB.
//! - Keep error semantics envelope-shaped for UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Mutation and list calls return envelopes; they never throw.
//! - The process-global tracker binds to exactly one user context.
//!
//! # See also
//! - docs/architecture/concurrency.md
//! - docs/architecture/logging.md

use log::{info, warn};
use skilltrack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    MemoryStore, QueryCache, Skill, SkillId, SkillPatch, SkillSummary, SkillTracker,
    TrackerMetrics,
};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

static TRACKER: OnceLock<SkillTracker<MemoryStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Binds the process-global tracker to one user context.
///
/// # FFI contract
/// - Sync call; allocates the tracker on first use.
/// - Idempotent for the same `user_id`; a different one returns an error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_tracker(user_id: String) -> String {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return "user_id must not be empty".to_string();
    }

    let tracker = TRACKER.get_or_init(|| {
        info!("event=tracker_init module=ffi status=ok user_len={}", trimmed.len());
        SkillTracker::new(
            MemoryStore::new(),
            QueryCache::new(),
            Arc::new(TrackerMetrics::default()),
            trimmed,
        )
    });
    if tracker.user_id() != trimmed {
        warn!("event=tracker_init module=ffi status=error reason=user_conflict");
        return format!(
            "tracker already bound to user `{}`; refusing to switch",
            tracker.user_id()
        );
    }
    String::new()
}

/// Full skill projection shipped to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillView {
    /// Stable skill ID in string form.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Progress within the current mastery level, `0..=100`.
    pub progress: u8,
    /// Current mastery level label (`beginner|novice|...`).
    pub level: String,
    /// Labels of completed mastery levels, in progression order.
    pub completed_levels: Vec<String>,
    /// Consecutive-day activity streak.
    pub streak: u32,
    /// Sum of hours across diary entries.
    pub total_hours: f64,
    pub entry_count: u32,
    pub update_count: u32,
    /// Last server-visible mutation, epoch milliseconds.
    pub last_updated_ms: i64,
}

/// Minimal list-row projection for chips and pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillListItem {
    pub id: String,
    pub name: String,
    pub progress: u8,
    pub level: String,
    pub streak: u32,
}

/// Action response envelope for skill mutation flow.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillActionResponse {
    /// Whether the operation changed anything.
    pub ok: bool,
    /// Updated skill projection on success.
    pub skill: Option<SkillView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl SkillActionResponse {
    fn success(message: impl Into<String>, skill: SkillView) -> Self {
        Self {
            ok: true,
            skill: Some(skill),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            skill: None,
            message: message.into(),
        }
    }
}

/// List response envelope for full skill reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillListResponse {
    pub ok: bool,
    pub skills: Vec<SkillView>,
    pub message: String,
}

/// List response envelope for the minimal projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMinimalResponse {
    pub ok: bool,
    pub items: Vec<SkillListItem>,
    pub message: String,
}

/// Cache/counter snapshot for the diagnostics screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceView {
    pub cache_size: u32,
    pub cache_keys: Vec<String>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub store_calls: u64,
    pub store_failures: u64,
    pub coalesced_reads: u64,
}

/// Creates a skill.
///
/// # FFI contract
/// - Async call; runs one remote store write.
/// - Never panics; returns an envelope either way.
pub async fn add_skill(name: String, description: String) -> SkillActionResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => return SkillActionResponse::failure(message),
    };
    match tracker.add_skill(&name, &description).await {
        Ok(skill) => SkillActionResponse::success("Skill created.", skill_view(&skill)),
        Err(err) => SkillActionResponse::failure(format!("add_skill failed: {err}")),
    }
}

/// Records a practice diary entry against a skill.
///
/// # FFI contract
/// - Async call; runs the entry write plus the aggregate write.
/// - A stale `skill_id` returns `ok=false` with no remote call.
/// - Never panics; returns an envelope either way.
pub async fn add_entry(skill_id: String, text: String, hours: f64) -> SkillActionResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => return SkillActionResponse::failure(message),
    };
    let id = match parse_skill_id(&skill_id) {
        Ok(id) => id,
        Err(message) => return SkillActionResponse::failure(message),
    };
    match tracker.add_entry(id, &text, hours).await {
        Ok(Some(skill)) => SkillActionResponse::success("Entry recorded.", skill_view(&skill)),
        Ok(None) => SkillActionResponse::failure("Skill not found; refresh and retry."),
        Err(err) => SkillActionResponse::failure(format!("add_entry failed: {err}")),
    }
}

/// Records a progress value, advancing the mastery level at 100%.
///
/// # FFI contract
/// - Async call; runs the update write plus the aggregate write.
/// - A stale `skill_id` returns `ok=false` with no remote call.
/// - Never panics; returns an envelope either way.
pub async fn add_progress_update(skill_id: String, progress: u8) -> SkillActionResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => return SkillActionResponse::failure(message),
    };
    let id = match parse_skill_id(&skill_id) {
        Ok(id) => id,
        Err(message) => return SkillActionResponse::failure(message),
    };
    match tracker.add_progress_update(id, progress).await {
        Ok(Some(skill)) => SkillActionResponse::success("Progress recorded.", skill_view(&skill)),
        Ok(None) => SkillActionResponse::failure("Skill not found; refresh and retry."),
        Err(err) => SkillActionResponse::failure(format!("add_progress_update failed: {err}")),
    }
}

/// Renames a skill or replaces its description.
///
/// # FFI contract
/// - Async call; `None` fields stay untouched.
/// - Never panics; returns an envelope either way.
pub async fn update_skill(
    skill_id: String,
    name: Option<String>,
    description: Option<String>,
) -> SkillActionResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => return SkillActionResponse::failure(message),
    };
    let id = match parse_skill_id(&skill_id) {
        Ok(id) => id,
        Err(message) => return SkillActionResponse::failure(message),
    };
    let patch = SkillPatch {
        name,
        description,
        ..SkillPatch::default()
    };
    match tracker.update_skill(id, patch).await {
        Ok(skill) => SkillActionResponse::success("Skill updated.", skill_view(&skill)),
        Err(err) => SkillActionResponse::failure(format!("update_skill failed: {err}")),
    }
}

/// Deletes a skill along with its entries and progress history.
///
/// # FFI contract
/// - Async call; a stale `skill_id` returns `ok=false` with no remote call.
/// - Never panics; returns an envelope either way.
pub async fn delete_skill(skill_id: String) -> SkillActionResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => return SkillActionResponse::failure(message),
    };
    let id = match parse_skill_id(&skill_id) {
        Ok(id) => id,
        Err(message) => return SkillActionResponse::failure(message),
    };
    match tracker.delete_skill(id).await {
        Ok(true) => SkillActionResponse {
            ok: true,
            skill: None,
            message: "Skill deleted.".to_string(),
        },
        Ok(false) => SkillActionResponse::failure("Skill not found; refresh and retry."),
        Err(err) => SkillActionResponse::failure(format!("delete_skill failed: {err}")),
    }
}

/// Returns one page of skills, cache-first.
///
/// # FFI contract
/// - Async call; page/limit are normalized, never rejected.
/// - Never panics; returns an envelope either way.
pub async fn get_skills(page: Option<u32>, limit: Option<u32>) -> SkillListResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => {
            return SkillListResponse {
                ok: false,
                skills: Vec::new(),
                message,
            }
        }
    };
    match tracker.get_skills_paginated(page, limit).await {
        Ok(skills) => SkillListResponse {
            ok: true,
            message: format!("Loaded {} skill(s).", skills.len()),
            skills: skills.iter().map(skill_view).collect(),
        },
        Err(err) => SkillListResponse {
            ok: false,
            skills: Vec::new(),
            message: format!("get_skills failed: {err}"),
        },
    }
}

/// Returns the minimal skill projection, cache-first.
///
/// # FFI contract
/// - Async call.
/// - Never panics; returns an envelope either way.
pub async fn get_skills_minimal() -> SkillMinimalResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => {
            return SkillMinimalResponse {
                ok: false,
                items: Vec::new(),
                message,
            }
        }
    };
    match tracker.get_skills_minimal().await {
        Ok(summaries) => SkillMinimalResponse {
            ok: true,
            message: format!("Loaded {} skill(s).", summaries.len()),
            items: summaries.iter().map(skill_list_item).collect(),
        },
        Err(err) => SkillMinimalResponse {
            ok: false,
            items: Vec::new(),
            message: format!("get_skills_minimal failed: {err}"),
        },
    }
}

/// Re-reads the full listing from the store, bypassing the cache.
///
/// # FFI contract
/// - Async call; replaces the local snapshot on success.
/// - Never panics; returns an envelope either way.
pub async fn refresh_skills() -> SkillListResponse {
    let tracker = match active_tracker() {
        Ok(tracker) => tracker,
        Err(message) => {
            return SkillListResponse {
                ok: false,
                skills: Vec::new(),
                message,
            }
        }
    };
    match tracker.refresh_skills().await {
        Ok(skills) => SkillListResponse {
            ok: true,
            message: format!("Refreshed {} skill(s).", skills.len()),
            skills: skills.iter().map(skill_view).collect(),
        },
        Err(err) => SkillListResponse {
            ok: false,
            skills: Vec::new(),
            message: format!("refresh_skills failed: {err}"),
        },
    }
}

/// Consecutive-day streak across all of the user's skills.
///
/// # FFI contract
/// - Sync call over local state; returns 0 before `init_tracker`.
#[flutter_rust_bridge::frb(sync)]
pub fn user_streak() -> u32 {
    TRACKER
        .get()
        .map(|tracker| tracker.user_streak_today())
        .unwrap_or(0)
}

/// Cache and counter snapshot for the diagnostics screen.
///
/// # FFI contract
/// - Sync call; empty snapshot before `init_tracker`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn performance_report() -> PerformanceView {
    let Some(tracker) = TRACKER.get() else {
        return PerformanceView {
            cache_size: 0,
            cache_keys: Vec::new(),
            cache_hits: 0,
            cache_misses: 0,
            store_calls: 0,
            store_failures: 0,
            coalesced_reads: 0,
        };
    };
    let report = tracker.get_performance_metrics();
    PerformanceView {
        cache_size: report.cache.size as u32,
        cache_keys: report.cache.keys,
        cache_hits: report.counters.cache_hits,
        cache_misses: report.counters.cache_misses,
        store_calls: report.counters.store_calls,
        store_failures: report.counters.store_failures,
        coalesced_reads: report.counters.coalesced_reads,
    }
}

/// Drops every cached listing.
///
/// # FFI contract
/// - Sync call; returns whether a tracker was active.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_cache() -> bool {
    match TRACKER.get() {
        Some(tracker) => {
            tracker.clear_cache();
            true
        }
        None => false,
    }
}

fn active_tracker() -> Result<&'static SkillTracker<MemoryStore>, String> {
    TRACKER
        .get()
        .ok_or_else(|| "tracker not initialized; call init_tracker first".to_string())
}

fn parse_skill_id(raw: &str) -> Result<SkillId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid skill id `{raw}`"))
}

fn skill_view(skill: &Skill) -> SkillView {
    SkillView {
        id: skill.id.to_string(),
        name: skill.name.clone(),
        description: skill.description.clone(),
        progress: skill.progress,
        level: skill.current_level.to_string(),
        completed_levels: skill
            .completed_levels
            .iter()
            .map(|level| level.to_string())
            .collect(),
        streak: skill.streak,
        total_hours: skill.total_hours,
        entry_count: skill.entries.len() as u32,
        update_count: skill.progress_updates.len() as u32,
        last_updated_ms: skill.last_updated.timestamp_millis(),
    }
}

fn skill_list_item(summary: &SkillSummary) -> SkillListItem {
    SkillListItem {
        id: summary.id.to_string(),
        name: summary.name.clone(),
        progress: summary.progress,
        level: summary.current_level.to_string(),
        streak: summary.streak,
    }
}
