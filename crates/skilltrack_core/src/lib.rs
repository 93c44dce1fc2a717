//! Core domain logic for SkillTrack.
//! This crate is the single source of truth for tracking invariants.

pub mod activity;
pub mod cache;
pub mod logging;
pub mod model;
pub mod progression;
pub mod service;
pub mod store;
pub mod streak;

pub use cache::metrics::{MetricsSnapshot, TrackerMetrics};
pub use cache::query_cache::{CacheStats, QueryCache};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::skill::{
    DiaryEntry, ProgressUpdate, Skill, SkillId, SkillLevel, SkillSummary, PROGRESS_MAX,
};
pub use progression::engine::LevelTransition;
pub use service::tracker::{
    CachedQuery, PerformanceReport, SkillTracker, TrackerError, TrackerResult,
};
pub use store::memory::MemoryStore;
pub use store::skill_store::{
    NewEntry, NewProgressUpdate, NewSkill, SkillPatch, SkillStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
