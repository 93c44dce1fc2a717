//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `skilltrack_core` linkage.
//! - Walk one tracker flow end to end against the in-memory store.

use skilltrack_core::{MemoryStore, QueryCache, SkillTracker, TrackerError, TrackerMetrics};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring independently
    // from Flutter/FFI runtime setup.
    println!("skilltrack_core ping={}", skilltrack_core::ping());
    println!("skilltrack_core version={}", skilltrack_core::core_version());

    if let Err(err) = run_smoke().await {
        eprintln!("smoke flow failed: {err}");
        std::process::exit(1);
    }
}

async fn run_smoke() -> Result<(), TrackerError> {
    let tracker = SkillTracker::new(
        MemoryStore::new(),
        QueryCache::new(),
        Arc::new(TrackerMetrics::default()),
        "local-probe",
    );

    let skill = tracker.add_skill("Guitar", "smoke probe").await?;
    tracker.add_entry(skill.id, "first practice", 1.5).await?;
    tracker.add_progress_update(skill.id, 40).await?;

    let page = tracker.get_skills_paginated(None, None).await?;
    println!(
        "skills={} user_streak={}",
        page.len(),
        tracker.user_streak_today()
    );

    let report = tracker.get_performance_metrics();
    println!(
        "cache_size={} store_calls={} cache_misses={}",
        report.cache.size, report.counters.store_calls, report.counters.cache_misses
    );
    Ok(())
}
