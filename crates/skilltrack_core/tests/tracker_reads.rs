use skilltrack_core::{
    MemoryStore, QueryCache, Skill, SkillLevel, SkillTracker, TrackerMetrics,
};
use std::sync::Arc;
use std::time::Duration;

fn tracker() -> SkillTracker<MemoryStore> {
    SkillTracker::new(
        MemoryStore::new(),
        QueryCache::new(),
        Arc::new(TrackerMetrics::default()),
        "u1",
    )
}

#[tokio::test]
async fn page_limits_are_normalized() {
    let tracker = tracker();
    for index in 0..3 {
        tracker
            .add_skill(&format!("skill-{index}"), "")
            .await
            .unwrap();
    }

    // zero and missing limits fall back to the default page size
    let with_zero = tracker.get_skills_paginated(None, Some(0)).await.unwrap();
    assert_eq!(with_zero.len(), 3);

    // oversized limits are capped, not rejected
    let capped = tracker
        .get_skills_paginated(Some(0), Some(1000))
        .await
        .unwrap();
    assert_eq!(capped.len(), 3);

    let first_page = tracker.get_skills_paginated(Some(0), Some(2)).await.unwrap();
    assert_eq!(first_page.len(), 2);
    let second_page = tracker.get_skills_paginated(Some(1), Some(2)).await.unwrap();
    assert_eq!(second_page.len(), 1);
}

#[tokio::test]
async fn repeated_reads_hit_the_cache() {
    let tracker = tracker();
    tracker.add_skill("Guitar", "").await.unwrap();

    tracker.get_skills_paginated(None, None).await.unwrap();
    tracker.get_skills_paginated(None, None).await.unwrap();

    assert_eq!(tracker.store().call_count("list_skills"), 1);
    let counters = tracker.get_performance_metrics().counters;
    assert_eq!(counters.cache_hits, 1);
    assert_eq!(counters.cache_misses, 1);
}

#[tokio::test]
async fn distinct_pages_are_cached_independently() {
    let tracker = tracker();
    for index in 0..4 {
        tracker
            .add_skill(&format!("skill-{index}"), "")
            .await
            .unwrap();
    }

    tracker.get_skills_paginated(Some(0), Some(2)).await.unwrap();
    tracker.get_skills_paginated(Some(1), Some(2)).await.unwrap();
    tracker.get_skills_paginated(Some(0), Some(2)).await.unwrap();

    assert_eq!(tracker.store().call_count("list_skills"), 2);
    assert_eq!(tracker.get_performance_metrics().cache.size, 2);
}

#[tokio::test]
async fn minimal_projection_carries_list_fields_only() {
    let tracker = tracker();
    let skill = tracker.add_skill("Guitar", "long description").await.unwrap();
    tracker.add_progress_update(skill.id, 30).await.unwrap();

    let minimal = tracker.get_skills_minimal().await.unwrap();

    assert_eq!(minimal.len(), 1);
    assert_eq!(minimal[0].id, skill.id);
    assert_eq!(minimal[0].name, "Guitar");
    assert_eq!(minimal[0].progress, 30);
    assert_eq!(minimal[0].current_level, SkillLevel::Beginner);
    assert_eq!(minimal[0].streak, 1);

    // second read is served without another store call
    tracker.get_skills_minimal().await.unwrap();
    assert_eq!(tracker.store().call_count("list_skills"), 1);
}

#[tokio::test]
async fn concurrent_misses_coalesce_into_one_fetch() {
    let tracker = Arc::new(tracker());
    tracker.add_skill("Guitar", "").await.unwrap();
    tracker.store().set_latency(Some(Duration::from_millis(80)));

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.get_skills_paginated(None, None).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().len(), 1);
    }

    assert_eq!(tracker.store().call_count("list_skills"), 1);
    let counters = tracker.get_performance_metrics().counters;
    assert_eq!(counters.cache_misses, 3);
    assert_eq!(counters.coalesced_reads, 2);
}

#[tokio::test]
async fn refresh_pulls_server_truth_into_local_state() {
    let tracker = tracker();
    tracker.add_skill("Guitar", "").await.unwrap();
    // another device lands a skill remotely, bypassing this tracker
    tracker.store().seed_skill("u1", Skill::new("Chess", "board"));
    tracker.get_skills_paginated(None, None).await.unwrap();

    let refreshed = tracker.refresh_skills().await.unwrap();

    assert_eq!(refreshed.len(), 2);
    assert_eq!(tracker.local_skills().len(), 2);
    assert_eq!(tracker.get_performance_metrics().cache.size, 0);
}

#[tokio::test]
async fn clear_cache_forces_the_next_read_to_fetch() {
    let tracker = tracker();
    tracker.add_skill("Guitar", "").await.unwrap();

    tracker.get_skills_paginated(None, None).await.unwrap();
    tracker.clear_cache();
    tracker.get_skills_paginated(None, None).await.unwrap();

    assert_eq!(tracker.store().call_count("list_skills"), 2);
}

#[tokio::test]
async fn listings_are_scoped_to_the_tracker_user() {
    let tracker = tracker();
    tracker.add_skill("Guitar", "").await.unwrap();
    tracker.store().seed_skill("u2", Skill::new("Violin", ""));

    let page = tracker.get_skills_paginated(None, None).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Guitar");
}

#[tokio::test]
async fn user_streak_spans_all_local_skills() {
    let tracker = tracker();
    let guitar = tracker.add_skill("Guitar", "").await.unwrap();
    let chess = tracker.add_skill("Chess", "").await.unwrap();
    tracker.add_entry(guitar.id, "scales", 1.0).await.unwrap();
    tracker.add_entry(chess.id, "openings", 0.5).await.unwrap();

    assert_eq!(tracker.user_streak_today(), 1);
}
