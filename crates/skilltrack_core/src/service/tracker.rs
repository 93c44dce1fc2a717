//! Skill mutation and read orchestration.
//!
//! # Responsibility
//! - Run every skill mutation end to end: validate, recompute derived state
//!   from the pre-mutation snapshot, persist remotely, republish locally.
//! - Serve list reads through the query cache with miss coalescing.
//!
//! # Invariants
//! - Mutations on one skill id are serialized; distinct skills interleave.
//! - Derived aggregates are computed before the aggregate write is issued.
//! - Local optimistic state changes only after remote success.
//! - Every server-visible mutation invalidates the user's cached listings.
//!
//! # See also
//! - docs/architecture/caching.md
//! - docs/architecture/concurrency.md

use crate::cache::metrics::{MetricsSnapshot, TrackerMetrics};
use crate::cache::query_cache::{CacheStats, QueryCache};
use crate::model::skill::{DiaryEntry, Skill, SkillId, SkillSummary, PROGRESS_MAX};
use crate::progression::engine;
use crate::service::locks::KeyedLocks;
use crate::store::skill_store::{
    NewEntry, NewProgressUpdate, NewSkill, SkillPatch, SkillStore, StoreError, StoreResult,
};
use crate::streak::calc::{skill_streak, user_streak};
use chrono::Utc;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Default page size for paginated skill reads.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Hard ceiling for caller-provided page sizes.
pub const MAX_PAGE_LIMIT: u32 = 100;
/// Default budget for one remote collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

// Paginated pages are invalidated by every write, so they get a short TTL;
// the minimal projection tolerates mild staleness and keeps a longer one.
const SKILLS_PAGE_TTL_SECONDS: i64 = 120;
const SKILLS_MINIMAL_TTL_SECONDS: i64 = 600;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Orchestration error surfaced to UI/FFI callers.
#[derive(Debug)]
pub enum TrackerError {
    /// Malformed input rejected before any remote call.
    Validation(String),
    /// The persistence collaborator failed.
    Store(StoreError),
    /// A remote call exceeded the per-call budget.
    Timeout { op: &'static str },
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Timeout { op } => write!(f, "remote call timed out: {op}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Values the tracker keeps in its query cache.
#[derive(Debug, Clone)]
pub enum CachedQuery {
    /// One page of full skill records.
    Page(Vec<Skill>),
    /// The minimal list projection.
    Minimal(Vec<SkillSummary>),
}

/// Cache stats plus counter snapshot for diagnostics screens.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    pub cache: CacheStats,
    pub counters: MetricsSnapshot,
}

/// Orchestrates skill mutations and cached reads for one user context.
///
/// Cache and metrics are injected so tests (and multiple trackers in one
/// process) observe isolated instances instead of process-wide state.
pub struct SkillTracker<S: SkillStore> {
    store: S,
    cache: QueryCache<CachedQuery>,
    metrics: Arc<TrackerMetrics>,
    user_id: String,
    skills: RwLock<Vec<Skill>>,
    mutation_locks: KeyedLocks,
    fetch_locks: KeyedLocks,
    call_timeout: Duration,
}

impl<S: SkillStore> SkillTracker<S> {
    /// Creates a tracker bound to one user context.
    pub fn new(
        store: S,
        cache: QueryCache<CachedQuery>,
        metrics: Arc<TrackerMetrics>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            user_id: user_id.into(),
            skills: RwLock::new(Vec::new()),
            mutation_locks: KeyedLocks::new(),
            fetch_locks: KeyedLocks::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Overrides the per-call remote budget.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Read access to the underlying store (demo wiring, tests).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// User context this tracker serves.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ----- mutations -------------------------------------------------------

    /// Creates a skill with zeroed aggregates at the starting tier.
    ///
    /// # Contract
    /// - A blank name is rejected before any remote call.
    /// - Local state gains the stored record only after remote success.
    ///
    /// # Errors
    /// - `Validation` for a blank name.
    /// - `Store`/`Timeout` from the persistence collaborator.
    pub async fn add_skill(&self, name: &str, description: &str) -> TrackerResult<Skill> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::Validation(
                "skill name must not be empty".to_string(),
            ));
        }

        let new = NewSkill {
            user_id: self.user_id.clone(),
            name: trimmed.to_string(),
            description: description.trim().to_string(),
        };
        let skill = self
            .remote("create_skill", self.store.create_skill(&new))
            .await?;

        {
            let mut skills = self.write_skills();
            skills.push(skill.clone());
        }
        self.invalidate_user_listings();
        info!(
            "event=skill_created module=tracker status=ok skill_id={} name_len={}",
            skill.id,
            trimmed.len()
        );
        Ok(skill)
    }

    /// Appends a diary entry and persists recomputed aggregates.
    ///
    /// Issues two remote writes: the entry itself, then the skill's
    /// `total_hours`/`streak`/`last_updated`. The writes are not
    /// transactional; when the second fails the first has already landed
    /// and only a fresh read restores consistency (the user's cached
    /// listings are invalidated either way).
    ///
    /// # Contract
    /// - Returns `Ok(None)` without any remote call when `skill_id` is not
    ///   in local state; stale ids are tolerated, not errors.
    /// - Aggregates are computed from the pre-mutation snapshot.
    ///
    /// # Errors
    /// - `Validation` for negative or non-finite hours.
    /// - `Store`/`Timeout` from the persistence collaborator.
    pub async fn add_entry(
        &self,
        skill_id: SkillId,
        text: &str,
        hours: f64,
    ) -> TrackerResult<Option<Skill>> {
        if hours < 0.0 || !hours.is_finite() {
            return Err(TrackerError::Validation(
                "entry hours must be a non-negative number".to_string(),
            ));
        }

        let serialized = self.mutation_locks.handle(&skill_id.to_string());
        let _guard = serialized.lock().await;

        let Some(snapshot) = self.snapshot_skill(skill_id) else {
            info!(
                "event=entry_skipped module=tracker status=ok reason=unknown_skill skill_id={skill_id}"
            );
            return Ok(None);
        };

        let today = Utc::now().date_naive();
        let new_total_hours = snapshot.summed_entry_hours() + hours;
        // The streak must count the entry being added, dated the same day
        // the store will stamp it.
        let mut streak_entries = snapshot.entries.clone();
        streak_entries.push(DiaryEntry::new(text, today, hours));
        let new_streak = skill_streak(&streak_entries, &snapshot.progress_updates, today);

        let entry = self
            .remote(
                "create_entry",
                self.store.create_entry(&NewEntry {
                    skill_id,
                    content: text.to_string(),
                    hours,
                }),
            )
            .await?;

        let patch = SkillPatch {
            total_hours: Some(new_total_hours),
            streak: Some(new_streak),
            last_updated: Some(Utc::now()),
            ..SkillPatch::default()
        };
        if let Err(err) = self
            .remote("update_skill", self.store.update_skill(skill_id, &patch))
            .await
        {
            // The entry write already landed; surface the failure but point
            // the next read at server truth instead of the stale snapshot.
            self.invalidate_user_listings();
            return Err(err);
        }

        let mut refreshed = snapshot;
        refreshed.entries.push(entry);
        patch.apply_to(&mut refreshed);
        self.replace_local(refreshed.clone());
        self.invalidate_user_listings();
        info!(
            "event=entry_added module=tracker status=ok skill_id={skill_id} total_hours={new_total_hours} streak={new_streak}"
        );
        Ok(Some(refreshed))
    }

    /// Records a progress value, advancing the mastery tier at 100%.
    ///
    /// Builds the update notes (embedding any completion message), persists
    /// the update record, then the skill's progress/level/streak/completed
    /// set in a second write. The two writes follow the same
    /// non-transactional policy as [`Self::add_entry`].
    ///
    /// # Contract
    /// - Returns `Ok(None)` without remote calls for unknown skill ids.
    /// - On a tier transition the completed tier joins `completed_levels`
    ///   idempotently and progress restarts at 0.
    /// - At the terminal tier 100% persists as-is with no transition.
    ///
    /// # Errors
    /// - `Validation` when `value` exceeds 100.
    /// - `Store`/`Timeout` from the persistence collaborator.
    pub async fn add_progress_update(
        &self,
        skill_id: SkillId,
        value: u8,
    ) -> TrackerResult<Option<Skill>> {
        if value > PROGRESS_MAX {
            return Err(TrackerError::Validation(format!(
                "progress must be within 0..={PROGRESS_MAX}, got {value}"
            )));
        }

        let serialized = self.mutation_locks.handle(&skill_id.to_string());
        let _guard = serialized.lock().await;

        let Some(snapshot) = self.snapshot_skill(skill_id) else {
            info!(
                "event=progress_skipped module=tracker status=ok reason=unknown_skill skill_id={skill_id}"
            );
            return Ok(None);
        };

        let transition = engine::evaluate(snapshot.current_level, value);
        let notes = match &transition {
            Some(transition) => format!("Progress updated to {value}%. {}", transition.message),
            None => format!("Progress updated to {value}%."),
        };

        let update = self
            .remote(
                "create_progress_update",
                self.store.create_progress_update(&NewProgressUpdate {
                    skill_id,
                    progress: value,
                    notes,
                }),
            )
            .await?;

        let today = Utc::now().date_naive();
        let mut with_update = snapshot.progress_updates.clone();
        with_update.push(update);
        let new_streak = skill_streak(&snapshot.entries, &with_update, today);

        let (new_progress, new_level, completed) = match &transition {
            Some(transition) => {
                let mut completed = snapshot.completed_levels.clone();
                completed.insert(snapshot.current_level);
                (0, transition.new_level, completed)
            }
            None => (
                value,
                snapshot.current_level,
                snapshot.completed_levels.clone(),
            ),
        };

        let patch = SkillPatch {
            progress: Some(new_progress),
            current_level: Some(new_level),
            completed_levels: Some(completed),
            streak: Some(new_streak),
            last_updated: Some(Utc::now()),
            ..SkillPatch::default()
        };
        if let Err(err) = self
            .remote("update_skill", self.store.update_skill(skill_id, &patch))
            .await
        {
            self.invalidate_user_listings();
            return Err(err);
        }

        let mut refreshed = snapshot;
        refreshed.progress_updates = with_update;
        patch.apply_to(&mut refreshed);
        self.replace_local(refreshed.clone());
        self.invalidate_user_listings();
        if let Some(transition) = &transition {
            info!(
                "event=level_advanced module=tracker status=ok skill_id={skill_id} new_level={}",
                transition.new_level
            );
        }
        info!(
            "event=progress_recorded module=tracker status=ok skill_id={skill_id} progress={new_progress} streak={new_streak}"
        );
        Ok(Some(refreshed))
    }

    /// Applies caller-chosen field changes and merges the result locally.
    ///
    /// Pass-through mutation: no aggregate recomputation happens here.
    ///
    /// # Errors
    /// - `Validation` for a blank name or an out-of-range progress value.
    /// - `Store`/`Timeout` from the persistence collaborator.
    pub async fn update_skill(&self, skill_id: SkillId, patch: SkillPatch) -> TrackerResult<Skill> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(TrackerError::Validation(
                    "skill name must not be empty".to_string(),
                ));
            }
        }
        if let Some(progress) = patch.progress {
            if progress > PROGRESS_MAX {
                return Err(TrackerError::Validation(format!(
                    "progress must be within 0..={PROGRESS_MAX}, got {progress}"
                )));
            }
        }

        let serialized = self.mutation_locks.handle(&skill_id.to_string());
        let _guard = serialized.lock().await;

        let updated = self
            .remote("update_skill", self.store.update_skill(skill_id, &patch))
            .await?;

        let merged = match self.snapshot_skill(skill_id) {
            Some(mut local) => {
                patch.apply_to(&mut local);
                local
            }
            None => updated,
        };
        self.replace_local(merged.clone());
        self.invalidate_user_listings();
        info!("event=skill_updated module=tracker status=ok skill_id={skill_id}");
        Ok(merged)
    }

    /// Deletes a skill remotely, then locally.
    ///
    /// # Contract
    /// - An id absent from local state is a no-op returning `Ok(false)`
    ///   with no remote call, tolerating races between UI and remote state.
    pub async fn delete_skill(&self, skill_id: SkillId) -> TrackerResult<bool> {
        let serialized = self.mutation_locks.handle(&skill_id.to_string());
        let _guard = serialized.lock().await;

        if self.snapshot_skill(skill_id).is_none() {
            info!(
                "event=skill_delete_skipped module=tracker status=ok reason=unknown_skill skill_id={skill_id}"
            );
            return Ok(false);
        }

        self.remote("delete_skill", self.store.delete_skill(skill_id))
            .await?;
        {
            let mut skills = self.write_skills();
            skills.retain(|skill| skill.id != skill_id);
        }
        self.invalidate_user_listings();
        info!("event=skill_deleted module=tracker status=ok skill_id={skill_id}");
        Ok(true)
    }

    // ----- reads -----------------------------------------------------------

    /// Replaces local state with the full remote listing, bypassing the
    /// cache entirely.
    pub async fn refresh_skills(&self) -> TrackerResult<Vec<Skill>> {
        self.invalidate_user_listings();
        let skills = self
            .remote(
                "list_skills",
                self.store.list_skills(&self.user_id, None, None),
            )
            .await?;
        {
            let mut local = self.write_skills();
            *local = skills.clone();
        }
        info!(
            "event=skills_refreshed module=tracker status=ok count={}",
            skills.len()
        );
        Ok(skills)
    }

    /// Returns one page of skills, served from cache when fresh.
    ///
    /// Concurrent misses for the same key coalesce: callers serialize on a
    /// per-key fetch lock, and late arrivals observe the first caller's
    /// cached result instead of issuing their own fetch.
    pub async fn get_skills_paginated(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> TrackerResult<Vec<Skill>> {
        let page = page.unwrap_or(0);
        let limit = normalize_page_limit(limit);
        let key = format!("skills_{}_{page}_{limit}", self.user_id);

        if let Some(CachedQuery::Page(skills)) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            return Ok(skills);
        }
        self.metrics.record_cache_miss();

        let inflight = self.fetch_locks.handle(&key);
        let _fetching = inflight.lock().await;

        // Re-check under the fetch lock: another caller may have populated
        // the key while this one waited.
        if let Some(CachedQuery::Page(skills)) = self.cache.get(&key) {
            self.metrics.record_coalesced_read();
            return Ok(skills);
        }

        let skills = self
            .remote(
                "list_skills",
                self.store
                    .list_skills(&self.user_id, Some(page), Some(limit)),
            )
            .await?;
        self.cache.set_with_ttl(
            key,
            CachedQuery::Page(skills.clone()),
            chrono::Duration::seconds(SKILLS_PAGE_TTL_SECONDS),
        );
        Ok(skills)
    }

    /// Returns the minimal projection used by list chips and pickers.
    ///
    /// Cached under its own key with a longer TTL than paginated pages;
    /// misses follow the same coalescing discipline.
    pub async fn get_skills_minimal(&self) -> TrackerResult<Vec<SkillSummary>> {
        let key = format!("skills_{}_minimal", self.user_id);

        if let Some(CachedQuery::Minimal(summaries)) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            return Ok(summaries);
        }
        self.metrics.record_cache_miss();

        let inflight = self.fetch_locks.handle(&key);
        let _fetching = inflight.lock().await;

        if let Some(CachedQuery::Minimal(summaries)) = self.cache.get(&key) {
            self.metrics.record_coalesced_read();
            return Ok(summaries);
        }

        let skills = self
            .remote(
                "list_skills",
                self.store.list_skills(&self.user_id, None, None),
            )
            .await?;
        let summaries: Vec<SkillSummary> = skills.iter().map(Skill::summary).collect();
        self.cache.set_with_ttl(
            key,
            CachedQuery::Minimal(summaries.clone()),
            chrono::Duration::seconds(SKILLS_MINIMAL_TTL_SECONDS),
        );
        Ok(summaries)
    }

    /// Local snapshot lookup; never touches the store.
    pub fn get_skill(&self, skill_id: SkillId) -> Option<Skill> {
        self.snapshot_skill(skill_id)
    }

    /// Skills currently held in the optimistic local view.
    pub fn local_skills(&self) -> Vec<Skill> {
        self.read_skills().clone()
    }

    /// Aggregate streak across the local snapshot, evaluated for today.
    pub fn user_streak_today(&self) -> u32 {
        let skills = self.read_skills();
        user_streak(skills.iter(), Utc::now().date_naive())
    }

    /// Cache stats plus counters for diagnostics screens.
    pub fn get_performance_metrics(&self) -> PerformanceReport {
        PerformanceReport {
            cache: self.cache.stats(),
            counters: self.metrics.snapshot(),
        }
    }

    /// Drops every cached query result.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("event=cache_cleared module=tracker status=ok");
    }

    // ----- internals -------------------------------------------------------

    /// Runs one remote call under the per-call budget.
    ///
    /// # Errors
    /// - `TrackerError::Timeout` when the budget elapses.
    /// - `TrackerError::Store` when the collaborator fails.
    async fn remote<T, F>(&self, op: &'static str, call: F) -> TrackerResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.metrics.record_store_call();
        let started = Instant::now();
        match timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => {
                debug!(
                    "event=store_call module=tracker status=ok op={op} duration_ms={}",
                    started.elapsed().as_millis()
                );
                Ok(value)
            }
            Ok(Err(err)) => {
                self.metrics.record_store_failure();
                warn!("event=store_call module=tracker status=error op={op} error={err}");
                Err(TrackerError::Store(err))
            }
            Err(_) => {
                self.metrics.record_store_failure();
                warn!(
                    "event=store_call module=tracker status=error op={op} error=timeout budget_ms={}",
                    self.call_timeout.as_millis()
                );
                Err(TrackerError::Timeout { op })
            }
        }
    }

    /// Sweeps every cached listing variant for this user.
    fn invalidate_user_listings(&self) {
        let pattern = format!("skills_{}", self.user_id);
        let evicted = self.cache.invalidate(&pattern);
        if evicted > 0 {
            debug!(
                "event=cache_invalidate module=tracker status=ok pattern={pattern} evicted={evicted}"
            );
        }
    }

    fn snapshot_skill(&self, skill_id: SkillId) -> Option<Skill> {
        self.read_skills()
            .iter()
            .find(|skill| skill.id == skill_id)
            .cloned()
    }

    fn replace_local(&self, skill: Skill) {
        let mut skills = self.write_skills();
        if let Some(slot) = skills.iter_mut().find(|existing| existing.id == skill.id) {
            *slot = skill;
        } else {
            skills.push(skill);
        }
    }

    // Why: local snapshot writes are plain field stores; a poisoned lock
    // still holds consistent data, so recover it instead of failing every
    // later operation.
    fn read_skills(&self) -> RwLockReadGuard<'_, Vec<Skill>> {
        match self.skills.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_skills(&self) -> RwLockWriteGuard<'_, Vec<Skill>> {
        match self.skills.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Normalizes caller-provided page sizes to a sane window.
pub fn normalize_page_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => DEFAULT_PAGE_LIMIT,
        Some(value) if value > MAX_PAGE_LIMIT => MAX_PAGE_LIMIT,
        Some(value) => value,
    }
}
