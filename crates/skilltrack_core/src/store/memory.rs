//! In-memory persistence collaborator.
//!
//! # Responsibility
//! - Provide a self-contained `SkillStore` for the CLI probe, FFI demo
//!   wiring and deterministic tests.
//! - Record per-operation call counts and support injected failures and
//!   latency so orchestration behavior stays observable.
//!
//! # Invariants
//! - Skills are owned per user; deleting a skill drops its entries and
//!   updates with it.
//! - Behaves like a plain CRUD backend: aggregate fields change only when a
//!   patch sets them, never by recomputation.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::model::skill::{DiaryEntry, ProgressUpdate, Skill, SkillId};
use crate::store::skill_store::{
    NewEntry, NewProgressUpdate, NewSkill, SkillPatch, SkillStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Stand-in remote store holding every record in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    call_counts: Mutex<HashMap<&'static str, usize>>,
    fail_ops: Mutex<HashSet<&'static str>>,
    latency: Mutex<Option<Duration>>,
}

#[derive(Default)]
struct MemoryState {
    skills: Vec<OwnedSkill>,
}

struct OwnedSkill {
    owner: String,
    skill: Skill,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named operation fail with a transport error until cleared.
    pub fn fail_operation(&self, op: &'static str) {
        if let Ok(mut ops) = self.fail_ops.lock() {
            ops.insert(op);
        }
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut ops) = self.fail_ops.lock() {
            ops.clear();
        }
    }

    /// Adds fixed latency before every operation; `None` removes it.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut slot) = self.latency.lock() {
            *slot = latency;
        }
    }

    /// Number of calls issued against the named operation.
    pub fn call_count(&self, op: &'static str) -> usize {
        self.call_counts
            .lock()
            .map(|counts| counts.get(op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.call_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Inserts a pre-built skill owned by `user_id`, bypassing validation.
    pub fn seed_skill(&self, user_id: impl Into<String>, skill: Skill) {
        if let Ok(mut state) = self.state.lock() {
            state.skills.push(OwnedSkill {
                owner: user_id.into(),
                skill,
            });
        }
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Transport("memory store state lock poisoned".to_string()))
    }

    /// Counts the call, applies injected latency, then injected failures.
    async fn begin(&self, op: &'static str) -> StoreResult<()> {
        if let Ok(mut counts) = self.call_counts.lock() {
            *counts.entry(op).or_insert(0) += 1;
        }
        let delay = self.latency.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .fail_ops
            .lock()
            .map(|ops| ops.contains(op))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Transport(format!("injected failure for {op}")));
        }
        Ok(())
    }
}

fn find_skill_mut(state: &mut MemoryState, id: SkillId) -> StoreResult<&mut Skill> {
    state
        .skills
        .iter_mut()
        .find(|owned| owned.skill.id == id)
        .map(|owned| &mut owned.skill)
        .ok_or(StoreError::NotFound(id))
}

#[async_trait]
impl SkillStore for MemoryStore {
    async fn create_skill(&self, new: &NewSkill) -> StoreResult<Skill> {
        self.begin("create_skill").await?;
        if new.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "skill name must not be empty".to_string(),
            ));
        }
        let skill = Skill::new(new.name.trim(), new.description.clone());
        let mut state = self.state()?;
        state.skills.push(OwnedSkill {
            owner: new.user_id.clone(),
            skill: skill.clone(),
        });
        Ok(skill)
    }

    async fn update_skill(&self, id: SkillId, patch: &SkillPatch) -> StoreResult<Skill> {
        self.begin("update_skill").await?;
        let mut state = self.state()?;
        let skill = find_skill_mut(&mut state, id)?;
        patch.apply_to(skill);
        Ok(skill.clone())
    }

    async fn delete_skill(&self, id: SkillId) -> StoreResult<()> {
        self.begin("delete_skill").await?;
        let mut state = self.state()?;
        let before = state.skills.len();
        state.skills.retain(|owned| owned.skill.id != id);
        if state.skills.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn create_entry(&self, new: &NewEntry) -> StoreResult<DiaryEntry> {
        self.begin("create_entry").await?;
        if new.hours < 0.0 {
            return Err(StoreError::Validation(
                "entry hours must not be negative".to_string(),
            ));
        }
        // Why: the store, not the caller, assigns the entry's calendar day.
        let entry = DiaryEntry::new(new.content.clone(), Utc::now().date_naive(), new.hours);
        let mut state = self.state()?;
        let skill = find_skill_mut(&mut state, new.skill_id)?;
        skill.entries.push(entry.clone());
        Ok(entry)
    }

    async fn create_progress_update(
        &self,
        new: &NewProgressUpdate,
    ) -> StoreResult<ProgressUpdate> {
        self.begin("create_progress_update").await?;
        let update = ProgressUpdate::new(new.progress, new.notes.clone());
        let mut state = self.state()?;
        let skill = find_skill_mut(&mut state, new.skill_id)?;
        skill.progress_updates.push(update.clone());
        Ok(update)
    }

    async fn list_skills(
        &self,
        user_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Skill>> {
        self.begin("list_skills").await?;
        let state = self.state()?;
        let owned: Vec<Skill> = state
            .skills
            .iter()
            .filter(|owned| owned.owner == user_id)
            .map(|owned| owned.skill.clone())
            .collect();
        let Some(limit) = limit else {
            return Ok(owned);
        };
        let start = page.unwrap_or(0) as usize * limit as usize;
        Ok(owned
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect())
    }

    async fn list_progress_updates(&self, skill_id: SkillId) -> StoreResult<Vec<ProgressUpdate>> {
        self.begin("list_progress_updates").await?;
        let state = self.state()?;
        let skill = state
            .skills
            .iter()
            .find(|owned| owned.skill.id == skill_id)
            .map(|owned| &owned.skill)
            .ok_or(StoreError::NotFound(skill_id))?;
        Ok(skill.progress_updates.clone())
    }
}
