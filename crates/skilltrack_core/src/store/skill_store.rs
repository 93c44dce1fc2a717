//! Persistence collaborator contract.
//!
//! # Responsibility
//! - Define the async remote-store seam every mutation and list read goes
//!   through.
//! - Keep request and partial-update record shapes next to the contract.
//!
//! # Invariants
//! - The remote store is the ultimate source of truth; this core owns no
//!   durable state of its own.
//! - Every operation is fallible and may suspend; none of them panics.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::model::skill::{DiaryEntry, ProgressUpdate, Skill, SkillId, SkillLevel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure surfaced by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network, auth or server failure while reaching the remote store.
    Transport(String),
    /// The remote store rejected the payload.
    Validation(String),
    /// The target record does not exist remotely.
    NotFound(SkillId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "store transport failure: {message}"),
            Self::Validation(message) => write!(f, "store rejected payload: {message}"),
            Self::NotFound(id) => write!(f, "skill not found: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Fields for creating one skill remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    /// Owning user in the remote schema.
    pub user_id: String,
    pub name: String,
    pub description: String,
}

/// Fields for persisting one diary entry.
///
/// The store stamps the entry's calendar day at creation time; callers do
/// not pick it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub skill_id: SkillId,
    pub content: String,
    pub hours: f64,
}

/// Fields for appending one progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgressUpdate {
    pub skill_id: SkillId,
    pub progress: u8,
    pub notes: String,
}

/// Partial update for skill fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub progress: Option<u8>,
    pub current_level: Option<SkillLevel>,
    pub completed_levels: Option<BTreeSet<SkillLevel>>,
    pub streak: Option<u32>,
    pub total_hours: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SkillPatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merges this patch into a skill record, leaving `None` fields alone.
    pub fn apply_to(&self, skill: &mut Skill) {
        if let Some(name) = &self.name {
            skill.name = name.clone();
        }
        if let Some(description) = &self.description {
            skill.description = description.clone();
        }
        if let Some(progress) = self.progress {
            skill.progress = progress;
        }
        if let Some(level) = self.current_level {
            skill.current_level = level;
        }
        if let Some(completed) = &self.completed_levels {
            skill.completed_levels = completed.clone();
        }
        if let Some(streak) = self.streak {
            skill.streak = streak;
        }
        if let Some(total_hours) = self.total_hours {
            skill.total_hours = total_hours;
        }
        if let Some(last_updated) = self.last_updated {
            skill.last_updated = last_updated;
        }
    }
}

/// Remote persistence interface consumed by the tracker.
///
/// Implementations wrap whatever transport the host app uses; the in-memory
/// implementation backs tests and the CLI probe.
#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Creates a skill and returns the stored record.
    async fn create_skill(&self, new: &NewSkill) -> StoreResult<Skill>;

    /// Applies a partial update and returns the updated record.
    async fn update_skill(&self, id: SkillId, patch: &SkillPatch) -> StoreResult<Skill>;

    /// Deletes a skill; the remote store cascades to its entries and
    /// progress updates.
    async fn delete_skill(&self, id: SkillId) -> StoreResult<()>;

    /// Appends one diary entry to a skill.
    async fn create_entry(&self, new: &NewEntry) -> StoreResult<DiaryEntry>;

    /// Appends one progress update to a skill.
    async fn create_progress_update(
        &self,
        new: &NewProgressUpdate,
    ) -> StoreResult<ProgressUpdate>;

    /// Lists a user's skills, optionally paginated.
    async fn list_skills(
        &self,
        user_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Skill>>;

    /// Lists one skill's progress history, oldest first.
    async fn list_progress_updates(&self, skill_id: SkillId) -> StoreResult<Vec<ProgressUpdate>>;
}
