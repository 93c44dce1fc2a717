//! Skill domain model.
//!
//! # Responsibility
//! - Define the aggregate skill record and its owned entry/update history.
//! - Provide the fixed mastery-level ordering used by progression logic.
//!
//! # Invariants
//! - `id` is stable and never reused for another skill.
//! - `progress` stays within `[0, 100]`.
//! - `current_level` only moves forward through the `SkillLevel` order.
//! - `completed_levels` only grows; a completed level is never removed.
//! - `total_hours` equals the sum of `hours` across `entries`.
//!
//! # See also
//! - docs/architecture/data-model.md

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every skill record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type SkillId = Uuid;

/// Upper bound for reported progress at any level.
pub const PROGRESS_MAX: u8 = 100;

/// Fixed mastery tiers a skill advances through.
///
/// Declaration order is progression order; the derived `Ord` follows it,
/// which is what "levels never regress" checks rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    /// Starting tier for a freshly created skill.
    Beginner,
    Novice,
    Intermediate,
    Advanced,
    /// Terminal tier; no further advancement exists.
    Expert,
}

impl SkillLevel {
    /// All tiers in progression order.
    pub const ALL: [SkillLevel; 5] = [
        SkillLevel::Beginner,
        SkillLevel::Novice,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ];

    /// Returns the next tier, or `None` at the terminal tier.
    pub fn next(self) -> Option<SkillLevel> {
        match self {
            SkillLevel::Beginner => Some(SkillLevel::Novice),
            SkillLevel::Novice => Some(SkillLevel::Intermediate),
            SkillLevel::Intermediate => Some(SkillLevel::Advanced),
            SkillLevel::Advanced => Some(SkillLevel::Expert),
            SkillLevel::Expert => None,
        }
    }

    /// Returns whether this tier has no successor.
    pub fn is_terminal(self) -> bool {
        matches!(self, SkillLevel::Expert)
    }

    /// Stable lowercase label used in logs and remote payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Novice => "novice",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }

    /// Parses the stable label back into a tier.
    pub fn parse(value: &str) -> Option<SkillLevel> {
        match value {
            "beginner" => Some(SkillLevel::Beginner),
            "novice" => Some(SkillLevel::Novice),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }
}

impl Display for SkillLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root for one tracked skill.
///
/// Entries and progress updates are owned exclusively by their skill;
/// deleting the skill cascades to them in the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Stable global ID used for linking, cache keys and remote writes.
    pub id: SkillId,
    /// Display name; never empty once past mutation validation.
    pub name: String,
    /// Free-form description; may be empty.
    pub description: String,
    /// Numeric progress at `current_level`, always within `[0, 100]`.
    pub progress: u8,
    /// Current mastery tier; only ever advances.
    pub current_level: SkillLevel,
    /// Tiers completed so far; grows monotonically, no duplicates.
    pub completed_levels: BTreeSet<SkillLevel>,
    /// Consecutive-day activity streak at last recomputation.
    pub streak: u32,
    /// Sum of `hours` over `entries`; recomputed, never edited directly.
    pub total_hours: f64,
    /// Diary entries owned by this skill, oldest first.
    pub entries: Vec<DiaryEntry>,
    /// Append-only progress history, oldest first.
    pub progress_updates: Vec<ProgressUpdate>,
    /// Timestamp of the last server-visible mutation.
    pub last_updated: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Skill {
    /// Creates a skill with zeroed aggregates at the starting tier.
    ///
    /// # Invariants
    /// - Aggregates start at zero; entry/update history starts empty.
    /// - `current_level` starts at `SkillLevel::Beginner`.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, description)
    }

    /// Creates a skill with a caller-provided stable ID.
    ///
    /// Used where identity already exists externally (store fakes, tests).
    ///
    /// # Invariants
    /// - The provided `id` must remain stable for this skill's lifetime.
    pub fn with_id(
        id: SkillId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            progress: 0,
            current_level: SkillLevel::Beginner,
            completed_levels: BTreeSet::new(),
            streak: 0,
            total_hours: 0.0,
            entries: Vec::new(),
            progress_updates: Vec::new(),
            last_updated: now,
            created_at: now,
        }
    }

    /// Recomputes total hours from the owned entries.
    pub fn summed_entry_hours(&self) -> f64 {
        self.entries.iter().map(|entry| entry.hours).sum()
    }

    /// Projects the minimal shape used by lightweight list reads.
    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            id: self.id,
            name: self.name.clone(),
            progress: self.progress,
            current_level: self.current_level,
            streak: self.streak,
        }
    }
}

/// Dated diary entry owned by exactly one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Stable entry ID.
    pub id: Uuid,
    /// Free-form body text.
    pub text: String,
    /// Calendar day the practice happened on.
    pub date: NaiveDate,
    /// Practice duration in hours; never negative.
    pub hours: f64,
}

impl DiaryEntry {
    /// Creates an entry with a generated stable ID.
    pub fn new(text: impl Into<String>, date: NaiveDate, hours: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            date,
            hours,
        }
    }
}

/// Point-in-time progress snapshot owned by exactly one skill.
///
/// Append-only: never edited or deleted in normal flow. Supplies both an
/// activity day for streaks and the notes shown in history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Stable update ID.
    pub id: Uuid,
    /// Reported progress within `[0, 100]`.
    pub progress: u8,
    /// Creation timestamp; its UTC calendar day is the activity day.
    pub created_at: DateTime<Utc>,
    /// Descriptive notes, including any level-completion message.
    pub notes: String,
}

impl ProgressUpdate {
    /// Creates an update stamped with the current time.
    pub fn new(progress: u8, notes: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            progress,
            created_at: Utc::now(),
            notes: notes.into(),
        }
    }

    /// UTC calendar day this update counts toward for streak purposes.
    pub fn activity_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Minimal skill projection for lightweight list reads.
///
/// Derived client-side from `Skill`; the persistence collaborator has no
/// dedicated minimal endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSummary {
    pub id: SkillId,
    pub name: String,
    pub progress: u8,
    pub current_level: SkillLevel,
    pub streak: u32,
}
