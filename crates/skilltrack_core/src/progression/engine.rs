//! Level progression state machine.
//!
//! # Responsibility
//! - Map (current level, reported progress) to an optional tier transition.
//! - Generate the level-completion message surfaced in progress notes.
//!
//! # Invariants
//! - Transitions fire only at exactly the completion threshold on a
//!   non-terminal tier.
//! - The terminal tier never transitions; reported progress persists as-is.
//! - Evaluation is pure: no clock, no I/O, no mutation.
//!
//! # See also
//! - docs/architecture/progression.md

use crate::model::skill::{SkillLevel, PROGRESS_MAX};

/// Outcome of a level evaluation that crossed the completion threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTransition {
    /// Tier the skill advances to.
    pub new_level: SkillLevel,
    /// Whether numeric progress restarts at 0 at the new tier.
    pub progress_reset: bool,
    /// Congratulatory message naming the completed tier.
    pub message: String,
}

/// Evaluates whether a reported progress value advances the skill's tier.
///
/// # Contract
/// - `None` while `progress < 100`: the skill records the new value at its
///   current tier and nothing else changes.
/// - `Some(transition)` at `progress == 100` on a non-terminal tier;
///   `progress_reset` is always `true` there.
/// - `None` at `progress == 100` on the terminal tier; the value persists at
///   100 with no further tier to reach.
pub fn evaluate(current: SkillLevel, progress: u8) -> Option<LevelTransition> {
    if progress < PROGRESS_MAX {
        return None;
    }
    let next = current.next()?;
    Some(LevelTransition {
        new_level: next,
        progress_reset: true,
        message: completion_message(current, next),
    })
}

/// Builds the human-readable completion message for one tier advance.
pub fn completion_message(completed: SkillLevel, next: SkillLevel) -> String {
    format!("Congratulations! You completed the {completed} level and advanced to {next}.")
}
