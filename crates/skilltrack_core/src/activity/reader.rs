//! Activity log normalization.
//!
//! # Responsibility
//! - Flatten heterogeneous skill history (diary entries, progress updates)
//!   into dated activity events.
//! - Collapse same-day records into unique activity days for streak math.
//!
//! # Invariants
//! - Events are derived on demand and never persisted.
//! - All day bucketing uses the UTC calendar.
//!
//! # See also
//! - docs/architecture/streaks.md

use crate::model::skill::{DiaryEntry, ProgressUpdate};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Record kind a derived activity event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    /// A diary entry recorded for a calendar day.
    Entry,
    /// A progress update stamped at creation time.
    ProgressUpdate,
}

/// One dated activity occurrence derived from skill history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityEvent {
    /// UTC calendar day the activity counts toward.
    pub date: NaiveDate,
    /// Record kind the event was derived from.
    pub source: ActivitySource,
}

/// Flattens entries and updates into one event per source record.
///
/// Order follows the input sequences: entries first, then updates. Callers
/// needing day-level uniqueness use [`activity_days`] instead.
pub fn activity_events(entries: &[DiaryEntry], updates: &[ProgressUpdate]) -> Vec<ActivityEvent> {
    let mut events = Vec::with_capacity(entries.len() + updates.len());
    for entry in entries {
        events.push(ActivityEvent {
            date: entry.date,
            source: ActivitySource::Entry,
        });
    }
    for update in updates {
        events.push(ActivityEvent {
            date: update.activity_day(),
            source: ActivitySource::ProgressUpdate,
        });
    }
    events
}

/// Collects the unique activity days across entries and updates.
///
/// Same-day records collapse to one day; the returned set iterates in
/// ascending calendar order.
pub fn activity_days(entries: &[DiaryEntry], updates: &[ProgressUpdate]) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    for entry in entries {
        days.insert(entry.date);
    }
    for update in updates {
        days.insert(update.activity_day());
    }
    days
}
