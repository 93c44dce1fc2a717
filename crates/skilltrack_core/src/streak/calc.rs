//! Consecutive-day streak calculation.
//!
//! # Responsibility
//! - Compute the current streak from unique activity days.
//! - Offer per-skill and whole-user (union) granularity.
//!
//! # Invariants
//! - Pure functions: no clock reads, no side effects, no failure modes.
//! - A streak exists only when its most recent day is the evaluation day or
//!   the day before.
//!
//! # See also
//! - docs/architecture/streaks.md

use crate::activity::reader::activity_days;
use crate::model::skill::{DiaryEntry, ProgressUpdate, Skill};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Counts consecutive activity days anchored at `today` or the day before.
///
/// Walks the day set descending from its most recent day, counting while
/// each day is exactly one calendar day before the previously counted one.
/// The first larger gap stops the count; it never errors.
pub fn streak_from_days(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut descending = days.iter().rev().copied();
    let Some(anchor) = descending.next() else {
        return 0;
    };

    // Why: a streak that ended before yesterday is broken, and future-dated
    // records cannot anchor one either.
    let anchored = anchor == today || today.pred_opt() == Some(anchor);
    if !anchored {
        return 0;
    }

    let mut streak = 1;
    let mut previous = anchor;
    for day in descending {
        if day.succ_opt() != Some(previous) {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}

/// Current streak over one skill's own history.
pub fn skill_streak(entries: &[DiaryEntry], updates: &[ProgressUpdate], today: NaiveDate) -> u32 {
    streak_from_days(&activity_days(entries, updates), today)
}

/// Current streak across every skill's combined activity.
///
/// Same algorithm as [`skill_streak`], run over the union of all skills'
/// activity days, so practicing different skills on consecutive days still
/// sustains the user-level streak.
pub fn user_streak<'a, I>(skills: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = &'a Skill>,
{
    let mut days = BTreeSet::new();
    for skill in skills {
        days.extend(activity_days(&skill.entries, &skill.progress_updates));
    }
    streak_from_days(&days, today)
}

#[cfg(test)]
mod tests {
    use super::streak_from_days;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar day")
    }

    #[test]
    fn yesterday_anchor_counts_backward() {
        let today = day(2026, 4, 20);
        let days: BTreeSet<_> = [day(2026, 4, 19), day(2026, 4, 18)].into_iter().collect();
        assert_eq!(streak_from_days(&days, today), 2);
    }

    #[test]
    fn future_dated_day_cannot_anchor() {
        let today = day(2026, 4, 20);
        let days: BTreeSet<_> = [day(2026, 4, 21)].into_iter().collect();
        assert_eq!(streak_from_days(&days, today), 0);
    }

    #[test]
    fn gap_behind_anchor_stops_count_without_error() {
        let today = day(2026, 4, 20);
        let days: BTreeSet<_> = [day(2026, 4, 20), day(2026, 4, 19), day(2026, 4, 16)]
            .into_iter()
            .collect();
        assert_eq!(streak_from_days(&days, today), 2);
    }
}
