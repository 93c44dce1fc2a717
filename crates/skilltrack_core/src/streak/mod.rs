//! Streak computation entry points.
//!
//! # Responsibility
//! - Expose pure consecutive-day streak math over activity days.
//! - Keep streak policy (anchor day, gap handling) in one place.
//!
//! # See also
//! - docs/architecture/streaks.md

pub mod calc;
