//! Activity event derivation from skill history.
//!
//! # Responsibility
//! - Normalize diary entries and progress updates into dated events.
//! - Feed day-level activity sets to the streak calculator.
//!
//! # See also
//! - docs/architecture/streaks.md

pub mod reader;
