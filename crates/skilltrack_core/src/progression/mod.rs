//! Mastery-tier progression rules.
//!
//! # Responsibility
//! - Decide tier transitions from reported progress values.
//! - Keep the completion threshold and messaging in one place.
//!
//! # See also
//! - docs/architecture/progression.md

pub mod engine;
