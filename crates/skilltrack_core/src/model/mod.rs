//! Learning-domain data model.
//!
//! # Responsibility
//! - Define canonical skill records shared by streak, progression and
//!   orchestration logic.
//! - Keep one aggregate-root shape for UI projections and remote payloads.
//!
//! # Invariants
//! - Every domain object is identified by a stable `SkillId`.
//! - Derived aggregates (`streak`, `total_hours`) are recomputed, never
//!   hand-edited.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod skill;
