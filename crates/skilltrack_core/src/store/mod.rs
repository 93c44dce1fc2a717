//! Remote persistence contracts and the in-memory implementation.
//!
//! # Responsibility
//! - Define the async collaborator seam the tracker writes and reads
//!   through.
//! - Keep request/patch shapes and store errors out of service logic.
//!
//! # Invariants
//! - Store implementations return semantic errors (`NotFound`) in addition
//!   to transport failures; they never panic.
//!
//! # See also
//! - docs/architecture/persistence.md

pub mod memory;
pub mod skill_store;
