//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from persistence details.
//!
//! # See also
//! - docs/architecture/concurrency.md

pub mod locks;
pub mod tracker;
