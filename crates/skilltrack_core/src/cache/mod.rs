//! Read-path caching and performance introspection.
//!
//! # Responsibility
//! - Provide the TTL query cache probed before every list/minimal read.
//! - Provide injectable counters backing performance metrics reads.
//!
//! # Invariants
//! - Nothing in this module suspends or touches the network.
//! - Cache faults are invisible to callers; reads degrade to misses.
//!
//! # See also
//! - docs/architecture/caching.md

pub mod metrics;
pub mod query_cache;
