//! Domain model for vocabulary entries.
//!
//! # Responsibility
//! - Define canonical data structures used by the merge engine and the
//!   review scheduler.
//!
//! # Invariants
//! - Every record is identified by a stable `WordId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod word;
