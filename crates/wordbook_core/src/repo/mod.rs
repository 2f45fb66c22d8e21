//! Record store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract consumed by the merge engine and the
//!   review scheduler.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store writes must enforce `WordRecord::validate()` before persistence.
//! - Store APIs return semantic errors (`NotFound`, `DuplicateWord`) in
//!   addition to DB transport errors.

pub mod word_repo;
