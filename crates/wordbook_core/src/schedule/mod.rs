//! Review scheduling policy.
//!
//! # Responsibility
//! - Map a creation instant to the fixed forgetting-curve due dates.
//! - Provide the UTC day window used by due-date queries.

pub mod interval;
