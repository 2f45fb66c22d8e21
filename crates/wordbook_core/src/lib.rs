//! Core domain logic for the wordbook vocabulary tool.
//! This crate is the single source of truth for scheduling and merge rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_dir, default_log_level, init_logging, logging_status};
pub use model::word::{Example, WordEntry, WordId, WordRecord, WordValidationError};
pub use repo::word_repo::{
    BulkUpdateReport, RepoError, RepoResult, ReviewCountUpdate, SqliteWordRepository,
    WordRepository,
};
pub use schedule::interval::{compute_due_dates, day_bounds, REVIEW_INTERVAL_DAYS};
pub use service::review_service::{
    PromptError, ReviewError, ReviewPrompt, ReviewService, ReviewStats, ReviewSummary,
};
pub use service::word_service::{MergeError, MergeOutcome, WordService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
