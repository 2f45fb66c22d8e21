//! Review pass scheduler.
//!
//! # Responsibility
//! - Select records due on a given UTC day and present them in random order.
//! - Gate every example behind an explicit user acknowledgment.
//! - Commit all review-count increments with one batched store write.
//!
//! # Invariants
//! - Nothing is written while examples are being presented; a prompt
//!   failure or interrupt drops the staged increments.
//! - Every presented record is incremented by exactly one, whatever the
//!   individual answers were.
//! - An empty due set performs no store writes.

use crate::model::word::Example;
use crate::repo::word_repo::{RepoError, ReviewCountUpdate, WordRepository};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by an interactive prompt surface.
#[derive(Debug)]
pub enum PromptError {
    /// Terminal read/write failure.
    Io(std::io::Error),
    /// Input closed or not interactive; the pass must stop.
    Aborted,
}

impl Display for PromptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "prompt failed: {err}"),
            Self::Aborted => write!(f, "prompt aborted: input is closed or not interactive"),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Aborted => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Yes/no confirmation surface used for each presented example.
pub trait ReviewPrompt {
    /// Shows `(word, example.sentence)` and returns the user's answer.
    ///
    /// The answer is collected but does not change scheduling.
    fn confirm(&mut self, word: &str, example: &Example) -> Result<bool, PromptError>;
}

/// Service error for review passes.
#[derive(Debug)]
pub enum ReviewError {
    Repo(RepoError),
    Prompt(PromptError),
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Prompt(err) => write!(f, "review aborted before commit: {err}"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Prompt(err) => Some(err),
        }
    }
}

impl From<RepoError> for ReviewError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PromptError> for ReviewError {
    fn from(value: PromptError) -> Self {
        Self::Prompt(value)
    }
}

/// Counters for one completed review pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewStats {
    /// Due records presented.
    pub records: usize,
    pub examples_presented: usize,
    /// Examples answered with "yes".
    pub examples_confirmed: usize,
    /// Rows written by the batch commit.
    pub updated: usize,
    /// Words deleted by someone else between query and commit.
    pub missing: Vec<String>,
}

/// Terminal state of a review pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewSummary {
    NothingDue,
    Completed(ReviewStats),
}

/// Drives review passes over a record store.
///
/// The random source is injected so tests can pin the presentation order.
pub struct ReviewService<R: WordRepository, G: Rng> {
    repo: R,
    rng: G,
}

impl<R: WordRepository, G: Rng> ReviewService<R, G> {
    pub fn new(repo: R, rng: G) -> Self {
        Self { repo, rng }
    }

    /// Runs one review pass for records due on `today` (UTC).
    ///
    /// # Errors
    /// - `ReviewError::Repo` when the due query or the batch commit fails.
    /// - `ReviewError::Prompt` when the user cannot be asked; nothing is
    ///   written in that case.
    pub fn run_review_pass<P: ReviewPrompt>(
        &mut self,
        today: NaiveDate,
        prompt: &mut P,
    ) -> Result<ReviewSummary, ReviewError> {
        let mut due = self.repo.find_due_on(today)?;
        if due.is_empty() {
            info!("event=review_pass module=review status=nothing_due");
            return Ok(ReviewSummary::NothingDue);
        }

        due.shuffle(&mut self.rng);
        debug!(
            "event=review_pass module=review status=presenting records={}",
            due.len()
        );

        let mut stats = ReviewStats {
            records: due.len(),
            ..ReviewStats::default()
        };
        let mut staged = Vec::with_capacity(due.len());
        for record in &due {
            for example in &record.examples {
                stats.examples_presented += 1;
                match prompt.confirm(&record.word, example) {
                    Ok(true) => stats.examples_confirmed += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(
                            "event=review_pass module=review status=aborted staged={} error={}",
                            staged.len(),
                            err
                        );
                        return Err(err.into());
                    }
                }
            }
            staged.push(ReviewCountUpdate {
                word: record.word.clone(),
                review_count: record.review_count + 1,
            });
        }

        let report = self.repo.bulk_update_review_counts(&staged)?;
        stats.updated = report.applied;
        stats.missing = report.missing;
        info!(
            "event=review_pass module=review status=committed records={} examples={} updated={}",
            stats.records, stats.examples_presented, stats.updated
        );
        Ok(ReviewSummary::Completed(stats))
    }
}
