//! Word use-case service and merge engine.
//!
//! # Responsibility
//! - Decide whether an incoming entry creates a record, merges into an
//!   existing one or is rejected as a duplicate sentence.
//! - Provide lookup/delete/truncate entry points for the command layer.
//!
//! # Invariants
//! - At most one store write per `add_entry` call, none on duplicates.
//! - Due dates are anchored to the first time a word is seen; merges never
//!   touch them.
//! - A lost insert race (`RepoError::DuplicateWord`) is retried once as a
//!   merge against the winning record.

use crate::model::word::{WordEntry, WordRecord, WordValidationError};
use crate::repo::word_repo::{RepoError, RepoResult, WordRepository};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of one merge-engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No record existed; a new one was inserted.
    Created(WordRecord),
    /// The sentence was appended to the existing record.
    Merged(WordRecord),
    /// The sentence already exists; carries the unchanged record.
    DuplicateRejected(WordRecord),
}

impl MergeOutcome {
    /// Returns the record carried by any outcome.
    pub fn record(&self) -> &WordRecord {
        match self {
            Self::Created(record) | Self::Merged(record) | Self::DuplicateRejected(record) => {
                record
            }
        }
    }
}

/// Service error for the merge engine.
#[derive(Debug)]
pub enum MergeError {
    /// Empty word or sentence after trimming. No store access happened.
    Validation(WordValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid entry: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<WordValidationError> for MergeError {
    fn from(value: WordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MergeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Word service facade over a record store.
pub struct WordService<R: WordRepository> {
    repo: R,
}

impl<R: WordRepository> WordService<R> {
    /// Creates a service using the provided store implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds `(word, sentence, remark)` using the current time as the
    /// creation instant for new records.
    pub fn add_entry(
        &self,
        word: &str,
        sentence: &str,
        remark: &str,
    ) -> Result<MergeOutcome, MergeError> {
        self.add_entry_at(word, sentence, remark, Utc::now())
    }

    /// Adds an entry with an explicit creation instant.
    ///
    /// `now` becomes `created_at` on the create path and `updated_at` on the
    /// merge path.
    pub fn add_entry_at(
        &self,
        word: &str,
        sentence: &str,
        remark: &str,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, MergeError> {
        let entry = WordEntry::parse(word, sentence, remark)?;

        if let Some(existing) = self.repo.find_by_word(&entry.word)? {
            return self.merge_into(existing, entry, now);
        }

        let record = WordRecord::new(entry.clone(), now);
        match self.repo.insert(&record) {
            Ok(id) => {
                info!(
                    "event=word_add module=merge status=created record_id={} examples=1",
                    id
                );
                Ok(MergeOutcome::Created(record))
            }
            Err(RepoError::DuplicateWord(_)) => {
                warn!("event=word_add module=merge status=insert_race action=retry_as_merge");
                let winner = self
                    .repo
                    .find_by_word(&entry.word)?
                    .ok_or_else(|| RepoError::DuplicateWord(entry.word.clone()))?;
                self.merge_into(winner, entry, now)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn merge_into(
        &self,
        mut record: WordRecord,
        entry: WordEntry,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, MergeError> {
        if !record.push_example(entry.example) {
            info!(
                "event=word_add module=merge status=duplicate record_id={} examples={}",
                record.id,
                record.examples.len()
            );
            return Ok(MergeOutcome::DuplicateRejected(record));
        }

        record.updated_at = now.timestamp_millis();
        self.repo.update(&record)?;
        info!(
            "event=word_add module=merge status=merged record_id={} examples={}",
            record.id,
            record.examples.len()
        );
        Ok(MergeOutcome::Merged(record))
    }

    /// Gets one record by exact word. `None` is the soft not-found case.
    pub fn show(&self, word: &str) -> RepoResult<Option<WordRecord>> {
        self.repo.find_by_word(word.trim())
    }

    /// Lists every stored record.
    pub fn list_all(&self) -> RepoResult<Vec<WordRecord>> {
        self.repo.find_all()
    }

    /// Deletes one record; `false` means nothing matched.
    pub fn delete(&self, word: &str) -> RepoResult<bool> {
        let removed = self.repo.delete_by_word(word.trim())?;
        info!("event=word_delete module=merge status=ok removed={removed}");
        Ok(removed)
    }

    /// Deletes all records and returns how many were removed.
    pub fn truncate(&self) -> RepoResult<usize> {
        let removed = self.repo.delete_all()?;
        info!("event=word_truncate module=merge status=ok removed={removed}");
        Ok(removed)
    }
}
