//! Word record domain model.
//!
//! # Responsibility
//! - Define the aggregate stored for one vocabulary entry.
//! - Normalize raw user input before it reaches the merge engine.
//! - Validate record shape before persistence and after reads.
//!
//! # Invariants
//! - `word` is trimmed and non-empty.
//! - `examples` is non-empty and holds no two equal sentences.
//! - `due_dates` has exactly one entry per review interval and is never
//!   recomputed after creation.
//! - `review_count` never decreases.

use crate::schedule::interval::{compute_due_dates, REVIEW_INTERVAL_DAYS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a word record.
pub type WordId = Uuid;

/// One example sentence with an optional remark.
///
/// Identity inside a record is the exact (case-sensitive) `sentence` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub sentence: String,
    /// Empty string when the user gave no remark. Older stored documents
    /// without this field read back as empty.
    #[serde(default)]
    pub remark: String,
}

impl Example {
    pub fn new(sentence: impl Into<String>, remark: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            remark: remark.into(),
        }
    }
}

/// Validation failures for word input and record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordValidationError {
    EmptyWord,
    EmptySentence,
    NoExamples,
    DuplicateSentence(String),
    DueDateCount { expected: usize, actual: usize },
}

impl Display for WordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyWord => write!(f, "word must not be empty"),
            Self::EmptySentence => write!(f, "sentence must not be empty"),
            Self::NoExamples => write!(f, "word record must hold at least one example"),
            Self::DuplicateSentence(sentence) => {
                write!(f, "example sentence appears more than once: `{sentence}`")
            }
            Self::DueDateCount { expected, actual } => {
                write!(f, "expected {expected} due dates, found {actual}")
            }
        }
    }
}

impl Error for WordValidationError {}

/// Trimmed `(word, sentence, remark)` triple accepted by the merge engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub example: Example,
}

impl WordEntry {
    /// Trims all three inputs and rejects an empty word or sentence.
    pub fn parse(word: &str, sentence: &str, remark: &str) -> Result<Self, WordValidationError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(WordValidationError::EmptyWord);
        }
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(WordValidationError::EmptySentence);
        }

        Ok(Self {
            word: word.to_string(),
            example: Example::new(sentence, remark.trim()),
        })
    }
}

/// Aggregate root for a vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub id: WordId,
    pub word: String,
    /// Insertion-ordered examples.
    pub examples: Vec<Example>,
    pub review_count: i64,
    /// UTC midnights, ascending.
    pub due_dates: Vec<DateTime<Utc>>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Written as-is by `WordRepository::update`.
    pub updated_at: i64,
}

impl WordRecord {
    /// Builds a fresh record anchored at `now` with one example.
    ///
    /// # Invariants
    /// - `review_count` starts at 0.
    /// - `due_dates` are computed here once and never again.
    pub fn new(entry: WordEntry, now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            word: entry.word,
            examples: vec![entry.example],
            review_count: 0,
            due_dates: compute_due_dates(now),
            created_at: millis,
            updated_at: millis,
        }
    }

    /// Returns the stored example with exactly this sentence, if any.
    pub fn find_example(&self, sentence: &str) -> Option<&Example> {
        self.examples
            .iter()
            .find(|example| example.sentence == sentence)
    }

    /// Appends an example unless its sentence is already present.
    ///
    /// Returns `false` and leaves the record untouched on a duplicate.
    pub fn push_example(&mut self, example: Example) -> bool {
        if self.find_example(&example.sentence).is_some() {
            return false;
        }
        self.examples.push(example);
        true
    }

    /// Checks record shape invariants.
    pub fn validate(&self) -> Result<(), WordValidationError> {
        if self.word.trim().is_empty() {
            return Err(WordValidationError::EmptyWord);
        }
        if self.examples.is_empty() {
            return Err(WordValidationError::NoExamples);
        }
        for (index, example) in self.examples.iter().enumerate() {
            if example.sentence.trim().is_empty() {
                return Err(WordValidationError::EmptySentence);
            }
            if self.examples[..index]
                .iter()
                .any(|earlier| earlier.sentence == example.sentence)
            {
                return Err(WordValidationError::DuplicateSentence(
                    example.sentence.clone(),
                ));
            }
        }
        if self.due_dates.len() != REVIEW_INTERVAL_DAYS.len() {
            return Err(WordValidationError::DueDateCount {
                expected: REVIEW_INTERVAL_DAYS.len(),
                actual: self.due_dates.len(),
            });
        }
        Ok(())
    }
}
