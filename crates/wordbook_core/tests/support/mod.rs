#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::Cell;
use std::collections::VecDeque;
use wordbook_core::{
    BulkUpdateReport, Example, PromptError, RepoResult, ReviewCountUpdate, ReviewPrompt, WordId,
    WordRecord, WordRepository,
};

/// Store wrapper that counts every write call passing through it.
pub struct CountingRepo<R> {
    inner: R,
    pub inserts: Cell<usize>,
    pub updates: Cell<usize>,
    pub bulk_updates: Cell<usize>,
    pub deletes: Cell<usize>,
}

impl<R: WordRepository> CountingRepo<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            inserts: Cell::new(0),
            updates: Cell::new(0),
            bulk_updates: Cell::new(0),
            deletes: Cell::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.inserts.get() + self.updates.get() + self.bulk_updates.get() + self.deletes.get()
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl<R: WordRepository> WordRepository for CountingRepo<R> {
    fn find_by_word(&self, word: &str) -> RepoResult<Option<WordRecord>> {
        self.inner.find_by_word(word)
    }

    fn insert(&self, record: &WordRecord) -> RepoResult<WordId> {
        bump(&self.inserts);
        self.inner.insert(record)
    }

    fn update(&self, record: &WordRecord) -> RepoResult<()> {
        bump(&self.updates);
        self.inner.update(record)
    }

    fn delete_by_word(&self, word: &str) -> RepoResult<bool> {
        bump(&self.deletes);
        self.inner.delete_by_word(word)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        bump(&self.deletes);
        self.inner.delete_all()
    }

    fn find_all(&self) -> RepoResult<Vec<WordRecord>> {
        self.inner.find_all()
    }

    fn find_due_on(&self, date: NaiveDate) -> RepoResult<Vec<WordRecord>> {
        self.inner.find_due_on(date)
    }

    fn bulk_update_review_counts(
        &self,
        updates: &[ReviewCountUpdate],
    ) -> RepoResult<BulkUpdateReport> {
        bump(&self.bulk_updates);
        self.inner.bulk_update_review_counts(updates)
    }
}

/// Prompt double that replays scripted answers and records what it showed.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Result<bool, ()>>,
    pub shown: Vec<(String, String)>,
}

impl ScriptedPrompt {
    /// Answers "yes" to everything.
    pub fn always_yes() -> Self {
        Self::default()
    }

    /// Replays `answers` in order, then answers "yes".
    pub fn with_answers(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().map(Ok).collect(),
            shown: Vec::new(),
        }
    }

    /// Aborts on the `n`-th prompt (0-based).
    pub fn abort_at(n: usize) -> Self {
        let mut answers: VecDeque<Result<bool, ()>> =
            std::iter::repeat(Ok(true)).take(n).collect();
        answers.push_back(Err(()));
        Self {
            answers,
            shown: Vec::new(),
        }
    }

    pub fn shown_words(&self) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for (word, _) in &self.shown {
            if words.last() != Some(word) {
                words.push(word.clone());
            }
        }
        words
    }
}

impl ReviewPrompt for ScriptedPrompt {
    fn confirm(&mut self, word: &str, example: &Example) -> Result<bool, PromptError> {
        self.shown
            .push((word.to_string(), example.sentence.clone()));
        match self.answers.pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(())) => Err(PromptError::Aborted),
            None => Ok(true),
        }
    }
}
