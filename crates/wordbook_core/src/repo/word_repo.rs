//! Word record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup, write and due-date range APIs over `word_records`.
//! - Keep SQL and JSON column encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `WordRecord::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `update` is a full-document replace keyed by record id, last write wins.
//! - Review-count batches run in one transaction and never lower a count.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::word::{Example, WordId, WordRecord, WordValidationError};
use crate::schedule::interval::day_bounds;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const WORD_SELECT_SQL: &str = "SELECT
    id,
    word,
    examples,
    review_count,
    due_dates,
    created_at,
    updated_at
FROM word_records";

const REQUIRED_COLUMNS: [&str; 7] = [
    "id",
    "word",
    "examples",
    "review_count",
    "due_dates",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for word record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(WordValidationError),
    Db(DbError),
    NotFound(WordId),
    /// Insert lost the race against another writer for the same word.
    DuplicateWord(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "word record not found: {id}"),
            Self::DuplicateWord(word) => write!(f, "word already stored: `{word}`"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted word record data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WordValidationError> for RepoError {
    fn from(value: WordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One staged review-count write, addressed by word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCountUpdate {
    pub word: String,
    pub review_count: i64,
}

/// Outcome of a review-count batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateReport {
    /// Rows written.
    pub applied: usize,
    /// Words that no longer exist in the store.
    pub missing: Vec<String>,
}

/// Record store interface used by the merge engine and review scheduler.
pub trait WordRepository {
    /// Exact-match lookup by word.
    fn find_by_word(&self, word: &str) -> RepoResult<Option<WordRecord>>;
    /// Inserts a new record and returns its id.
    ///
    /// Fails with [`RepoError::DuplicateWord`] when the word already exists.
    fn insert(&self, record: &WordRecord) -> RepoResult<WordId>;
    /// Replaces the stored document with the same id.
    fn update(&self, record: &WordRecord) -> RepoResult<()>;
    /// Deletes one record; returns whether a record was removed.
    fn delete_by_word(&self, word: &str) -> RepoResult<bool>;
    /// Deletes every record and returns how many were removed.
    fn delete_all(&self) -> RepoResult<usize>;
    /// Lists all records, oldest first.
    fn find_all(&self) -> RepoResult<Vec<WordRecord>>;
    /// Lists records with at least one due date inside the UTC day of `date`.
    fn find_due_on(&self, date: NaiveDate) -> RepoResult<Vec<WordRecord>>;
    /// Applies all review-count updates as one batch.
    fn bulk_update_review_counts(
        &self,
        updates: &[ReviewCountUpdate],
    ) -> RepoResult<BulkUpdateReport>;
}

/// Lets one store instance back several services at once.
impl<T: WordRepository + ?Sized> WordRepository for &T {
    fn find_by_word(&self, word: &str) -> RepoResult<Option<WordRecord>> {
        (**self).find_by_word(word)
    }

    fn insert(&self, record: &WordRecord) -> RepoResult<WordId> {
        (**self).insert(record)
    }

    fn update(&self, record: &WordRecord) -> RepoResult<()> {
        (**self).update(record)
    }

    fn delete_by_word(&self, word: &str) -> RepoResult<bool> {
        (**self).delete_by_word(word)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        (**self).delete_all()
    }

    fn find_all(&self) -> RepoResult<Vec<WordRecord>> {
        (**self).find_all()
    }

    fn find_due_on(&self, date: NaiveDate) -> RepoResult<Vec<WordRecord>> {
        (**self).find_due_on(date)
    }

    fn bulk_update_review_counts(
        &self,
        updates: &[ReviewCountUpdate],
    ) -> RepoResult<BulkUpdateReport> {
        (**self).bulk_update_review_counts(updates)
    }
}

/// SQLite-backed word record store.
pub struct SqliteWordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections that did not go through `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_word_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl WordRepository for SqliteWordRepository<'_> {
    fn find_by_word(&self, word: &str) -> RepoResult<Option<WordRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORD_SELECT_SQL} WHERE word = ?1;"))?;
        let mut rows = stmt.query([word])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_word_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, record: &WordRecord) -> RepoResult<WordId> {
        record.validate()?;

        let result = self.conn.execute(
            "INSERT INTO word_records (
                id,
                word,
                examples,
                review_count,
                due_dates,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.to_string(),
                record.word.as_str(),
                encode_examples(&record.examples)?,
                record.review_count,
                encode_due_dates(&record.due_dates)?,
                record.created_at,
                record.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(record.id),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::DuplicateWord(record.word.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, record: &WordRecord) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE word_records
             SET
                word = ?1,
                examples = ?2,
                review_count = ?3,
                due_dates = ?4,
                updated_at = ?5
             WHERE id = ?6;",
            params![
                record.word.as_str(),
                encode_examples(&record.examples)?,
                record.review_count,
                encode_due_dates(&record.due_dates)?,
                record.updated_at,
                record.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }

        Ok(())
    }

    fn delete_by_word(&self, word: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM word_records WHERE word = ?1;", [word])?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM word_records;", [])?;
        Ok(changed)
    }

    fn find_all(&self) -> RepoResult<Vec<WordRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WORD_SELECT_SQL} ORDER BY created_at ASC, word ASC;"
        ))?;
        let rows = stmt.query([])?;
        collect_rows(rows)
    }

    fn find_due_on(&self, date: NaiveDate) -> RepoResult<Vec<WordRecord>> {
        let (start, end) = day_bounds(date);
        let mut stmt = self.conn.prepare(&format!(
            "{WORD_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1
                FROM json_each(word_records.due_dates) AS due
                WHERE due.value BETWEEN ?1 AND ?2
             )
             ORDER BY created_at ASC, word ASC;"
        ))?;
        let rows = stmt.query(params![start.timestamp_millis(), end.timestamp_millis()])?;
        collect_rows(rows)
    }

    fn bulk_update_review_counts(
        &self,
        updates: &[ReviewCountUpdate],
    ) -> RepoResult<BulkUpdateReport> {
        let mut report = BulkUpdateReport::default();
        if updates.is_empty() {
            return Ok(report);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE word_records
                 SET
                    review_count = MAX(review_count, ?1),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE word = ?2;",
            )?;
            for update in updates {
                if update.review_count < 0 {
                    return Err(RepoError::InvalidData(format!(
                        "negative review count {} for staged update",
                        update.review_count
                    )));
                }
                let changed = stmt.execute(params![update.review_count, update.word.as_str()])?;
                if changed == 0 {
                    report.missing.push(update.word.clone());
                } else {
                    report.applied += changed;
                }
            }
        }
        tx.commit()?;

        if !report.missing.is_empty() {
            warn!(
                "event=review_commit module=repo status=partial applied={} missing={}",
                report.applied,
                report.missing.len()
            );
        }
        debug!(
            "event=review_commit module=repo status=ok applied={}",
            report.applied
        );
        Ok(report)
    }
}

fn collect_rows(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<WordRecord>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_word_row(row)?);
    }
    Ok(records)
}

fn parse_word_row(row: &Row<'_>) -> RepoResult<WordRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in word_records.id"))
    })?;

    let examples_json: String = row.get("examples")?;
    let examples: Vec<Example> = serde_json::from_str(&examples_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid examples document for {id}: {err}"))
    })?;

    let due_json: String = row.get("due_dates")?;
    let due_millis: Vec<i64> = serde_json::from_str(&due_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid due_dates document for {id}: {err}"))
    })?;
    let due_dates = due_millis
        .into_iter()
        .map(|millis| {
            Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                RepoError::InvalidData(format!("due date {millis} out of range for {id}"))
            })
        })
        .collect::<RepoResult<Vec<DateTime<Utc>>>>()?;

    let review_count: i64 = row.get("review_count")?;
    if review_count < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative review_count {review_count} for {id}"
        )));
    }

    let record = WordRecord {
        id,
        word: row.get("word")?,
        examples,
        review_count,
        due_dates,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    record.validate()?;
    Ok(record)
}

fn encode_examples(examples: &[Example]) -> RepoResult<String> {
    serde_json::to_string(examples)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode examples: {err}")))
}

fn encode_due_dates(due_dates: &[DateTime<Utc>]) -> RepoResult<String> {
    let millis: Vec<i64> = due_dates.iter().map(DateTime::timestamp_millis).collect();
    serde_json::to_string(&millis)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode due dates: {err}")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_word_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "word_records")? {
        return Err(RepoError::MissingRequiredTable("word_records"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "word_records", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "word_records",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
