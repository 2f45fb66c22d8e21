//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//! - Retry a failed file open a bounded number of times at startup.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - A newer-than-supported schema is never retried.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded retry settings for the startup connect phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total open attempts, including the first one. Zero is treated as one.
    pub attempts: u32,
    /// Sleep between two consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path.as_ref()))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens a SQLite database file, retrying transient failures.
///
/// Returns [`DbError::ConnectionFailed`] once every attempt has failed.
/// [`DbError::UnsupportedSchemaVersion`] is returned immediately because
/// retrying cannot fix it.
pub fn open_db_with_retry(path: impl AsRef<Path>, policy: RetryPolicy) -> DbResult<Connection> {
    let path = path.as_ref();
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match open_db(path) {
            Ok(conn) => return Ok(conn),
            Err(err @ DbError::UnsupportedSchemaVersion { .. }) => return Err(err),
            Err(err) if attempt >= attempts => {
                error!(
                    "event=db_connect module=db status=error attempts={} error_code=db_connect_exhausted",
                    attempts
                );
                return Err(DbError::ConnectionFailed {
                    attempts,
                    last_error: Box::new(err),
                });
            }
            Err(err) => {
                warn!(
                    "event=db_connect module=db status=retry attempt={} max_attempts={} error={}",
                    attempt, attempts, err
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
        }
    }
}

fn open_with<F>(mode: &str, open: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
