//! Fixed-interval review policy.
//!
//! # Invariants
//! - Intervals are strictly increasing, so due dates need no deduplication.
//! - Every due date is 00:00:00.000 UTC of its calendar day.
//! - Functions here are pure; callers supply the clock.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Days after creation on which a word is due, in review order.
pub const REVIEW_INTERVAL_DAYS: [i64; 6] = [0, 1, 2, 4, 7, 15];

/// Computes the full review schedule for a record created at `created_at`.
pub fn compute_due_dates(created_at: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    REVIEW_INTERVAL_DAYS
        .iter()
        .map(|days| start_of_day((created_at + Duration::days(*days)).date_naive()))
        .collect()
}

/// Returns UTC midnight of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Returns the inclusive `[start, end]` bounds of `date` in UTC, with
/// `end` at 23:59:59.999.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date);
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}
