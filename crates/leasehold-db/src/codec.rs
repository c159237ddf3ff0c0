//! Encoding helpers shared by the repository implementations.

use chrono::NaiveDate;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;

/// Marker thrown from transactions when an invariant check fails.
pub(crate) const CONFLICT_MARKER: &str = "leasehold_conflict";

/// Upper bound used in place of an open-ended move-out date in overlap
/// comparisons.
pub(crate) const OPEN_END: &str = "9999-12-31";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_from_db(raw: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DbError::Decode(format!("invalid date '{raw}': {e}")))
}

pub(crate) fn opt_date_from_db(raw: Option<&str>) -> Result<Option<NaiveDate>, DbError> {
    raw.map(date_from_db).transpose()
}

pub(crate) fn uuid_from_db(field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

/// Allocate the next integer key for `table`.
pub(crate) async fn next_id<C: Connection>(
    db: &Surreal<C>,
    table: &'static str,
) -> Result<i64, DbError> {
    let result = db
        .query("UPSERT type::record('_sequence', $table) SET value += 1 RETURN VALUE value")
        .bind(("table", table))
        .await?;
    let mut result = result.check().map_err(classify)?;

    let values: Vec<i64> = result.take(0)?;
    values
        .first()
        .copied()
        .ok_or_else(|| DbError::Query(format!("sequence for '{table}' returned no value")))
}

/// Map a statement error to a [`DbError`], recognising ledger conflicts
/// and store-level transaction conflicts.
pub(crate) fn classify(err: surrealdb::Error) -> DbError {
    let message = err.to_string();
    if is_conflict(&message) {
        DbError::Conflict(conflict_reason(&message))
    } else {
        DbError::Query(message)
    }
}

/// Collapse the per-statement errors of a failed transaction into one
/// error.
///
/// When a transaction fails every statement reports an error, most of
/// them a generic "not executed" message, so the statement that actually
/// tripped is searched for rather than taking the first one.
pub(crate) fn transaction_error(errors: impl IntoIterator<Item = surrealdb::Error>) -> DbError {
    let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
    match messages.iter().find(|m| is_conflict(m)) {
        Some(message) => DbError::Conflict(conflict_reason(message)),
        None => DbError::Query(messages.join("; ")),
    }
}

fn is_conflict(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("conflict")
        || lower.contains("already contains")
        || lower.contains("already exists")
}

fn conflict_reason(message: &str) -> String {
    match message.find(CONFLICT_MARKER) {
        Some(start) => message[start + CONFLICT_MARKER.len()..]
            .trim_start_matches(':')
            .trim()
            .trim_end_matches(['\'', '"'])
            .to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_sort_as_strings() {
        let a = date_to_db(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
        let b = date_to_db(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert!(a < b);
        assert!(b.as_str() < OPEN_END);
    }

    #[test]
    fn date_round_trip() {
        let d = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(date_from_db(&date_to_db(d)).unwrap(), d);
        assert!(date_from_db("28/02/2025").is_err());
    }

    #[test]
    fn conflict_reason_strips_marker() {
        let reason = conflict_reason("An error occurred: leasehold_conflict: unit 4 is occupied");
        assert_eq!(reason, "unit 4 is occupied");
    }

    #[test]
    fn store_conflict_is_recognised() {
        assert!(is_conflict(
            "Failed to commit transaction due to a read or write conflict"
        ));
        assert!(is_conflict(
            "Database index `idx_tenant_user` already contains 'abc'"
        ));
        assert!(!is_conflict("The query was not executed due to a failed transaction"));
    }
}
