//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the habit and completion storage contracts used by engines and
//!   services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths validate records before persistence.
//! - `(habit, period_index)` uniqueness is a storage key, never a scan.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicatePeriod`,
//!   `DuplicateName`) in addition to DB transport errors.

pub mod completion_store;
pub mod habit_repo;
pub mod memory_store;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::habit::{HabitId, HabitValidationError};
use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit and completion persistence.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] HabitValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("habit not found: {0}")]
    NotFound(HabitId),
    #[error("no completion for habit {habit_id} in period {period_index}")]
    CompletionNotFound { habit_id: HabitId, period_index: i64 },
    #[error("habit `{name}` already exists for owner `{owner}`")]
    DuplicateName { owner: String, name: String },
    #[error("habit {habit_id} already has a completion for period {period_index}")]
    DuplicatePeriod { habit_id: HabitId, period_index: i64 },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections whose schema was not brought up to date by `db::open_*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let db_version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let expected = latest_version();
    if db_version != expected {
        return Err(DbError::SchemaNotReady {
            db_version,
            expected,
        }
        .into());
    }
    Ok(())
}

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_db_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

/// Extended SQLite result code of a failed statement, if any.
pub(crate) fn sqlite_extended_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => Some(failure.extended_code),
        _ => None,
    }
}
