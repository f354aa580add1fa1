//! Completion store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist one completion per `(habit, period_index)` key.
//! - Serve completions ordered by period index.
//!
//! # Invariants
//! - A second write for an existing key is rejected with `DuplicatePeriod`,
//!   enforced by the table's composite primary key.
//! - Reads never rely on insertion order; results are sorted by
//!   `period_index ASC`.

use crate::model::completion::Completion;
use crate::model::habit::HabitId;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_db_date, sqlite_extended_code, RepoError,
    RepoResult,
};
use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, Row};
use uuid::Uuid;

const COMPLETION_SELECT_SQL: &str = "SELECT
    habit_uuid,
    period_index,
    mark_date
FROM habit_completions";

/// Storage contract for habit completions.
pub trait CompletionStore {
    /// Records a completion. Rejects an occupied `(habit, period_index)` key.
    fn add(&self, completion: &Completion) -> RepoResult<()>;
    /// Gets the completion recorded for one period, if any.
    fn get(&self, habit_id: HabitId, period_index: i64) -> RepoResult<Option<Completion>>;
    /// Lists every completion of a habit, ascending by period index.
    fn all_for(&self, habit_id: HabitId) -> RepoResult<Vec<Completion>>;
    /// Lists completions with `mark_date >= since`, ascending by period index.
    fn all_for_since(&self, habit_id: HabitId, since: NaiveDate) -> RepoResult<Vec<Completion>>;
    /// Replaces the mark date of an existing completion.
    fn update_mark_date(
        &self,
        habit_id: HabitId,
        period_index: i64,
        mark_date: NaiveDate,
    ) -> RepoResult<()>;
    /// Deletes one completion.
    fn delete(&self, habit_id: HabitId, period_index: i64) -> RepoResult<()>;
    /// Deletes every completion of a habit and returns how many were removed.
    fn delete_all_for(&self, habit_id: HabitId) -> RepoResult<usize>;
    /// Atomically swaps a habit's completions for `completions`.
    ///
    /// Either every record is written or the previous set is left untouched.
    fn replace_all_for(&self, habit_id: HabitId, completions: &[Completion]) -> RepoResult<()>;

    /// Returns the completion with the highest period index.
    fn latest_for(&self, habit_id: HabitId) -> RepoResult<Option<Completion>> {
        Ok(self
            .all_for(habit_id)?
            .into_iter()
            .max_by_key(|completion| completion.period_index))
    }
}

impl<S: CompletionStore + ?Sized> CompletionStore for &S {
    fn add(&self, completion: &Completion) -> RepoResult<()> {
        (**self).add(completion)
    }

    fn get(&self, habit_id: HabitId, period_index: i64) -> RepoResult<Option<Completion>> {
        (**self).get(habit_id, period_index)
    }

    fn all_for(&self, habit_id: HabitId) -> RepoResult<Vec<Completion>> {
        (**self).all_for(habit_id)
    }

    fn all_for_since(&self, habit_id: HabitId, since: NaiveDate) -> RepoResult<Vec<Completion>> {
        (**self).all_for_since(habit_id, since)
    }

    fn update_mark_date(
        &self,
        habit_id: HabitId,
        period_index: i64,
        mark_date: NaiveDate,
    ) -> RepoResult<()> {
        (**self).update_mark_date(habit_id, period_index, mark_date)
    }

    fn delete(&self, habit_id: HabitId, period_index: i64) -> RepoResult<()> {
        (**self).delete(habit_id, period_index)
    }

    fn delete_all_for(&self, habit_id: HabitId) -> RepoResult<usize> {
        (**self).delete_all_for(habit_id)
    }

    fn replace_all_for(&self, habit_id: HabitId, completions: &[Completion]) -> RepoResult<()> {
        (**self).replace_all_for(habit_id, completions)
    }

    fn latest_for(&self, habit_id: HabitId) -> RepoResult<Option<Completion>> {
        (**self).latest_for(habit_id)
    }
}

/// SQLite-backed completion store over the `habit_completions` table.
pub struct SqliteCompletionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompletionStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_completions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Completion>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut completions = Vec::new();

        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }

        Ok(completions)
    }
}

impl CompletionStore for SqliteCompletionStore<'_> {
    fn add(&self, completion: &Completion) -> RepoResult<()> {
        completion.validate()?;
        insert_completion(self.conn, completion)
    }

    fn get(&self, habit_id: HabitId, period_index: i64) -> RepoResult<Option<Completion>> {
        let mut completions = self.query_completions(
            &format!("{COMPLETION_SELECT_SQL} WHERE habit_uuid = ?1 AND period_index = ?2;"),
            params![habit_id.to_string(), period_index],
        )?;
        Ok(completions.pop())
    }

    fn all_for(&self, habit_id: HabitId) -> RepoResult<Vec<Completion>> {
        self.query_completions(
            &format!("{COMPLETION_SELECT_SQL} WHERE habit_uuid = ?1 ORDER BY period_index ASC;"),
            [habit_id.to_string()],
        )
    }

    fn all_for_since(&self, habit_id: HabitId, since: NaiveDate) -> RepoResult<Vec<Completion>> {
        self.query_completions(
            &format!(
                "{COMPLETION_SELECT_SQL}
                 WHERE habit_uuid = ?1
                   AND mark_date >= ?2
                 ORDER BY period_index ASC;"
            ),
            params![habit_id.to_string(), date_to_db(since)],
        )
    }

    fn latest_for(&self, habit_id: HabitId) -> RepoResult<Option<Completion>> {
        let mut completions = self.query_completions(
            &format!(
                "{COMPLETION_SELECT_SQL}
                 WHERE habit_uuid = ?1
                 ORDER BY period_index DESC
                 LIMIT 1;"
            ),
            [habit_id.to_string()],
        )?;
        Ok(completions.pop())
    }

    fn update_mark_date(
        &self,
        habit_id: HabitId,
        period_index: i64,
        mark_date: NaiveDate,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habit_completions
             SET mark_date = ?3
             WHERE habit_uuid = ?1 AND period_index = ?2;",
            params![habit_id.to_string(), period_index, date_to_db(mark_date)],
        )?;

        if changed == 0 {
            return Err(RepoError::CompletionNotFound {
                habit_id,
                period_index,
            });
        }

        Ok(())
    }

    fn delete(&self, habit_id: HabitId, period_index: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM habit_completions WHERE habit_uuid = ?1 AND period_index = ?2;",
            params![habit_id.to_string(), period_index],
        )?;

        if changed == 0 {
            return Err(RepoError::CompletionNotFound {
                habit_id,
                period_index,
            });
        }

        Ok(())
    }

    fn delete_all_for(&self, habit_id: HabitId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM habit_completions WHERE habit_uuid = ?1;",
            [habit_id.to_string()],
        )?;
        Ok(removed)
    }

    fn replace_all_for(&self, habit_id: HabitId, completions: &[Completion]) -> RepoResult<()> {
        for completion in completions {
            completion.validate()?;
            if completion.habit_id != habit_id {
                return Err(RepoError::InvalidData(format!(
                    "completion for habit {} passed to replace_all_for({habit_id})",
                    completion.habit_id
                )));
            }
        }

        // Dropping the transaction without commit rolls the delete back.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM habit_completions WHERE habit_uuid = ?1;",
            [habit_id.to_string()],
        )?;
        for completion in completions {
            insert_completion(&tx, completion)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_completion(conn: &Connection, completion: &Completion) -> RepoResult<()> {
    let inserted = conn.execute(
        "INSERT INTO habit_completions (
            habit_uuid,
            period_index,
            mark_date
        ) VALUES (?1, ?2, ?3);",
        params![
            completion.habit_id.to_string(),
            completion.period_index,
            date_to_db(completion.mark_date),
        ],
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(err) => Err(match sqlite_extended_code(&err) {
            Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => RepoError::DuplicatePeriod {
                habit_id: completion.habit_id,
                period_index: completion.period_index,
            },
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => RepoError::NotFound(completion.habit_id),
            _ => err.into(),
        }),
    }
}

fn parse_completion_row(row: &Row<'_>) -> RepoResult<Completion> {
    let uuid_text: String = row.get("habit_uuid")?;
    let habit_id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in habit_completions.habit_uuid"
        ))
    })?;
    let mark_date_text: String = row.get("mark_date")?;

    let completion = Completion {
        habit_id,
        period_index: row.get("period_index")?,
        mark_date: parse_db_date(&mark_date_text, "habit_completions.mark_date")?,
    };
    completion.validate()?;
    Ok(completion)
}
