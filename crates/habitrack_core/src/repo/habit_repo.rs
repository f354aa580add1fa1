//! Habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `habits` table.
//! - Translate storage constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths call `Habit::validate()` before SQL mutations.
//! - `created_on` is written once by `create_habit` and never updated.
//! - Deleting a habit cascades to its completions at the storage level.

use crate::model::habit::{Frequency, Habit, HabitId};
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_db_date, sqlite_extended_code, RepoError,
    RepoResult,
};
use rusqlite::{ffi, params, Connection, Row};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    owner,
    name,
    description,
    frequency,
    created_on
FROM habits";

/// Repository interface for habit lifecycle operations.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    /// Persists name, description and frequency. The creation date is kept.
    fn update_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    fn find_habit(&self, owner: &str, name: &str) -> RepoResult<Option<Habit>>;
    /// Lists an owner's habits ordered by creation date, then name.
    fn list_habits(&self, owner: &str) -> RepoResult<Vec<Habit>>;
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
}

impl<R: HabitRepository + ?Sized> HabitRepository for &R {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        (**self).create_habit(habit)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        (**self).update_habit(habit)
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        (**self).get_habit(id)
    }

    fn find_habit(&self, owner: &str, name: &str) -> RepoResult<Option<Habit>> {
        (**self).find_habit(owner, name)
    }

    fn list_habits(&self, owner: &str) -> RepoResult<Vec<Habit>> {
        (**self).list_habits(owner)
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        (**self).delete_habit(id)
    }
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_habits(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut habits = Vec::new();

        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }

        Ok(habits)
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        self.conn
            .execute(
                "INSERT INTO habits (
                    uuid,
                    owner,
                    name,
                    description,
                    frequency,
                    created_on
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    habit.id.to_string(),
                    habit.owner.as_str(),
                    habit.name.as_str(),
                    habit.description.as_str(),
                    habit.frequency.as_db_str(),
                    date_to_db(habit.created_on()),
                ],
            )
            .map_err(|err| map_name_conflict(err, habit))?;

        Ok(habit.id)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE habits
                 SET
                    name = ?1,
                    description = ?2,
                    frequency = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?4;",
                params![
                    habit.name.as_str(),
                    habit.description.as_str(),
                    habit.frequency.as_db_str(),
                    habit.id.to_string(),
                ],
            )
            .map_err(|err| map_name_conflict(err, habit))?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit.id));
        }

        Ok(())
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        let mut habits =
            self.query_habits(&format!("{HABIT_SELECT_SQL} WHERE uuid = ?1;"), [id.to_string()])?;
        Ok(habits.pop())
    }

    fn find_habit(&self, owner: &str, name: &str) -> RepoResult<Option<Habit>> {
        let mut habits = self.query_habits(
            &format!("{HABIT_SELECT_SQL} WHERE owner = ?1 AND name = ?2;"),
            params![owner, name.trim()],
        )?;
        Ok(habits.pop())
    }

    fn list_habits(&self, owner: &str) -> RepoResult<Vec<Habit>> {
        self.query_habits(
            &format!("{HABIT_SELECT_SQL} WHERE owner = ?1 ORDER BY created_on ASC, name ASC;"),
            [owner],
        )
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn map_name_conflict(err: rusqlite::Error, habit: &Habit) -> RepoError {
    match sqlite_extended_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => RepoError::DuplicateName {
            owner: habit.owner.clone(),
            name: habit.name.clone(),
        },
        _ => err.into(),
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in habits.uuid"))
    })?;

    let frequency_text: String = row.get("frequency")?;
    let frequency = Frequency::from_db_str(&frequency_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid frequency `{frequency_text}` in habits.frequency"
        ))
    })?;

    let created_on_text: String = row.get("created_on")?;
    let created_on = parse_db_date(&created_on_text, "habits.created_on")?;

    let owner: String = row.get("owner")?;
    let name: String = row.get("name")?;
    let habit = Habit::with_id(id, owner, name, frequency, created_on)?
        .with_description(row.get::<_, String>("description")?);
    Ok(habit)
}
