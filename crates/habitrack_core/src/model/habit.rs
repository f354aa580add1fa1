//! Habit record and validation rules.
//!
//! # Responsibility
//! - Define the canonical habit shape persisted by `HabitRepository`.
//! - Provide constructors that generate or accept stable identities.
//!
//! # Invariants
//! - `id` is stable and never reused for another habit.
//! - `created_on` is fixed at construction; there is no setter.
//! - `(owner, name)` is unique; the repository enforces it.

use crate::engine::period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier for a habit.
pub type HabitId = Uuid;

/// Recurrence unit of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// One period per calendar day.
    Daily,
    /// One period per seven days, counted from the creation date.
    Weekly,
}

impl Frequency {
    /// Number of calendar days covered by one period.
    pub fn period_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }

    pub(crate) fn as_db_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub(crate) fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// Validation failures for habit and completion records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitValidationError {
    #[error("habit id must not be nil")]
    NilId,
    #[error("habit owner must not be blank")]
    BlankOwner,
    #[error("habit name must not be blank")]
    BlankName,
    #[error("mark date {mark_date} is before habit creation date {created_on}")]
    MarkBeforeCreation {
        created_on: NaiveDate,
        mark_date: NaiveDate,
    },
    #[error("period index must be >= 1, got {0}")]
    InvalidPeriodIndex(i64),
    #[error("mark date {mark_date} falls in period {actual}, not period {period_index}")]
    MarkOutsidePeriod {
        period_index: i64,
        mark_date: NaiveDate,
        actual: i64,
    },
}

/// A recurring habit owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Stable id used as the completion back-reference.
    pub id: HabitId,
    /// Opaque owner key. Habit names are unique per owner.
    pub owner: String,
    /// Display name, trimmed.
    pub name: String,
    /// Free-form description; may be empty.
    pub description: String,
    /// Period unit used by every statistic.
    pub frequency: Frequency,
    created_on: NaiveDate,
}

impl Habit {
    /// Creates a habit with a generated id and an empty description.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        frequency: Frequency,
        created_on: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into().trim().to_string(),
            description: String::new(),
            frequency,
            created_on,
        }
    }

    /// Creates a habit with a caller-provided id.
    ///
    /// Used when rehydrating rows whose identity already exists.
    ///
    /// # Errors
    /// - Returns `HabitValidationError` when the resulting record is invalid.
    pub fn with_id(
        id: HabitId,
        owner: impl Into<String>,
        name: impl Into<String>,
        frequency: Frequency,
        created_on: NaiveDate,
    ) -> Result<Self, HabitValidationError> {
        let mut habit = Self::new(owner, name, frequency, created_on);
        habit.id = id;
        habit.validate()?;
        Ok(habit)
    }

    /// Sets the description, builder style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The date the habit was created; period 1 starts here.
    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    /// Period index of `date` for this habit. See [`period::period_index`].
    pub fn period_index(&self, date: NaiveDate) -> i64 {
        period::period_index(self, date)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.is_nil() {
            return Err(HabitValidationError::NilId);
        }
        if self.owner.trim().is_empty() {
            return Err(HabitValidationError::BlankOwner);
        }
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::BlankName);
        }
        Ok(())
    }
}
