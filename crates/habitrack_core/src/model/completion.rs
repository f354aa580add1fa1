//! Completion record.
//!
//! # Invariants
//! - `period_index >= 1`; it is derived from `mark_date` at creation and is
//!   the uniqueness key together with `habit_id`.
//! - `mark_date` is never earlier than the habit creation date.

use crate::model::habit::{Habit, HabitId, HabitValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded completion of a habit for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Back-reference to the owning habit.
    pub habit_id: HabitId,
    /// 1-based period index relative to the habit creation date.
    pub period_index: i64,
    /// Calendar date the action was performed.
    pub mark_date: NaiveDate,
}

impl Completion {
    /// Derives a completion for `habit` marked on `mark_date`.
    ///
    /// # Errors
    /// - `MarkBeforeCreation` when `mark_date` precedes the habit creation date.
    pub fn new(habit: &Habit, mark_date: NaiveDate) -> Result<Self, HabitValidationError> {
        if mark_date < habit.created_on() {
            return Err(HabitValidationError::MarkBeforeCreation {
                created_on: habit.created_on(),
                mark_date,
            });
        }

        Ok(Self {
            habit_id: habit.id,
            period_index: habit.period_index(mark_date),
            mark_date,
        })
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.habit_id.is_nil() {
            return Err(HabitValidationError::NilId);
        }
        if self.period_index < 1 {
            return Err(HabitValidationError::InvalidPeriodIndex(self.period_index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Completion;
    use crate::model::habit::{Frequency, Habit, HabitValidationError};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_derives_period_index_from_mark_date() {
        let habit = Habit::new("ann", "Stretch", Frequency::Weekly, day(2024, 1, 1));
        let completion = Completion::new(&habit, day(2024, 1, 15)).unwrap();
        assert_eq!(completion.habit_id, habit.id);
        assert_eq!(completion.period_index, 3);
    }

    #[test]
    fn new_rejects_mark_before_creation() {
        let habit = Habit::new("ann", "Stretch", Frequency::Daily, day(2024, 1, 10));
        let err = Completion::new(&habit, day(2024, 1, 9)).unwrap_err();
        assert!(matches!(err, HabitValidationError::MarkBeforeCreation { .. }));
    }

    #[test]
    fn validate_rejects_non_positive_index() {
        let habit = Habit::new("ann", "Stretch", Frequency::Daily, day(2024, 1, 10));
        let mut completion = Completion::new(&habit, day(2024, 1, 10)).unwrap();
        completion.period_index = 0;
        assert_eq!(
            completion.validate().unwrap_err(),
            HabitValidationError::InvalidPeriodIndex(0)
        );
    }
}
