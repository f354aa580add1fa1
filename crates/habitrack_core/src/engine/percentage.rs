//! Completion percentage over a date window.
//!
//! The window runs from `max(start, created_on)` through `today`, inclusive,
//! measured in whole periods. A window with no elapsed period yields 0.

use crate::model::habit::Habit;
use crate::repo::completion_store::CompletionStore;
use crate::repo::RepoResult;
use chrono::NaiveDate;

/// Computes the share of eligible periods that have a completion.
pub struct PercentageCalculator<S> {
    store: S,
}

impl<S: CompletionStore> PercentageCalculator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a whole percentage in `0..=100`.
    pub fn percentage(&self, habit: &Habit, start: NaiveDate, today: NaiveDate) -> RepoResult<u8> {
        let effective_start = start.max(habit.created_on());
        if effective_start > today {
            return Ok(0);
        }

        let start_index = habit.period_index(effective_start);
        let current_index = habit.period_index(today);
        let completed = self
            .store
            .all_for(habit.id)?
            .iter()
            .filter(|completion| (start_index..=current_index).contains(&completion.period_index))
            .count();

        let eligible = current_index - start_index + 1;
        Ok(rounded_percentage(completed as i64, eligible))
    }
}

/// `round(100 * completed / eligible)` with halves rounded up, capped to 100.
///
/// A non-positive `eligible` count has no elapsed periods and yields 0.
pub fn rounded_percentage(completed: i64, eligible: i64) -> u8 {
    if eligible <= 0 || completed <= 0 {
        return 0;
    }
    let completed = completed.min(eligible);
    let scaled = (200 * completed + eligible) / (2 * eligible);
    u8::try_from(scaled).map_or(100, |value| value.min(100))
}
