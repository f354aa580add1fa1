//! Progress statistics resolved by habit id or owner.

use crate::engine::availability::AvailabilityEngine;
use crate::engine::percentage::PercentageCalculator;
use crate::engine::report::{ProgressReport, ReportBuilder};
use crate::engine::streak::StreakCounter;
use crate::model::habit::{Habit, HabitId};
use crate::repo::completion_store::CompletionStore;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;

/// Read-only use-case service over the period-accounting engines.
pub struct ProgressService<H: HabitRepository, C: CompletionStore> {
    habits: H,
    completions: C,
}

impl<H: HabitRepository, C: CompletionStore> ProgressService<H, C> {
    pub fn new(habits: H, completions: C) -> Self {
        Self {
            habits,
            completions,
        }
    }

    /// Owner's habits that can still be marked in their current period.
    pub fn available_habits(&self, owner: &str, today: NaiveDate) -> RepoResult<Vec<Habit>> {
        let habits = self.habits.list_habits(owner)?;
        let engine = AvailabilityEngine::new(&self.completions);
        Ok(engine
            .available(&habits, today)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn streak(&self, habit_id: HabitId, today: NaiveDate) -> RepoResult<u32> {
        let habit = self.require_habit(habit_id)?;
        StreakCounter::new(&self.completions).streak(&habit, today)
    }

    pub fn percentage(
        &self,
        habit_id: HabitId,
        start: NaiveDate,
        today: NaiveDate,
    ) -> RepoResult<u8> {
        let habit = self.require_habit(habit_id)?;
        PercentageCalculator::new(&self.completions).percentage(&habit, start, today)
    }

    /// Progress reports for every habit of `owner`, oldest habit first.
    pub fn report(&self, owner: &str, today: NaiveDate) -> RepoResult<Vec<ProgressReport>> {
        let habits = self.habits.list_habits(owner)?;
        ReportBuilder::new(&self.completions).build_all(&habits, today)
    }

    fn require_habit(&self, id: HabitId) -> RepoResult<Habit> {
        self.habits.get_habit(id)?.ok_or(RepoError::NotFound(id))
    }
}
