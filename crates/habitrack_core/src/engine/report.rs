//! Per-habit progress summary.
//!
//! Bundles the current streak with completion percentages over the standard
//! windows: since creation, today, the last seven days and the last calendar
//! month. The summary is plain data; rendering it is left to callers.

use crate::engine::percentage::PercentageCalculator;
use crate::engine::streak::StreakCounter;
use crate::model::habit::{Frequency, Habit, HabitId};
use crate::repo::completion_store::CompletionStore;
use crate::repo::RepoResult;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Progress figures for one habit as of `as_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub habit_id: HabitId,
    pub name: String,
    pub frequency: Frequency,
    pub as_of: NaiveDate,
    /// Period index containing `as_of`.
    pub current_period: i64,
    pub streak: u32,
    pub all_time_percent: u8,
    pub today_percent: u8,
    pub last_week_percent: u8,
    pub last_month_percent: u8,
}

/// Builds `ProgressReport`s from one completion store.
pub struct ReportBuilder<S> {
    store: S,
}

impl<S: CompletionStore> ReportBuilder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn build(&self, habit: &Habit, today: NaiveDate) -> RepoResult<ProgressReport> {
        let streaks = StreakCounter::new(&self.store);
        let percentages = PercentageCalculator::new(&self.store);
        let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN);
        let month_ago = today
            .checked_sub_months(Months::new(1))
            .unwrap_or(NaiveDate::MIN);

        Ok(ProgressReport {
            habit_id: habit.id,
            name: habit.name.clone(),
            frequency: habit.frequency,
            as_of: today,
            current_period: habit.period_index(today),
            streak: streaks.streak(habit, today)?,
            all_time_percent: percentages.percentage(habit, habit.created_on(), today)?,
            today_percent: percentages.percentage(habit, today, today)?,
            last_week_percent: percentages.percentage(habit, week_ago, today)?,
            last_month_percent: percentages.percentage(habit, month_ago, today)?,
        })
    }

    /// Builds one report per habit, in input order.
    pub fn build_all(&self, habits: &[Habit], today: NaiveDate) -> RepoResult<Vec<ProgressReport>> {
        habits.iter().map(|habit| self.build(habit, today)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ReportBuilder;
    use crate::model::completion::Completion;
    use crate::model::habit::{Frequency, Habit};
    use crate::repo::completion_store::CompletionStore;
    use crate::repo::memory_store::MemoryCompletionStore;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn report_combines_streak_and_windows() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Read", Frequency::Daily, day(1, 1));
        for d in [1, 2, 8, 9, 10] {
            store.add(&Completion::new(&habit, day(1, d)).unwrap()).unwrap();
        }

        let report = ReportBuilder::new(&store).build(&habit, day(1, 10)).unwrap();
        assert_eq!(report.current_period, 10);
        assert_eq!(report.streak, 3);
        assert_eq!(report.all_time_percent, 50);
        assert_eq!(report.today_percent, 100);
        // Jan 3..=Jan 10: three of eight days.
        assert_eq!(report.last_week_percent, 38);
        // Clamped to creation date, same as all time.
        assert_eq!(report.last_month_percent, 50);
    }

    #[test]
    fn report_for_untouched_habit_is_all_zero() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Read", Frequency::Weekly, day(1, 1));

        let report = ReportBuilder::new(&store).build(&habit, day(2, 1)).unwrap();
        assert_eq!(report.streak, 0);
        assert_eq!(report.all_time_percent, 0);
        assert_eq!(report.today_percent, 0);
        assert_eq!(report.last_week_percent, 0);
        assert_eq!(report.last_month_percent, 0);
    }
}
