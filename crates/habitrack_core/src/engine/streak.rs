//! Current completion streak.
//!
//! A streak only counts while it is ongoing: the period containing `today`
//! must be completed, otherwise the streak is zero.

use crate::model::habit::Habit;
use crate::repo::completion_store::CompletionStore;
use crate::repo::RepoResult;
use chrono::NaiveDate;

/// Counts consecutive completed periods ending at the current one.
pub struct StreakCounter<S> {
    store: S,
}

impl<S: CompletionStore> StreakCounter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn streak(&self, habit: &Habit, today: NaiveDate) -> RepoResult<u32> {
        let indices = self
            .store
            .all_for(habit.id)?
            .into_iter()
            .map(|completion| completion.period_index);
        Ok(count_streak(habit.period_index(today), indices))
    }
}

/// Walks period indices from highest to lowest and counts the unbroken run
/// that starts exactly at `current_index`. Indices after `current_index`
/// are ignored.
pub fn count_streak(current_index: i64, indices: impl IntoIterator<Item = i64>) -> u32 {
    let mut sorted: Vec<i64> = indices
        .into_iter()
        .filter(|&index| index <= current_index)
        .collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut expected = current_index;
    let mut streak = 0;
    for index in sorted {
        if index != expected {
            break;
        }
        streak += 1;
        expected -= 1;
    }
    streak
}
