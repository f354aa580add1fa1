//! Which habits may still be marked in the current period.

use crate::model::habit::Habit;
use crate::repo::completion_store::CompletionStore;
use crate::repo::RepoResult;
use chrono::NaiveDate;

/// Answers "is this habit still open for marking today?".
pub struct AvailabilityEngine<S> {
    store: S,
}

impl<S: CompletionStore> AvailabilityEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the habits without a completion in their current period,
    /// preserving input order.
    pub fn available<'h>(&self, habits: &'h [Habit], today: NaiveDate) -> RepoResult<Vec<&'h Habit>> {
        let mut open = Vec::with_capacity(habits.len());
        for habit in habits {
            if self.is_available(habit, today)? {
                open.push(habit);
            }
        }
        Ok(open)
    }

    /// A habit is available unless the period containing `today` already
    /// has a completion. Marks recorded for other periods do not matter.
    pub fn is_available(&self, habit: &Habit, today: NaiveDate) -> RepoResult<bool> {
        let current = self.store.get(habit.id, habit.period_index(today))?;
        Ok(current.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::AvailabilityEngine;
    use crate::model::completion::Completion;
    use crate::model::habit::{Frequency, Habit};
    use crate::repo::completion_store::CompletionStore;
    use crate::repo::memory_store::MemoryCompletionStore;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn habit_without_completions_is_available() {
        let store = MemoryCompletionStore::new();
        let habits = vec![Habit::new("ann", "Read", Frequency::Daily, day(1, 1))];
        let engine = AvailabilityEngine::new(&store);

        let open = engine.available(&habits, day(1, 5)).unwrap();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn marking_current_period_closes_habit() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Read", Frequency::Daily, day(1, 1));
        let engine = AvailabilityEngine::new(&store);

        assert!(engine.is_available(&habit, day(1, 5)).unwrap());
        store.add(&Completion::new(&habit, day(1, 5)).unwrap()).unwrap();
        assert!(!engine.is_available(&habit, day(1, 5)).unwrap());
        assert!(engine.is_available(&habit, day(1, 6)).unwrap());
    }

    #[test]
    fn weekly_habit_stays_closed_for_rest_of_week() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Call home", Frequency::Weekly, day(1, 1));
        store.add(&Completion::new(&habit, day(1, 9)).unwrap()).unwrap();
        let engine = AvailabilityEngine::new(&store);

        assert!(!engine.is_available(&habit, day(1, 8)).unwrap());
        assert!(!engine.is_available(&habit, day(1, 14)).unwrap());
        assert!(engine.is_available(&habit, day(1, 15)).unwrap());
    }

    #[test]
    fn backfilled_entry_does_not_hide_current_mark() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Read", Frequency::Daily, day(1, 1));
        store.add(&Completion::new(&habit, day(1, 10)).unwrap()).unwrap();
        // Recorded later, but for an earlier period.
        store.add(&Completion::new(&habit, day(1, 3)).unwrap()).unwrap();
        let engine = AvailabilityEngine::new(&store);

        assert!(!engine.is_available(&habit, day(1, 10)).unwrap());
    }

    #[test]
    fn mark_for_later_period_does_not_hide_current_mark() {
        let store = MemoryCompletionStore::new();
        let habit = Habit::new("ann", "Read", Frequency::Daily, day(1, 1));
        store.add(&Completion::new(&habit, day(1, 3)).unwrap()).unwrap();
        store.add(&Completion::new(&habit, day(1, 5)).unwrap()).unwrap();
        let engine = AvailabilityEngine::new(&store);

        assert!(!engine.is_available(&habit, day(1, 3)).unwrap());
        assert!(engine.is_available(&habit, day(1, 4)).unwrap());
    }

    #[test]
    fn available_filters_and_keeps_order() {
        let store = MemoryCompletionStore::new();
        let habits = vec![
            Habit::new("ann", "A", Frequency::Daily, day(1, 1)),
            Habit::new("ann", "B", Frequency::Daily, day(1, 1)),
            Habit::new("ann", "C", Frequency::Weekly, day(1, 1)),
        ];
        store.add(&Completion::new(&habits[1], day(1, 2)).unwrap()).unwrap();
        let engine = AvailabilityEngine::new(&store);

        let names: Vec<&str> = engine
            .available(&habits, day(1, 2))
            .unwrap()
            .into_iter()
            .map(|habit| habit.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
