//! In-memory completion store.
//!
//! Keeps completions in an ordered map keyed by `(habit_id, period_index)`,
//! so key order is period order and uniqueness is a map property. Writes are
//! serialized by a mutex; a poisoned lock still yields the last written state.

use crate::model::completion::Completion;
use crate::model::habit::HabitId;
use crate::repo::completion_store::CompletionStore;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type CompletionKey = (HabitId, i64);

/// Map-backed `CompletionStore`, used for tests and storage-less callers.
#[derive(Debug, Default)]
pub struct MemoryCompletionStore {
    entries: Mutex<BTreeMap<CompletionKey, NaiveDate>>,
}

impl MemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of completions across all habits.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<CompletionKey, NaiveDate>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collect_for(
        &self,
        habit_id: HabitId,
        keep: impl Fn(NaiveDate) -> bool,
    ) -> Vec<Completion> {
        self.lock()
            .range((habit_id, i64::MIN)..=(habit_id, i64::MAX))
            .filter(|(_, mark_date)| keep(**mark_date))
            .map(|(&(habit_id, period_index), &mark_date)| Completion {
                habit_id,
                period_index,
                mark_date,
            })
            .collect()
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn add(&self, completion: &Completion) -> RepoResult<()> {
        completion.validate()?;

        match self
            .lock()
            .entry((completion.habit_id, completion.period_index))
        {
            Entry::Occupied(_) => Err(RepoError::DuplicatePeriod {
                habit_id: completion.habit_id,
                period_index: completion.period_index,
            }),
            Entry::Vacant(slot) => {
                slot.insert(completion.mark_date);
                Ok(())
            }
        }
    }

    fn get(&self, habit_id: HabitId, period_index: i64) -> RepoResult<Option<Completion>> {
        Ok(self
            .lock()
            .get(&(habit_id, period_index))
            .map(|&mark_date| Completion {
                habit_id,
                period_index,
                mark_date,
            }))
    }

    fn all_for(&self, habit_id: HabitId) -> RepoResult<Vec<Completion>> {
        Ok(self.collect_for(habit_id, |_| true))
    }

    fn all_for_since(&self, habit_id: HabitId, since: NaiveDate) -> RepoResult<Vec<Completion>> {
        Ok(self.collect_for(habit_id, |mark_date| mark_date >= since))
    }

    fn latest_for(&self, habit_id: HabitId) -> RepoResult<Option<Completion>> {
        Ok(self
            .lock()
            .range((habit_id, i64::MIN)..=(habit_id, i64::MAX))
            .next_back()
            .map(|(&(habit_id, period_index), &mark_date)| Completion {
                habit_id,
                period_index,
                mark_date,
            }))
    }

    fn update_mark_date(
        &self,
        habit_id: HabitId,
        period_index: i64,
        mark_date: NaiveDate,
    ) -> RepoResult<()> {
        match self.lock().get_mut(&(habit_id, period_index)) {
            Some(slot) => {
                *slot = mark_date;
                Ok(())
            }
            None => Err(RepoError::CompletionNotFound {
                habit_id,
                period_index,
            }),
        }
    }

    fn delete(&self, habit_id: HabitId, period_index: i64) -> RepoResult<()> {
        match self.lock().remove(&(habit_id, period_index)) {
            Some(_) => Ok(()),
            None => Err(RepoError::CompletionNotFound {
                habit_id,
                period_index,
            }),
        }
    }

    fn delete_all_for(&self, habit_id: HabitId) -> RepoResult<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(owner, _), _| *owner != habit_id);
        Ok(before - entries.len())
    }

    fn replace_all_for(&self, habit_id: HabitId, completions: &[Completion]) -> RepoResult<()> {
        let mut staged = BTreeMap::new();
        for completion in completions {
            completion.validate()?;
            if completion.habit_id != habit_id {
                return Err(RepoError::InvalidData(format!(
                    "completion for habit {} passed to replace_all_for({habit_id})",
                    completion.habit_id
                )));
            }
            if staged
                .insert((habit_id, completion.period_index), completion.mark_date)
                .is_some()
            {
                return Err(RepoError::DuplicatePeriod {
                    habit_id,
                    period_index: completion.period_index,
                });
            }
        }

        let mut entries = self.lock();
        entries.retain(|(owner, _), _| *owner != habit_id);
        entries.append(&mut staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryCompletionStore;
    use crate::model::completion::Completion;
    use crate::repo::completion_store::CompletionStore;
    use crate::repo::RepoError;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn completion(habit_id: Uuid, period_index: i64, mark_day: u32) -> Completion {
        Completion {
            habit_id,
            period_index,
            mark_date: day(mark_day),
        }
    }

    #[test]
    fn add_rejects_duplicate_period() {
        let store = MemoryCompletionStore::new();
        let habit_id = Uuid::new_v4();
        store.add(&completion(habit_id, 2, 2)).unwrap();

        let err = store.add(&completion(habit_id, 2, 3)).unwrap_err();
        assert!(matches!(
            err,
            RepoError::DuplicatePeriod { period_index: 2, .. }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reads_are_scoped_to_habit_and_ordered_by_period() {
        let store = MemoryCompletionStore::new();
        let habit_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        store.add(&completion(habit_id, 5, 5)).unwrap();
        store.add(&completion(other_id, 9, 9)).unwrap();
        store.add(&completion(habit_id, 1, 1)).unwrap();
        store.add(&completion(habit_id, 3, 3)).unwrap();

        let indices: Vec<i64> = store
            .all_for(habit_id)
            .unwrap()
            .iter()
            .map(|c| c.period_index)
            .collect();
        assert_eq!(indices, vec![1, 3, 5]);
        assert_eq!(store.latest_for(habit_id).unwrap().unwrap().period_index, 5);
        assert_eq!(store.all_for_since(habit_id, day(3)).unwrap().len(), 2);
    }

    #[test]
    fn delete_all_for_leaves_other_habits() {
        let store = MemoryCompletionStore::new();
        let habit_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        store.add(&completion(habit_id, 1, 1)).unwrap();
        store.add(&completion(habit_id, 2, 2)).unwrap();
        store.add(&completion(other_id, 1, 1)).unwrap();

        assert_eq!(store.delete_all_for(habit_id).unwrap(), 2);
        assert!(store.all_for(habit_id).unwrap().is_empty());
        assert_eq!(store.all_for(other_id).unwrap().len(), 1);
    }

    #[test]
    fn update_and_delete_missing_completion_fail() {
        let store = MemoryCompletionStore::new();
        let habit_id = Uuid::new_v4();
        assert!(matches!(
            store.update_mark_date(habit_id, 1, day(1)).unwrap_err(),
            RepoError::CompletionNotFound { .. }
        ));
        assert!(matches!(
            store.delete(habit_id, 1).unwrap_err(),
            RepoError::CompletionNotFound { .. }
        ));
    }

    #[test]
    fn replace_all_for_is_all_or_nothing() {
        let store = MemoryCompletionStore::new();
        let habit_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        store.add(&completion(habit_id, 1, 1)).unwrap();
        store.add(&completion(habit_id, 2, 2)).unwrap();
        store.add(&completion(other_id, 1, 1)).unwrap();

        let err = store
            .replace_all_for(habit_id, &[completion(habit_id, 1, 1), completion(habit_id, 1, 3)])
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicatePeriod { period_index: 1, .. }));
        assert_eq!(store.all_for(habit_id).unwrap().len(), 2);

        store
            .replace_all_for(habit_id, &[completion(habit_id, 7, 7)])
            .unwrap();
        let indices: Vec<i64> = store
            .all_for(habit_id)
            .unwrap()
            .iter()
            .map(|c| c.period_index)
            .collect();
        assert_eq!(indices, vec![7]);
        assert_eq!(store.all_for(other_id).unwrap().len(), 1);
    }
}
