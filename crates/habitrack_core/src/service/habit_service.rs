//! Habit lifecycle and completion marking.
//!
//! # Responsibility
//! - Create, edit, list and delete habits.
//! - Record completions with derived period indices.
//!
//! # Invariants
//! - Deleting a habit removes its completions first, whatever the backend.
//! - A frequency change re-derives stored period indices from mark dates;
//!   nothing is written unless every completion re-derives cleanly.
//! - A stored mark date always falls inside its own period.
//! - Service APIs never bypass repository validation.

use crate::model::completion::Completion;
use crate::model::habit::{Frequency, Habit, HabitId, HabitValidationError};
use crate::repo::completion_store::CompletionStore;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Partial edit of a habit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
}

/// Use-case service for habit lifecycle and marking.
pub struct HabitService<H: HabitRepository, C: CompletionStore> {
    habits: H,
    completions: C,
}

impl<H: HabitRepository, C: CompletionStore> HabitService<H, C> {
    pub fn new(habits: H, completions: C) -> Self {
        Self {
            habits,
            completions,
        }
    }

    /// Creates a habit for `owner`.
    ///
    /// # Errors
    /// - `DuplicateName` when the owner already has a habit with this name.
    /// - `Validation` for blank owner/name.
    pub fn create_habit(
        &self,
        owner: &str,
        name: &str,
        description: &str,
        frequency: Frequency,
        created_on: NaiveDate,
    ) -> RepoResult<Habit> {
        let habit = Habit::new(owner, name, frequency, created_on).with_description(description);
        habit.validate()?;
        if self.habits.find_habit(&habit.owner, &habit.name)?.is_some() {
            return Err(RepoError::DuplicateName {
                owner: habit.owner,
                name: habit.name,
            });
        }

        self.habits.create_habit(&habit)?;
        info!(
            "event=habit_create module=service status=ok habit_id={} frequency={}",
            habit.id,
            habit.frequency.as_db_str()
        );
        Ok(habit)
    }

    /// Applies a partial edit and returns the stored habit.
    pub fn update_habit(&self, id: HabitId, update: HabitUpdate) -> RepoResult<Habit> {
        let previous = self.require_habit(id)?;
        let mut habit = previous.clone();

        if let Some(name) = update.name {
            habit.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            habit.description = description;
        }
        if let Some(frequency) = update.frequency {
            habit.frequency = frequency;
        }

        if habit.frequency == previous.frequency {
            self.habits.update_habit(&habit)?;
        } else {
            self.update_with_reindex(&previous, &habit)?;
        }

        info!("event=habit_update module=service status=ok habit_id={id}");
        Ok(habit)
    }

    /// Deletes a habit and every completion it owns.
    pub fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        self.require_habit(id)?;
        let removed = self.completions.delete_all_for(id)?;
        self.habits.delete_habit(id)?;
        info!(
            "event=habit_delete module=service status=ok habit_id={id} completions_removed={removed}"
        );
        Ok(())
    }

    pub fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        self.habits.get_habit(id)
    }

    pub fn find_habit(&self, owner: &str, name: &str) -> RepoResult<Option<Habit>> {
        self.habits.find_habit(owner, name)
    }

    /// Lists an owner's habits, oldest first.
    pub fn list_habits(&self, owner: &str) -> RepoResult<Vec<Habit>> {
        self.habits.list_habits(owner)
    }

    /// Marks `habit_id` as done on `date`.
    ///
    /// # Errors
    /// - `DuplicatePeriod` when the period containing `date` is already marked.
    /// - `Validation` when `date` precedes the habit creation date.
    pub fn mark_complete(&self, habit_id: HabitId, date: NaiveDate) -> RepoResult<Completion> {
        let habit = self.require_habit(habit_id)?;
        let completion = Completion::new(&habit, date)?;

        match self.completions.add(&completion) {
            Ok(()) => {
                info!(
                    "event=completion_mark module=service status=ok habit_id={habit_id} period_index={}",
                    completion.period_index
                );
                Ok(completion)
            }
            Err(err) => {
                warn!(
                    "event=completion_mark module=service status=rejected habit_id={habit_id} period_index={} error={err}",
                    completion.period_index
                );
                Err(err)
            }
        }
    }

    /// Lists a habit's completions, ascending by period index.
    pub fn completions(&self, habit_id: HabitId) -> RepoResult<Vec<Completion>> {
        self.require_habit(habit_id)?;
        self.completions.all_for(habit_id)
    }

    /// Administrative correction of a recorded mark date.
    ///
    /// The period index stays the key; only the recorded date changes, and
    /// it must still fall inside that period.
    ///
    /// # Errors
    /// - `MarkBeforeCreation` / `MarkOutsidePeriod` for a date that does not
    ///   map to `period_index`.
    /// - `CompletionNotFound` when the period has no completion.
    pub fn correct_completion(
        &self,
        habit_id: HabitId,
        period_index: i64,
        mark_date: NaiveDate,
    ) -> RepoResult<()> {
        let habit = self.require_habit(habit_id)?;
        let corrected = Completion::new(&habit, mark_date)?;
        if corrected.period_index != period_index {
            return Err(HabitValidationError::MarkOutsidePeriod {
                period_index,
                mark_date,
                actual: corrected.period_index,
            }
            .into());
        }

        self.completions
            .update_mark_date(habit_id, period_index, mark_date)?;
        info!(
            "event=completion_correct module=service status=ok habit_id={habit_id} period_index={period_index}"
        );
        Ok(())
    }

    /// Removes the completion recorded for one period.
    ///
    /// # Errors
    /// - `NotFound` for an unknown habit.
    /// - `CompletionNotFound` when the period has no completion.
    pub fn unmark(&self, habit_id: HabitId, period_index: i64) -> RepoResult<()> {
        self.require_habit(habit_id)?;
        match self.completions.delete(habit_id, period_index) {
            Ok(()) => {
                info!(
                    "event=completion_unmark module=service status=ok habit_id={habit_id} period_index={period_index}"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=completion_unmark module=service status=rejected habit_id={habit_id} period_index={period_index} error={err}"
                );
                Err(err)
            }
        }
    }

    fn require_habit(&self, id: HabitId) -> RepoResult<Habit> {
        self.habits.get_habit(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Stores a frequency change together with the re-derived completions.
    ///
    /// Every completion is re-derived before anything is written. If the
    /// completion swap fails after the habit row was updated, the row is
    /// restored.
    fn update_with_reindex(&self, previous: &Habit, habit: &Habit) -> RepoResult<()> {
        let (reindexed, merged) = self.reindex_completions(habit)?;

        self.habits.update_habit(habit)?;
        if let Err(err) = self.completions.replace_all_for(habit.id, &reindexed) {
            warn!(
                "event=completion_reindex module=service status=rollback habit_id={} error={err}",
                habit.id
            );
            self.habits.update_habit(previous)?;
            return Err(err);
        }

        info!(
            "event=completion_reindex module=service status=ok habit_id={} frequency={} kept={} merged={merged}",
            habit.id,
            habit.frequency.as_db_str(),
            reindexed.len()
        );
        Ok(())
    }

    /// Re-derives every completion's period index under the habit's current
    /// frequency without writing anything. When several completions land in
    /// one period, the earliest mark date is kept. Returns the new set and
    /// the number of merged records.
    fn reindex_completions(&self, habit: &Habit) -> RepoResult<(Vec<Completion>, usize)> {
        let mut existing = self.completions.all_for(habit.id)?;
        existing.sort_by_key(|completion| completion.mark_date);

        let mut by_period: BTreeMap<i64, Completion> = BTreeMap::new();
        let mut merged = 0usize;
        for previous in existing {
            let completion = Completion::new(habit, previous.mark_date)?;
            match by_period.entry(completion.period_index) {
                Entry::Vacant(slot) => {
                    slot.insert(completion);
                }
                Entry::Occupied(_) => merged += 1,
            }
        }

        Ok((by_period.into_values().collect(), merged))
    }
}
