//! Core domain logic for habit tracking.
//!
//! The period-accounting engine maps calendar dates onto per-habit period
//! indices and derives availability, streaks and completion percentages from
//! the completions recorded for those indices.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, TrackerConfig};
pub use engine::{
    period_index, period_start, AvailabilityEngine, PercentageCalculator, ProgressReport,
    ReportBuilder, StreakCounter,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::completion::Completion;
pub use model::habit::{Frequency, Habit, HabitId, HabitValidationError};
pub use repo::completion_store::{CompletionStore, SqliteCompletionStore};
pub use repo::habit_repo::{HabitRepository, SqliteHabitRepository};
pub use repo::memory_store::MemoryCompletionStore;
pub use repo::{RepoError, RepoResult};
pub use service::habit_service::{HabitService, HabitUpdate};
pub use service::progress_service::ProgressService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
