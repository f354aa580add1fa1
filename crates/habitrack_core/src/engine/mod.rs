//! Period-accounting engine.
//!
//! # Responsibility
//! - Convert calendar dates into per-habit period indices.
//! - Derive availability, streak and completion percentage from the set of
//!   period indices held by a `CompletionStore`.
//!
//! # Invariants
//! - Engines are stateless; every result is a function of the habit, the
//!   caller-supplied `today`, and the store contents.
//! - Ordering is always by period index, never by retrieval order.
//! - Missing completions degrade to base cases, never to errors.

pub mod availability;
pub mod percentage;
pub mod period;
pub mod report;
pub mod streak;

pub use availability::AvailabilityEngine;
pub use percentage::PercentageCalculator;
pub use period::{period_index, period_start};
pub use report::{ProgressReport, ReportBuilder};
pub use streak::StreakCounter;
