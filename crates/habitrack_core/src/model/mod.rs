//! Habit domain model.
//!
//! # Responsibility
//! - Define the habit and completion records shared by repositories, engines
//!   and services.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every habit is identified by a stable, non-nil `HabitId`.
//! - A completion never owns its habit; it only carries the habit id.
//! - A habit's creation date never changes after construction.

pub mod completion;
pub mod habit;
