//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and engine calls into use-case level APIs.
//! - Receive stores by injection; no service owns global state.

pub mod habit_service;
pub mod progress_service;
