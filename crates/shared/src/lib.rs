//! Shared utilities and common types for Pillwatch.
//!
//! This crate provides common functionality used across all other crates:
//! - Box-number and beacon-id validation
//! - Wall-clock helpers for time-of-day schedules

pub mod clock;
pub mod validation;
