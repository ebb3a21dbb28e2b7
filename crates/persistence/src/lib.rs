//! Persistence layer for Pillwatch.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database rows and persisted JSON records)
//! - Repository implementations for the two fixed storage keys

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

pub use error::PersistenceError;
