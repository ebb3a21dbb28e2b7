//! Domain layer for Pillwatch.
//!
//! This crate contains:
//! - Domain models (beacon observations, mappings, medication entries, alerts)
//! - Business logic services (discovery, stores, reminders, adherence monitor)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
