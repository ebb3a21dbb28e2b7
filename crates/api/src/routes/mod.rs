//! HTTP route handlers.

pub mod alert;
pub mod beacons;
pub mod health;
pub mod mappings;
pub mod medications;
pub mod monitoring;
pub mod notifications;
pub mod schedule;
