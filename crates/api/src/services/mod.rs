//! Runtime services: coordination, session lifecycle, notification delivery
//! and radio drivers.

pub mod notification_center;
pub mod radio;
pub mod session;
pub mod tracker;

pub use notification_center::{
    sink_from_config, ConsoleSink, NotificationCenter, NotificationSink, PendingNotification,
    WebhookSink,
};
pub use session::{MonitoringSession, MonitoringStatusResponse};
pub use tracker::Tracker;
