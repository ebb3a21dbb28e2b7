//! Domain services for Pillwatch.
//!
//! Services contain business logic that operates on domain models.

pub mod adherence;
pub mod discovery;
pub mod mapping_store;
pub mod notification;
pub mod reminders;
pub mod schedule_store;

pub use adherence::{classify, AdherenceMonitor, Evaluation, WrongBoxEvent};
pub use discovery::{AdvertisementOutcome, BeaconDiscovery};
pub use mapping_store::MappingStore;
pub use notification::{
    MockNotificationSurface, NotificationError, NotificationRequest, NotificationSurface, Trigger,
};
pub use reminders::ReminderScheduler;
pub use schedule_store::ScheduleStore;
