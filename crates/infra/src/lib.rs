//! Infrastructure layer: backend adapters, notification delivery, the alert
//! scheduler and the interactive detail-view coordinator.

pub mod backend;
pub mod clock;
pub mod config;
pub mod detail;
pub mod notify;
pub mod scheduler;
pub mod session;

pub use backend::{FetchError, InMemoryItemStore, ItemSource, ItemStore, JsonFileItemSource};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, SchedulerConfig};
pub use detail::{DetailError, DetailView, Feedback, InMemoryFeedback, ItemDetail, Navigation, Toast};
pub use notify::{
    GatedSink, InMemoryNotificationSink, Notification, NotificationPermission, NotificationSink,
    TracingNotificationSink,
};
pub use scheduler::{NotificationScheduler, PassResult};
pub use session::{CurrentUser, SessionBinder, SessionTransition};
