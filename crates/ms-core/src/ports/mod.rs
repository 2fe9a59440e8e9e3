//! Port interfaces for the application layer
//!
//! Ports define the contract between the resolution engine (use cases) and
//! the host platform: its object store and query execution, its change
//! notifications, its image lookups and its action execution. The engine
//! never talks to the host platform except through these traits.

pub mod actions;
pub mod change_notification;
pub mod data_source;
pub mod errors;
pub mod marker_image;

pub use actions::{ActionContext, ActionPort};
pub use change_notification::{ChangeCallback, ChangeNotificationPort, SubscriptionTarget};
pub use data_source::{DataSourcePort, RecordQuery};
pub use errors::{ActionError, BackendError, NotificationError};
pub use marker_image::MarkerImagePort;
