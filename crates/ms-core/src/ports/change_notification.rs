//! Change notification port.
//!
//! The host platform calls back whenever an object, an entity or one
//! attribute of an object changes. Callbacks are plain synchronous closures;
//! implementations may invoke them from any thread.

use std::sync::Arc;

use async_trait::async_trait;

use super::NotificationError;
use crate::ids::{RecordId, SubscriptionHandle};

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionTarget {
    /// Lifecycle and presence of one object.
    Object { record: RecordId },
    /// Additions and removals of an entity's objects.
    Entity { entity: String },
    /// One attribute of one object.
    Attribute { record: RecordId, attribute: String },
}

pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait ChangeNotificationPort: Send + Sync {
    /// Register interest in `target`; `on_change` fires on every change.
    async fn subscribe(
        &self,
        target: SubscriptionTarget,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, NotificationError>;

    /// Release a handle. Releasing an unknown handle is a no-op.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}
