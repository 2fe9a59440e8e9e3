use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ms_core::ids::SubscriptionHandle;
use ms_core::ports::{ChangeCallback, ChangeNotificationPort, NotificationError, SubscriptionTarget};
use tracing::{debug, trace};

use super::lock;

/// In-memory change notification implementation.
///
/// 内存版的变更通知实现。
///
/// Callbacks are invoked on the thread that calls [`notify`](Self::notify),
/// after the handle table lock is released.
pub struct InMemoryChangeNotifier {
    next_handle: AtomicU64,
    subscriptions: Mutex<HashMap<SubscriptionHandle, (SubscriptionTarget, ChangeCallback)>>,
    rejecting: AtomicBool,
}

impl Default for InMemoryChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChangeNotifier {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            subscriptions: Mutex::new(HashMap::new()),
            rejecting: AtomicBool::new(false),
        }
    }

    /// Make subsequent `subscribe` calls fail (simulates a backend refusing registrations).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Fire every subscription listening to one of `targets`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, targets: &[SubscriptionTarget]) -> usize {
        let callbacks: Vec<ChangeCallback> = lock(&self.subscriptions)
            .values()
            .filter(|(target, _)| targets.contains(target))
            .map(|(_, callback)| callback.clone())
            .collect();

        trace!(targets = targets.len(), fired = callbacks.len(), "Dispatching change notifications");
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn live_handle_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Targets of all live subscriptions, in no particular order.
    pub fn live_targets(&self) -> Vec<SubscriptionTarget> {
        lock(&self.subscriptions)
            .values()
            .map(|(target, _)| target.clone())
            .collect()
    }
}

#[async_trait]
impl ChangeNotificationPort for InMemoryChangeNotifier {
    async fn subscribe(
        &self,
        target: SubscriptionTarget,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, NotificationError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected(format!("{target:?}")));
        }
        let handle = SubscriptionHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        debug!(handle = %handle, target = ?target, "Subscription registered");
        lock(&self.subscriptions).insert(handle, (target, on_change));
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        if lock(&self.subscriptions).remove(&handle).is_some() {
            debug!(handle = %handle, "Subscription released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::ids::RecordId;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counter() -> (ChangeCallback, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let callback: ChangeCallback = Arc::new(move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        (callback, hits)
    }

    #[tokio::test]
    async fn test_notify_fires_only_matching_targets() {
        let notifier = InMemoryChangeNotifier::new();
        let (shop_cb, shop_hits) = counter();
        let (owner_cb, owner_hits) = counter();
        notifier
            .subscribe(
                SubscriptionTarget::Entity {
                    entity: "Shop".to_string(),
                },
                shop_cb,
            )
            .await
            .unwrap();
        notifier
            .subscribe(
                SubscriptionTarget::Object {
                    record: RecordId::from("owner-1"),
                },
                owner_cb,
            )
            .await
            .unwrap();

        let fired = notifier.notify(&[SubscriptionTarget::Entity {
            entity: "Shop".to_string(),
        }]);

        assert_eq!(fired, 1);
        assert_eq!(shop_hits.load(Ordering::SeqCst), 1);
        assert_eq!(owner_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsubscribed_handle_no_longer_fires() {
        let notifier = InMemoryChangeNotifier::new();
        let (callback, hits) = counter();
        let target = SubscriptionTarget::Entity {
            entity: "Shop".to_string(),
        };
        let handle = notifier.subscribe(target.clone(), callback).await.unwrap();

        notifier.unsubscribe(handle);
        notifier.unsubscribe(handle);
        notifier.notify(&[target]);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.live_handle_count(), 0);
    }

    #[tokio::test]
    async fn test_rejecting_notifier_refuses_registration() {
        let notifier = InMemoryChangeNotifier::new();
        notifier.set_rejecting(true);
        let (callback, _) = counter();

        let result = notifier
            .subscribe(
                SubscriptionTarget::Entity {
                    entity: "Shop".to_string(),
                },
                callback,
            )
            .await;

        assert!(matches!(result, Err(NotificationError::Rejected(_))));
        assert_eq!(notifier.live_handle_count(), 0);
    }
}
