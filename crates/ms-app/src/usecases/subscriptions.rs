//! Subscription manager
//!
//! 订阅管理器：为当前锚点记录和数据源描述维护一代（generation）变更订阅。
//!
//! # State machine / 状态机
//!
//! ```text
//!            reconcile(anchor, descriptors)          reconcile(None, _) / release_all
//!   Idle ─────────────────────────────────> Subscribed ─────────────────────────────> Idle
//!                                              │  ▲
//!                                              └──┘ anchor or descriptor set changed:
//!                                                   release every handle, then register anew
//! ```
//!
//! A generation is replaced wholesale. Callbacks carry the id of the
//! generation that registered them, so the owner can ignore notifications
//! from a superseded generation whose handles are already released.

use std::sync::Arc;

use ms_core::ids::{GenerationId, RecordId, SubscriptionHandle};
use ms_core::location::{DescriptorFingerprint, LocationSourceDescriptor};
use ms_core::ports::{ChangeCallback, ChangeNotificationPort, NotificationError, SubscriptionTarget};
use ms_core::record::RecordRef;
use tracing::{debug, info, info_span, warn, Instrument};

/// Receives the generation id of every change notification.
pub type GenerationSink = Arc<dyn Fn(GenerationId) + Send + Sync>;

/// The live subscriptions tied to one anchor + descriptor-set combination.
#[derive(Debug)]
pub struct Generation {
    id: GenerationId,
    anchor: RecordId,
    handles: Vec<SubscriptionHandle>,
}

impl Generation {
    pub fn id(&self) -> GenerationId {
        self.id
    }

    pub fn anchor(&self) -> &RecordId {
        &self.anchor
    }

    pub fn handles(&self) -> &[SubscriptionHandle] {
        &self.handles
    }
}

/// Inputs a generation was built from; `None` anchor means Idle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GenerationKey {
    anchor: Option<RecordId>,
    fingerprint: DescriptorFingerprint,
}

pub struct SubscriptionManager {
    notifier: Arc<dyn ChangeNotificationPort>,
    sink: GenerationSink,
    current: Option<Generation>,
    applied: Option<GenerationKey>,
    next_id: GenerationId,
}

impl SubscriptionManager {
    pub fn new(notifier: Arc<dyn ChangeNotificationPort>, sink: GenerationSink) -> Self {
        Self {
            notifier,
            sink,
            current: None,
            applied: None,
            next_id: GenerationId::first(),
        }
    }

    pub fn current(&self) -> Option<&Generation> {
        self.current.as_ref()
    }

    /// Whether `generation` is the live one.
    pub fn is_current(&self, generation: GenerationId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.id == generation)
    }

    pub fn live_handle_count(&self) -> usize {
        self.current
            .as_ref()
            .map_or(0, |generation| generation.handles.len())
    }

    /// Bring subscriptions in line with `anchor` and `descriptors`.
    ///
    /// Returns `Ok(true)` when the previous generation was replaced. Unchanged
    /// inputs are a no-op. On a registration failure every handle registered
    /// so far is released and the manager is left Idle.
    pub async fn reconcile(
        &mut self,
        anchor: Option<&RecordRef>,
        descriptors: &[Arc<LocationSourceDescriptor>],
    ) -> Result<bool, NotificationError> {
        let key = GenerationKey {
            anchor: anchor.map(|record| record.id().clone()),
            fingerprint: DescriptorFingerprint::of(descriptors),
        };
        if self.applied.as_ref() == Some(&key) {
            return Ok(false);
        }

        self.release_all();

        if let Some(anchor) = anchor.filter(|_| !descriptors.is_empty()) {
            let generation = self.register(anchor, descriptors).await?;
            self.current = Some(generation);
        }

        self.applied = Some(key);
        Ok(true)
    }

    /// Release every handle of the current generation and go Idle.
    pub fn release_all(&mut self) {
        self.applied = None;
        if let Some(generation) = self.current.take() {
            debug!(
                generation = %generation.id,
                handles = generation.handles.len(),
                "Releasing subscription generation"
            );
            for handle in generation.handles {
                self.notifier.unsubscribe(handle);
            }
        }
    }

    async fn register(
        &mut self,
        anchor: &RecordRef,
        descriptors: &[Arc<LocationSourceDescriptor>],
    ) -> Result<Generation, NotificationError> {
        let id = self.next_id;
        self.next_id = id.next();

        let span = info_span!(
            "usecase.subscriptions.register",
            generation = %id,
            anchor = %anchor.id(),
        );

        async {
            let targets = subscription_targets(anchor.id(), descriptors);
            let sink = self.sink.clone();
            let on_change: ChangeCallback = Arc::new(move || sink(id));

            let mut handles = Vec::with_capacity(targets.len());
            for target in targets {
                match self.notifier.subscribe(target, on_change.clone()).await {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        warn!(error = %err, "Subscription failed, releasing partial generation");
                        for handle in handles {
                            self.notifier.unsubscribe(handle);
                        }
                        return Err(err);
                    }
                }
            }

            info!(handles = handles.len(), "Subscription generation registered");
            Ok(Generation {
                id,
                anchor: anchor.id().clone(),
                handles,
            })
        }
        .instrument(span)
        .await
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Anchor presence, then per descriptor its entity and its tracked
/// attributes scoped to the anchor.
fn subscription_targets(
    anchor: &RecordId,
    descriptors: &[Arc<LocationSourceDescriptor>],
) -> Vec<SubscriptionTarget> {
    let mut targets = vec![SubscriptionTarget::Object {
        record: anchor.clone(),
    }];
    for descriptor in descriptors {
        if let Some(entity) = descriptor.source.entity() {
            targets.push(SubscriptionTarget::Entity {
                entity: entity.to_string(),
            });
        }
        for attribute in descriptor.tracked_attributes() {
            targets.push(SubscriptionTarget::Attribute {
                record: anchor.clone(),
                attribute: attribute.to_string(),
            });
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ms_core::location::{CoordinateAttributes, LocationSource, MarkerImage};
    use ms_core::record::Record;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Subscribe(SubscriptionHandle, SubscriptionTarget),
        Unsubscribe(SubscriptionHandle),
    }

    /// Mock ChangeNotificationPort keeping an ordered operation log
    #[derive(Default)]
    struct MockNotifier {
        next: AtomicU64,
        log: Mutex<Vec<Op>>,
        live: Mutex<HashMap<SubscriptionHandle, ChangeCallback>>,
        fail_after: Option<usize>,
    }

    impl MockNotifier {
        fn ops(&self) -> Vec<Op> {
            self.log.lock().unwrap().clone()
        }

        fn live_count(&self) -> usize {
            self.live.lock().unwrap().len()
        }

        fn fire_all(&self) {
            let callbacks: Vec<ChangeCallback> = self.live.lock().unwrap().values().cloned().collect();
            for callback in callbacks {
                callback();
            }
        }
    }

    #[async_trait]
    impl ChangeNotificationPort for MockNotifier {
        async fn subscribe(
            &self,
            target: SubscriptionTarget,
            on_change: ChangeCallback,
        ) -> Result<SubscriptionHandle, NotificationError> {
            let mut live = self.live.lock().unwrap();
            if self.fail_after == Some(live.len()) {
                return Err(NotificationError::Rejected("quota".to_string()));
            }
            let handle = SubscriptionHandle::new(self.next.fetch_add(1, Ordering::SeqCst));
            live.insert(handle, on_change);
            self.log.lock().unwrap().push(Op::Subscribe(handle, target));
            Ok(handle)
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            self.live.lock().unwrap().remove(&handle);
            self.log.lock().unwrap().push(Op::Unsubscribe(handle));
        }
    }

    fn descriptors() -> Vec<Arc<LocationSourceDescriptor>> {
        vec![
            Arc::new(
                LocationSourceDescriptor::new(LocationSource::Query {
                    entity: "Shop".to_string(),
                    constraint: String::new(),
                    coordinates: CoordinateAttributes::new("Lat", "Lng"),
                })
                .with_marker(MarkerImage::Attribute {
                    attribute: "Icon".to_string(),
                }),
            ),
            Arc::new(LocationSourceDescriptor::new(LocationSource::Static {
                latitude: "1".to_string(),
                longitude: "2".to_string(),
            })),
        ]
    }

    fn anchor(id: &str) -> RecordRef {
        Record::new(id, "Owner").into_ref()
    }

    fn recording_sink() -> (GenerationSink, Arc<Mutex<Vec<GenerationId>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: GenerationSink = Arc::new(move |generation| sink_seen.lock().unwrap().push(generation));
        (sink, seen)
    }

    #[tokio::test]
    async fn test_no_anchor_means_no_subscriptions() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        let changed = manager.reconcile(None, &descriptors()).await.unwrap();

        assert!(changed);
        assert!(manager.current().is_none());
        assert!(notifier.ops().is_empty());
    }

    #[tokio::test]
    async fn test_registers_anchor_entity_and_attribute_targets() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        manager
            .reconcile(Some(&anchor("owner-1")), &descriptors())
            .await
            .unwrap();

        let targets: Vec<SubscriptionTarget> = notifier
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Subscribe(_, target) => Some(target),
                Op::Unsubscribe(_) => None,
            })
            .collect();
        let owner = RecordId::from("owner-1");
        assert_eq!(
            targets,
            vec![
                SubscriptionTarget::Object {
                    record: owner.clone()
                },
                SubscriptionTarget::Entity {
                    entity: "Shop".to_string()
                },
                SubscriptionTarget::Attribute {
                    record: owner.clone(),
                    attribute: "Lat".to_string()
                },
                SubscriptionTarget::Attribute {
                    record: owner.clone(),
                    attribute: "Lng".to_string()
                },
                SubscriptionTarget::Attribute {
                    record: owner,
                    attribute: "Icon".to_string()
                },
            ]
        );
        assert_eq!(manager.live_handle_count(), 5);
    }

    #[tokio::test]
    async fn test_unchanged_inputs_do_not_rebuild() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);
        let anchor = anchor("owner-1");

        assert!(manager.reconcile(Some(&anchor), &descriptors()).await.unwrap());
        let ops_before = notifier.ops().len();
        assert!(!manager.reconcile(Some(&anchor), &descriptors()).await.unwrap());

        assert_eq!(notifier.ops().len(), ops_before);
    }

    #[tokio::test]
    async fn test_anchor_change_releases_before_registering() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        manager
            .reconcile(Some(&anchor("owner-1")), &descriptors())
            .await
            .unwrap();
        let old_handles = manager.current().unwrap().handles().to_vec();
        let old_generation = manager.current().unwrap().id();

        manager
            .reconcile(Some(&anchor("owner-2")), &descriptors())
            .await
            .unwrap();

        let ops = notifier.ops();
        let release_start = old_handles.len();
        let register_start = release_start + old_handles.len();
        for (op, handle) in ops[release_start..register_start].iter().zip(&old_handles) {
            assert_eq!(op, &Op::Unsubscribe(*handle));
        }
        assert!(matches!(
            ops[register_start],
            Op::Subscribe(_, SubscriptionTarget::Object { .. })
        ));
        assert_eq!(notifier.live_count(), old_handles.len());
        assert!(!manager.is_current(old_generation));
        assert_eq!(manager.current().unwrap().anchor().as_ref(), "owner-2");
    }

    #[tokio::test]
    async fn test_callbacks_report_their_generation() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, seen) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        manager
            .reconcile(Some(&anchor("owner-1")), &descriptors())
            .await
            .unwrap();
        let generation = manager.current().unwrap().id();
        notifier.fire_all();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|id| *id == generation));
    }

    #[tokio::test]
    async fn test_release_all_leaves_no_live_handles() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        manager
            .reconcile(Some(&anchor("owner-1")), &descriptors())
            .await
            .unwrap();
        manager.release_all();

        assert_eq!(notifier.live_count(), 0);
        assert_eq!(manager.live_handle_count(), 0);
        assert!(manager.current().is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_handles() {
        let notifier = Arc::new(MockNotifier::default());
        let (sink, _) = recording_sink();
        {
            let mut manager = SubscriptionManager::new(notifier.clone(), sink);
            manager
                .reconcile(Some(&anchor("owner-1")), &descriptors())
                .await
                .unwrap();
            assert_eq!(notifier.live_count(), 5);
        }
        assert_eq!(notifier.live_count(), 0);
    }

    #[tokio::test]
    async fn test_registration_failure_releases_partial_generation() {
        let notifier = Arc::new(MockNotifier {
            fail_after: Some(2),
            ..MockNotifier::default()
        });
        let (sink, _) = recording_sink();
        let mut manager = SubscriptionManager::new(notifier.clone(), sink);

        let result = manager
            .reconcile(Some(&anchor("owner-1")), &descriptors())
            .await;

        assert!(matches!(result, Err(NotificationError::Rejected(_))));
        assert_eq!(notifier.live_count(), 0);
        assert!(manager.current().is_none());
    }
}
