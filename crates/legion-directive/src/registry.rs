//! Directive registry with exactly-once consumption semantics
//!
//! Payloads are kept in three independent moka stores, one per stored
//! directive shape, type-erased behind `Arc<dyn Any>` and recovered by the
//! typed reference used to access them. Every mutation of a key runs inside
//! an async exclusive section taken from a lock cache whose idle locks are
//! reclaimed by moka. Stored directives themselves expire after a window of
//! inactivity so abandoned payloads never accumulate.

use crate::config::RegistryConfig;
use crate::directive::{Directive, ListReference, QueueReference, SingleUseReference};
use crate::feedback::{DirectiveFeedback, FeedbackProducer};
use crate::key::DirectiveKey;
use moka::future::Cache;
use std::any::{type_name, Any};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace, warn};

type ErasedPayload = Arc<dyn Any + Send + Sync>;

/// Entry counts of the registry stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Stored single-use directives
    pub single_use: u64,
    /// Stored, not yet drained queue directives
    pub queues: u64,
    /// Stored list directives
    pub lists: u64,
    /// Live per-key locks
    pub locks: u64,
}

struct QueueSlot<T> {
    state: parking_lot::Mutex<QueueState<T>>,
}

struct QueueState<T> {
    values: VecDeque<T>,
    started: bool,
}

/// Outcome of one pop on a queue slot
struct Popped<T> {
    value: T,
    first: bool,
    drained: bool,
}

impl<T> QueueSlot<T> {
    fn new(values: VecDeque<T>) -> Self {
        Self {
            state: parking_lot::Mutex::new(QueueState {
                values,
                started: false,
            }),
        }
    }

    fn pop(&self) -> Option<Popped<T>> {
        let mut state = self.state.lock();
        let value = state.values.pop_front()?;
        let first = !state.started;
        state.started = true;
        Some(Popped {
            value,
            first,
            drained: state.values.is_empty(),
        })
    }
}

/// Local store of directive payloads
///
/// Cheap to clone; clones share the same stores, locks and feedback producer.
#[derive(Debug, Clone)]
pub struct DirectiveRegistry {
    single_use: Cache<DirectiveKey, ErasedPayload>,
    queues: Cache<DirectiveKey, ErasedPayload>,
    lists: Cache<DirectiveKey, ErasedPayload>,
    locks: Cache<DirectiveKey, Arc<Mutex<()>>>,
    feedback: Arc<dyn FeedbackProducer>,
}

impl DirectiveRegistry {
    /// Create new registry with default configuration
    #[must_use]
    pub fn new(feedback: Arc<dyn FeedbackProducer>) -> Self {
        Self::with_config(RegistryConfig::default(), feedback)
    }

    /// Create registry with explicit store tuning
    #[must_use]
    pub fn with_config(config: RegistryConfig, feedback: Arc<dyn FeedbackProducer>) -> Self {
        let store = || {
            Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_idle(config.entry_idle())
                .build()
        };

        Self {
            single_use: store(),
            queues: store(),
            lists: store(),
            locks: Cache::builder().time_to_idle(config.lock_idle()).build(),
            feedback,
        }
    }

    /// Store the payload of a directive
    ///
    /// Descriptive directives carry nothing to store and are ignored. Saving
    /// a key that is already present keeps the stored entry untouched, and an
    /// empty queue is not stored at all.
    pub async fn save<T>(&self, directive: impl Into<Directive<T>>)
    where
        T: Send + Sync + 'static,
    {
        match directive.into() {
            Directive::Descriptive(d) => {
                trace!(key = %d.key(), "descriptive directive is not stored");
            }
            Directive::SingleUse(d) => {
                let (key, value) = d.into_parts();
                let payload: ErasedPayload = Arc::new(value);
                insert_absent(&self.single_use, key, payload, "single-use").await;
            }
            Directive::Queue(d) => {
                let (key, values) = d.into_parts();
                if values.is_empty() {
                    debug!(%key, "empty queue directive is not stored");
                    return;
                }
                let payload: ErasedPayload = Arc::new(QueueSlot::new(values));
                insert_absent(&self.queues, key, payload, "queue").await;
            }
            Directive::List(d) => {
                let (key, values) = d.into_parts();
                let payload: ErasedPayload = Arc::new(values);
                insert_absent(&self.lists, key, payload, "list").await;
            }
        }
    }

    /// Remove and return the head of a queue directive
    ///
    /// The first successful pop publishes `IN_PROGRESS`; the pop that drains
    /// the queue evicts it and publishes `COMPLETED`. Unknown or drained
    /// queues yield `None` without feedback.
    pub async fn pop<T>(&self, reference: &QueueReference<T>) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        let key = reference.key();
        let _guard = self.lock(key).await;

        let erased = self.queues.get(key).await?;
        let Ok(slot) = erased.downcast::<QueueSlot<T>>() else {
            warn!(%key, expected = type_name::<T>(), "queue directive holds another payload type");
            return None;
        };

        let popped = slot.pop()?;
        if popped.first {
            self.publish(DirectiveFeedback::in_progress(key.clone())).await;
        }
        if popped.drained {
            self.queues.invalidate(key).await;
            debug!(%key, "queue directive drained");
            self.publish(DirectiveFeedback::completed(key.clone())).await;
        }
        Some(popped.value)
    }

    /// Read the whole sequence of a list directive, empty when unknown
    pub async fn list<T>(&self, reference: &ListReference<T>) -> Vec<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = reference.key();
        let Some(erased) = self.lists.get(key).await else {
            return Vec::new();
        };
        if let Some(values) = erased.downcast_ref::<Vec<T>>() {
            values.clone()
        } else {
            warn!(%key, expected = type_name::<T>(), "list directive holds another payload type");
            Vec::new()
        }
    }

    /// Take the value of a single-use directive
    ///
    /// Exactly one caller ever observes the value; it is evicted in the same
    /// exclusive section that returns it.
    pub async fn read<T>(&self, reference: &SingleUseReference<T>) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = reference.key();
        let _guard = self.lock(key).await;

        let erased = self.single_use.get(key).await?;
        if !erased.is::<T>() {
            warn!(%key, expected = type_name::<T>(), "single-use directive holds another payload type");
            return None;
        }
        drop(erased);

        let value = self.single_use.remove(key).await?.downcast::<T>().ok()?;
        Some(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Current store sizes
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            single_use: self.single_use.entry_count(),
            queues: self.queues.entry_count(),
            lists: self.lists.entry_count(),
            locks: self.locks.entry_count(),
        }
    }

    /// Apply pending evictions so that [`stats`](Self::stats) is exact
    pub async fn run_pending_tasks(&self) {
        self.single_use.run_pending_tasks().await;
        self.queues.run_pending_tasks().await;
        self.lists.run_pending_tasks().await;
        self.locks.run_pending_tasks().await;
    }

    async fn lock(&self, key: &DirectiveKey) -> OwnedMutexGuard<()> {
        self.locks
            .get_with(key.clone(), async { Arc::new(Mutex::new(())) })
            .await
            .lock_owned()
            .await
    }

    async fn publish(&self, feedback: DirectiveFeedback) {
        let directive_key = feedback.directive_key.clone();
        let status = feedback.status;
        if let Err(e) = self.feedback.publish(feedback).await {
            warn!(key = %directive_key, ?status, error = %e, "failed to publish directive feedback");
        }
    }
}

async fn insert_absent(
    store: &Cache<DirectiveKey, ErasedPayload>,
    key: DirectiveKey,
    payload: ErasedPayload,
    shape: &'static str,
) {
    let entry = store
        .entry(key)
        .or_insert_with(async move { payload })
        .await;
    if entry.is_fresh() {
        debug!(key = %entry.key(), shape, "directive saved");
    } else {
        debug!(key = %entry.key(), shape, "directive already saved, keeping existing entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DescriptiveDirective, ListDirective, QueueDirective, SingleUseDirective};
    use crate::feedback::{ChannelFeedbackProducer, FeedbackStatus};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn registry() -> (DirectiveRegistry, UnboundedReceiver<DirectiveFeedback>) {
        let (producer, receiver) = ChannelFeedbackProducer::new();
        (DirectiveRegistry::new(Arc::new(producer)), receiver)
    }

    fn drain(receiver: &mut UnboundedReceiver<DirectiveFeedback>) -> Vec<FeedbackStatus> {
        let mut statuses = Vec::new();
        while let Ok(feedback) = receiver.try_recv() {
            statuses.push(feedback.status);
        }
        statuses
    }

    #[tokio::test]
    async fn single_value_queue_reports_both_boundaries_on_one_pop() {
        let (registry, mut feedback) = registry();
        let directive = QueueDirective::new(["only"]);
        let reference = directive.to_reference();
        registry.save(directive).await;

        assert_eq!(registry.pop(&reference).await, Some("only"));
        assert_eq!(registry.pop(&reference).await, None);
        assert_eq!(
            drain(&mut feedback),
            vec![FeedbackStatus::InProgress, FeedbackStatus::Completed]
        );
    }

    #[tokio::test]
    async fn unknown_queue_pops_nothing_and_stays_silent() {
        let (registry, mut feedback) = registry();
        let reference = QueueReference::<u32>::new(DirectiveKey::generate());

        assert_eq!(registry.pop(&reference).await, None);
        assert!(drain(&mut feedback).is_empty());
    }

    #[tokio::test]
    async fn empty_queue_is_not_stored() {
        let (registry, mut feedback) = registry();
        let directive = QueueDirective::<u32>::new([]);
        let reference = directive.to_reference();
        registry.save(directive).await;

        assert_eq!(registry.pop(&reference).await, None);
        assert!(drain(&mut feedback).is_empty());
    }

    #[tokio::test]
    async fn saving_an_existing_key_keeps_the_first_payload() {
        let (registry, _feedback) = registry();
        let key = DirectiveKey::from("dup");
        registry.save(ListDirective::with_key(key.clone(), [1, 2])).await;
        registry.save(ListDirective::with_key(key.clone(), [9])).await;

        let values = registry.list(&ListReference::<i32>::new(key)).await;
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn descriptive_directive_is_ignored() {
        let (registry, _feedback) = registry();
        registry.save::<u8>(DescriptiveDirective::new()).await;
        registry.run_pending_tasks().await;

        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[tokio::test]
    async fn single_use_is_read_once() {
        let (registry, _feedback) = registry();
        let directive = SingleUseDirective::new(String::from("payload"));
        let reference = directive.to_reference();
        registry.save(directive).await;

        assert_eq!(registry.read(&reference).await.as_deref(), Some("payload"));
        assert_eq!(registry.read(&reference).await, None);
    }

    #[tokio::test]
    async fn mismatched_payload_type_yields_nothing_and_keeps_entry() {
        let (registry, _feedback) = registry();
        let key = DirectiveKey::from("typed");
        registry.save(SingleUseDirective::with_key(key.clone(), 7_u32)).await;

        assert_eq!(registry.read(&SingleUseReference::<String>::new(key.clone())).await, None);
        assert_eq!(registry.read(&SingleUseReference::<u32>::new(key)).await, Some(7));
    }

    #[tokio::test]
    async fn stats_track_stores() {
        let (registry, _feedback) = registry();
        registry.save(SingleUseDirective::new(1_u8)).await;
        registry.save(QueueDirective::new([1_u8, 2])).await;
        registry.save(ListDirective::new([1_u8])).await;
        registry.run_pending_tasks().await;

        let stats = registry.stats();
        assert_eq!((stats.single_use, stats.queues, stats.lists), (1, 1, 1));
    }
}
