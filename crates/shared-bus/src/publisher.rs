//! # Producer Handles
//!
//! The publishing side of a channel.

use crate::channel::Channel;
use crate::errors::ChannelError;
use crate::events::ChannelEvent;
use crate::release::{Closeable, ReleaseGuard};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Publishes `T` values to one channel, optionally on a fixed topic.
///
/// Handles are independent: any number may publish to the same channel, and
/// releasing one leaves the others untouched.
pub struct ProducerHandle<T> {
    channel: Arc<Channel>,
    topic: Option<String>,
    id: u64,
    sequence: AtomicU64,
    release: ReleaseGuard,
    _payload: PhantomData<fn(T)>,
}

impl<T: Serialize> ProducerHandle<T> {
    pub(crate) fn new(channel: Arc<Channel>, topic: Option<String>, id: u64) -> Self {
        Self {
            channel,
            topic,
            id,
            sequence: AtomicU64::new(0),
            release: ReleaseGuard::default(),
            _payload: PhantomData,
        }
    }

    /// Publish one event.
    ///
    /// # Returns
    ///
    /// The number of subscribers and consumers the event reached.
    pub fn publish(&self, payload: &T) -> Result<usize, ChannelError> {
        if self.release.is_released() {
            return Err(ChannelError::Released {
                channel: self.channel.name().to_string(),
            });
        }

        let payload = serde_json::to_value(payload).map_err(|e| ChannelError::Payload {
            channel: self.channel.name().to_string(),
            type_name: std::any::type_name::<T>(),
            reason: e.to_string(),
        })?;

        let event = ChannelEvent {
            channel: self.channel.name().to_string(),
            topic: self.topic.clone(),
            producer: self.id,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            payload,
        };

        let delivered = self.channel.dispatch(&event)?;
        trace!(
            channel = %event.channel,
            topic = ?event.topic,
            sequence = event.sequence,
            delivered,
            "Event published"
        );
        Ok(delivered)
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        self.channel.name()
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Events published through this handle so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl<T> Closeable for ProducerHandle<T> {
    fn release(&self) -> bool {
        self.release.fire(|| {
            debug!(channel = %self.channel.name(), producer = self.id, "Producer released");
        })
    }
}

impl<T> std::fmt::Debug for ProducerHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("channel", &self.channel.name())
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::ChannelRuntime;
    use crate::{ChannelError, Closeable};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u64,
    }

    #[test]
    fn test_publish_no_receivers() {
        let runtime = ChannelRuntime::new();
        let producer = runtime.producer::<Order>("orders", None).unwrap();

        assert_eq!(producer.publish(&Order { id: 1 }).unwrap(), 0);
        assert_eq!(producer.published(), 1);
    }

    #[test]
    fn test_independent_producers() {
        let runtime = ChannelRuntime::new();
        let first = runtime.producer::<Order>("orders", None).unwrap();
        let second = runtime.producer::<Order>("orders", None).unwrap();
        let received = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _sub = runtime
            .subscribe::<Order, _>("orders", "audit", None, move |order| sink.lock().push(order.id))
            .unwrap();

        assert!(runtime.close(&first));
        assert!(matches!(
            first.publish(&Order { id: 1 }),
            Err(ChannelError::Released { .. })
        ));
        assert_eq!(second.publish(&Order { id: 2 }).unwrap(), 1);
        assert_eq!(*received.lock(), vec![2]);
        assert!(!first.release());
    }

    #[test]
    fn test_producer_ids_are_distinct() {
        let runtime = ChannelRuntime::new();
        let a = runtime.producer::<Order>("orders", None).unwrap();
        let b = runtime.producer::<Order>("orders", Some("created")).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.topic(), Some("created"));
        assert_eq!(b.channel(), "orders");
    }
}
