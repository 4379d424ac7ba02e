//! # Channel
//!
//! A single named channel: its topic set, its push subscribers keyed by
//! subscriber id, and the sinks of its pull consumers.
//!
//! Subscriber and consumer tables sit behind reader/writer locks. Publishing
//! only reads them; subscribe, unsubscribe and close take the write side.

use crate::errors::ChannelError;
use crate::events::{ChannelEvent, TopicFilter};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No channel with this name exists yet.
    Uncreated,
    /// Accepting producers, consumers and subscribers.
    Active,
    /// Terminal. Every handle fails with `ChannelError::Closed`.
    Closed,
}

const ACTIVE: u8 = 1;
const CLOSED: u8 = 2;

pub(crate) type Callback = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

struct SubscriberEntry {
    subscriber_id: String,
    registration: u64,
    filter: TopicFilter,
    callback: Callback,
}

struct ConsumerSink {
    filter: TopicFilter,
    sender: mpsc::UnboundedSender<ChannelEvent>,
}

/// Deployment a channel is released with.
#[derive(Debug, Clone)]
struct Ownership {
    deployment: String,
    /// False when the channel was only attributed on first use.
    declared: bool,
}

/// A named publish/subscribe endpoint.
pub struct Channel {
    name: String,
    state: AtomicU8,
    topics: RwLock<BTreeSet<String>>,
    owner: RwLock<Option<Ownership>>,
    subscribers: RwLock<Vec<SubscriberEntry>>,
    consumers: RwLock<HashMap<u64, ConsumerSink>>,
    registrations: AtomicU64,
    published: AtomicU64,
}

impl Channel {
    pub(crate) fn new(name: &str, topics: BTreeSet<String>, owner: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            state: AtomicU8::new(ACTIVE),
            topics: RwLock::new(topics),
            owner: RwLock::new(owner.map(|deployment| Ownership {
                deployment,
                declared: true,
            })),
            subscribers: RwLock::new(Vec::new()),
            consumers: RwLock::new(HashMap::new()),
            registrations: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => ChannelState::Active,
            _ => ChannelState::Closed,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == ChannelState::Closed
    }

    /// Deployment the channel is closed with, if any.
    #[must_use]
    pub fn owner(&self) -> Option<String> {
        self.owner.read().as_ref().map(|o| o.deployment.clone())
    }

    /// Whether the owner declared the channel rather than just using it.
    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.owner.read().as_ref().is_some_and(|o| o.declared)
    }

    #[must_use]
    pub fn topics(&self) -> BTreeSet<String> {
        self.topics.read().clone()
    }

    /// Number of push subscribers currently registered.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.consumers.read().len()
    }

    /// Total events accepted by this channel.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Give the channel a declaring owner and topic set. Fails if another
    /// declaration already owns it; an attributed owner is replaced.
    pub(crate) fn adopt(&self, owner: &str, topics: BTreeSet<String>) -> Result<(), ChannelError> {
        let mut current = self.owner.write();
        if let Some(existing) = current.as_ref().filter(|o| o.declared) {
            return Err(ChannelError::DuplicateChannel {
                channel: self.name.clone(),
                owner: existing.deployment.clone(),
            });
        }
        *current = Some(Ownership {
            deployment: owner.to_string(),
            declared: true,
        });
        *self.topics.write() = topics;
        Ok(())
    }

    /// Record `deployment` as owner of an ownerless channel.
    pub(crate) fn attribute(&self, deployment: &str) -> bool {
        let mut current = self.owner.write();
        if current.is_some() {
            return false;
        }
        *current = Some(Ownership {
            deployment: deployment.to_string(),
            declared: false,
        });
        true
    }

    pub(crate) fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed {
                channel: self.name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_topic(&self, topic: Option<&str>) -> Result<(), ChannelError> {
        let Some(topic) = topic else {
            return Ok(());
        };
        let topics = self.topics.read();
        if topics.is_empty() || topics.contains(topic) {
            return Ok(());
        }
        Err(ChannelError::UnknownTopic {
            channel: self.name.clone(),
            topic: topic.to_string(),
        })
    }

    /// Register or replace the subscriber with this id. Returns the
    /// registration number the new entry carries.
    pub(crate) fn add_subscriber(
        &self,
        subscriber_id: &str,
        filter: TopicFilter,
        callback: Callback,
    ) -> Result<u64, ChannelError> {
        let mut subscribers = self.subscribers.write();
        // Checked under the write lock so close() cannot interleave.
        self.ensure_open()?;

        let registration = self.registrations.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = SubscriberEntry {
            subscriber_id: subscriber_id.to_string(),
            registration,
            filter,
            callback,
        };

        match subscribers
            .iter_mut()
            .find(|s| s.subscriber_id == subscriber_id)
        {
            Some(existing) => {
                debug!(channel = %self.name, subscriber = subscriber_id, "Subscription replaced");
                *existing = entry;
            }
            None => {
                debug!(channel = %self.name, subscriber = subscriber_id, "Subscription added");
                subscribers.push(entry);
            }
        }
        Ok(registration)
    }

    /// Remove a subscriber, but only if it still carries `registration`; a
    /// stale handle must not drop the registration that replaced it.
    pub(crate) fn remove_subscriber(&self, subscriber_id: &str, registration: u64) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !(s.subscriber_id == subscriber_id && s.registration == registration));
        before != subscribers.len()
    }

    pub(crate) fn add_consumer(
        &self,
        handle_id: u64,
        filter: TopicFilter,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>, ChannelError> {
        let mut consumers = self.consumers.write();
        self.ensure_open()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        consumers.insert(handle_id, ConsumerSink { filter, sender });
        Ok(receiver)
    }

    pub(crate) fn remove_consumer(&self, handle_id: u64) -> bool {
        self.consumers.write().remove(&handle_id).is_some()
    }

    /// Deliver an event. Returns the number of subscribers and consumers it
    /// reached.
    pub(crate) fn dispatch(&self, event: &ChannelEvent) -> Result<usize, ChannelError> {
        self.ensure_open()?;
        self.published.fetch_add(1, Ordering::Relaxed);

        // Callbacks run outside the lock so they may subscribe or publish.
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.filter.matches(event.topic.as_deref()))
            .map(|s| Arc::clone(&s.callback))
            .collect();

        let mut delivered = 0;
        for callback in callbacks {
            callback(event);
            delivered += 1;
        }

        for sink in self.consumers.read().values() {
            if sink.filter.matches(event.topic.as_deref()) && sink.sender.send(event.clone()).is_ok()
            {
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    /// Transition to `Closed` and drop every subscriber and consumer sink.
    /// Returns `false` if the channel was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut subscribers = self.subscribers.write();
        let mut consumers = self.consumers.write();
        if self.state.swap(CLOSED, Ordering::AcqRel) == CLOSED {
            return false;
        }
        subscribers.clear();
        consumers.clear();
        debug!(channel = %self.name, "Channel closed");
        true
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("owner", &self.owner())
            .field("subscribers", &self.subscriber_count())
            .field("consumers", &self.consumer_count())
            .finish()
    }
}
