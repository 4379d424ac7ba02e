//! # Channel Runtime
//!
//! Process-wide table of channels and the entry point for resolving
//! producer, consumer and subscription handles against channel names.

use crate::channel::{Channel, ChannelState};
use crate::errors::ChannelError;
use crate::events::{ChannelEvent, TopicFilter};
use crate::publisher::ProducerHandle;
use crate::release::Closeable;
use crate::subscriber::{ConsumerHandle, Subscription};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A deployment's claim on a channel name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDeclaration {
    pub name: String,
    /// Empty means any topic is allowed.
    pub topics: BTreeSet<String>,
    /// Deployment that owns the channel and closes it on removal.
    pub owner: String,
}

/// Table of live channels.
pub struct ChannelRuntime {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    next_handle: AtomicU64,
}

impl ChannelRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
        }
    }

    /// Create a channel on behalf of a deployment.
    ///
    /// A channel that was created implicitly by an earlier handle resolution
    /// and has not been declared yet is adopted. A channel another deployment
    /// declared is a duplicate.
    pub fn declare(&self, declaration: ChannelDeclaration) -> Result<Arc<Channel>, ChannelError> {
        let mut channels = self.channels.write();

        if let Some(existing) = channels.get(&declaration.name) {
            existing.adopt(&declaration.owner, declaration.topics)?;
            info!(
                channel = %declaration.name,
                owner = %declaration.owner,
                "Adopted implicitly created channel"
            );
            return Ok(Arc::clone(existing));
        }

        let channel = Arc::new(Channel::new(
            &declaration.name,
            declaration.topics,
            Some(declaration.owner.clone()),
        ));
        channels.insert(declaration.name.clone(), Arc::clone(&channel));
        info!(channel = %declaration.name, owner = %declaration.owner, "Channel declared");
        Ok(channel)
    }

    /// Look a channel up, creating it on first reference.
    fn resolve(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.read().get(name) {
            return Arc::clone(channel);
        }

        let mut channels = self.channels.write();
        Arc::clone(channels.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = name, "Channel created on first reference");
            Arc::new(Channel::new(name, BTreeSet::new(), None))
        }))
    }

    fn resolve_endpoint(&self, name: &str, topic: Option<&str>) -> Result<Arc<Channel>, ChannelError> {
        let channel = self.resolve(name);
        channel.ensure_open()?;
        channel.check_topic(topic)?;
        Ok(channel)
    }

    /// Tie a channel that nobody declared to the deployment using it, so the
    /// channel closes with that deployment. A later declaration still adopts
    /// it. Returns false if the channel is absent or already owned.
    pub fn attribute(&self, channel: &str, deployment: &str) -> bool {
        let Some(resolved) = self.get(channel) else {
            return false;
        };
        let attributed = resolved.attribute(deployment);
        if attributed {
            debug!(channel, deployment, "Undeclared channel attributed to deployment");
        }
        attributed
    }

    fn next_handle_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Resolve a producer publishing `T` to `channel`, on `topic` if given.
    pub fn producer<T: Serialize>(
        &self,
        channel: &str,
        topic: Option<&str>,
    ) -> Result<ProducerHandle<T>, ChannelError> {
        let resolved = self.resolve_endpoint(channel, topic)?;
        Ok(ProducerHandle::new(
            resolved,
            topic.map(str::to_string),
            self.next_handle_id(),
        ))
    }

    /// Resolve a pull consumer of `T`. Without a topic it sees every event.
    pub fn consumer<T: DeserializeOwned>(
        &self,
        channel: &str,
        topic: Option<&str>,
    ) -> Result<ConsumerHandle<T>, ChannelError> {
        let resolved = self.resolve_endpoint(channel, topic)?;
        let id = self.next_handle_id();
        let receiver = resolved.add_consumer(id, TopicFilter::from_topic(topic))?;
        Ok(ConsumerHandle::new(resolved, id, receiver))
    }

    /// Register a push callback for decoded `T` values.
    ///
    /// Subscribing again with the same `subscriber_id` replaces the earlier
    /// registration. Events that do not decode as `T` are skipped.
    pub fn subscribe<T, F>(
        &self,
        channel: &str,
        subscriber_id: &str,
        topic: Option<&str>,
        callback: F,
    ) -> Result<Subscription, ChannelError>
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe_events(channel, subscriber_id, topic, move |event| {
            match event.decode::<T>() {
                Ok(value) => callback(value),
                Err(e) => warn!(error = %e, "Subscriber skipped undecodable event"),
            }
        })
    }

    /// Register a push callback receiving raw events.
    pub fn subscribe_events<F>(
        &self,
        channel: &str,
        subscriber_id: &str,
        topic: Option<&str>,
        callback: F,
    ) -> Result<Subscription, ChannelError>
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let resolved = self.resolve_endpoint(channel, topic)?;
        let registration = resolved.add_subscriber(
            subscriber_id,
            TopicFilter::from_topic(topic),
            Arc::new(callback),
        )?;
        Ok(Subscription::new(
            resolved,
            subscriber_id.to_string(),
            registration,
        ))
    }

    /// Release a handle. Returns `true` if this call ran its release hook.
    pub fn close(&self, handle: &dyn Closeable) -> bool {
        handle.release()
    }

    /// Close a channel and forget it. Returns `false` if no such channel is
    /// active.
    pub fn close_channel(&self, name: &str) -> bool {
        let removed = self.channels.write().remove(name);
        match removed {
            Some(channel) => {
                let closed = channel.close();
                if closed {
                    info!(channel = name, "Channel closed");
                }
                closed
            }
            None => false,
        }
    }

    /// Close every channel declared by `owner`. Returns the closed names,
    /// sorted.
    pub fn close_owned_by(&self, owner: &str) -> Vec<String> {
        let owned: Vec<Arc<Channel>> = {
            let mut channels = self.channels.write();
            let names: Vec<String> = channels
                .iter()
                .filter(|(_, c)| c.owner().as_deref() == Some(owner))
                .map(|(name, _)| name.clone())
                .collect();
            names
                .iter()
                .filter_map(|name| channels.remove(name))
                .collect()
        };

        let mut closed: Vec<String> = owned
            .into_iter()
            .filter(|c| c.close())
            .map(|c| c.name().to_string())
            .collect();
        closed.sort();
        if !closed.is_empty() {
            info!(owner, channels = ?closed, "Closed channels of deployment");
        }
        closed
    }

    /// Lifecycle state of a channel name.
    #[must_use]
    pub fn state(&self, name: &str) -> ChannelState {
        self.channels
            .read()
            .get(name)
            .map_or(ChannelState::Uncreated, |c| c.state())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.read().get(name).cloned()
    }

    /// Names of all active channels, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channels
            .read()
            .get(name)
            .map_or(0, |c| c.subscriber_count())
    }

    /// Events accepted across all active channels.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.channels
            .read()
            .values()
            .map(|c| c.events_published())
            .sum()
    }
}

impl Default for ChannelRuntime {
    fn default() -> Self {
        Self::new()
    }
}
