//! # Consumer Handles and Subscriptions
//!
//! Pull-style consumers buffer matching events until read; push-style
//! subscriptions invoke a callback on the publishing thread.

use crate::channel::Channel;
use crate::errors::ChannelError;
use crate::events::ChannelEvent;
use crate::release::{Closeable, ReleaseGuard};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Reads `T` values from one channel.
///
/// Dropping the handle releases it.
pub struct ConsumerHandle<T> {
    channel: Arc<Channel>,
    id: u64,
    receiver: mpsc::UnboundedReceiver<ChannelEvent>,
    release: ReleaseGuard,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ConsumerHandle<T> {
    pub(crate) fn new(
        channel: Arc<Channel>,
        id: u64,
        receiver: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self {
            channel,
            id,
            receiver,
            release: ReleaseGuard::default(),
            _payload: PhantomData,
        }
    }

    /// Wait for the next event and decode it.
    pub async fn recv(&mut self) -> Result<T, ChannelError> {
        self.recv_event().await?.decode()
    }

    /// Wait for the next raw event.
    pub async fn recv_event(&mut self) -> Result<ChannelEvent, ChannelError> {
        self.ensure_usable()?;
        match self.receiver.recv().await {
            Some(event) => Ok(event),
            None => Err(self.closed_error()),
        }
    }

    /// Take the next event if one is buffered.
    ///
    /// - `Ok(Some(value))` - an event was available
    /// - `Ok(None)` - nothing buffered
    /// - `Err(_)` - the channel or handle is closed
    pub fn try_recv(&mut self) -> Result<Option<T>, ChannelError> {
        self.ensure_usable()?;
        match self.receiver.try_recv() {
            Ok(event) => event.decode().map(Some),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(self.closed_error()),
        }
    }

    /// Convert into a `Stream` of decoded values. The stream ends when the
    /// channel closes.
    #[must_use]
    pub fn into_stream(self) -> ConsumerStream<T> {
        ConsumerStream { consumer: self }
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        self.channel.name()
    }

    fn ensure_usable(&self) -> Result<(), ChannelError> {
        if self.release.is_released() {
            return Err(ChannelError::Released {
                channel: self.channel.name().to_string(),
            });
        }
        self.channel.ensure_open()
    }

    fn closed_error(&self) -> ChannelError {
        if self.release.is_released() {
            ChannelError::Released {
                channel: self.channel.name().to_string(),
            }
        } else {
            ChannelError::Closed {
                channel: self.channel.name().to_string(),
            }
        }
    }
}

impl<T> Closeable for ConsumerHandle<T> {
    fn release(&self) -> bool {
        self.release.fire(|| {
            self.channel.remove_consumer(self.id);
            debug!(channel = %self.channel.name(), consumer = self.id, "Consumer released");
        })
    }
}

impl<T> Drop for ConsumerHandle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// `Stream` adapter over a consumer handle.
///
/// Items that fail to decode are skipped.
pub struct ConsumerStream<T> {
    consumer: ConsumerHandle<T>,
}

impl<T: DeserializeOwned> Stream for ConsumerStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.consumer.ensure_usable().is_err() {
                return Poll::Ready(None);
            }
            match self.consumer.receiver.poll_recv(cx) {
                Poll::Ready(Some(event)) => match event.decode() {
                    Ok(value) => return Poll::Ready(Some(value)),
                    Err(e) => {
                        debug!(error = %e, "Skipping undecodable event");
                        continue;
                    }
                },
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// A push registration on a channel.
///
/// Dropping the handle unsubscribes, unless a later subscription with the
/// same subscriber id has already replaced it.
pub struct Subscription {
    channel: Arc<Channel>,
    subscriber_id: String,
    registration: u64,
    release: ReleaseGuard,
}

impl Subscription {
    pub(crate) fn new(channel: Arc<Channel>, subscriber_id: String, registration: u64) -> Self {
        Self {
            channel,
            subscriber_id,
            registration,
            release: ReleaseGuard::default(),
        }
    }

    #[must_use]
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        self.channel.name()
    }
}

impl Closeable for Subscription {
    fn release(&self) -> bool {
        self.release.fire(|| {
            if self
                .channel
                .remove_subscriber(&self.subscriber_id, self.registration)
            {
                debug!(
                    channel = %self.channel.name(),
                    subscriber = %self.subscriber_id,
                    "Subscription dropped"
                );
            }
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel.name())
            .field("subscriber_id", &self.subscriber_id)
            .field("registration", &self.registration)
            .finish()
    }
}
