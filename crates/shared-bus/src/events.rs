//! # Channel Events
//!
//! Payloads travel as JSON values so that producers and consumers only agree
//! on a serde shape, not on a Rust type.

use crate::errors::ChannelError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub topic: Option<String>,
    /// Handle id of the producer.
    pub producer: u64,
    /// Position in that producer's stream, starting at 1.
    pub sequence: u64,
    pub payload: serde_json::Value,
}

impl ChannelEvent {
    /// Decode the payload as `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ChannelError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| ChannelError::Payload {
            channel: self.channel.clone(),
            type_name: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
    }
}

/// Which topics a consumer or subscriber sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicFilter {
    /// Every event on the channel.
    All,
    /// Only events published on this topic.
    Topic(String),
}

impl TopicFilter {
    #[must_use]
    pub fn from_topic(topic: Option<&str>) -> Self {
        topic.map_or(Self::All, |t| Self::Topic(t.to_string()))
    }

    #[must_use]
    pub fn matches(&self, topic: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Topic(wanted) => topic == Some(wanted.as_str()),
        }
    }
}
