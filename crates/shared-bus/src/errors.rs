//! Channel runtime errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was closed, usually because its deployment was removed.
    #[error("Channel '{channel}' is closed")]
    Closed { channel: String },

    /// The handle itself was released.
    #[error("Handle on channel '{channel}' was released")]
    Released { channel: String },

    /// Another deployment already declared a channel with this name.
    #[error("Channel '{channel}' is already declared by deployment {owner}")]
    DuplicateChannel { channel: String, owner: String },

    /// The channel restricts its topics and this one is not among them.
    #[error("Channel '{channel}' has no topic '{topic}'")]
    UnknownTopic { channel: String, topic: String },

    /// The payload could not be converted to or from the handle's type.
    #[error("Payload on channel '{channel}' does not fit {type_name}: {reason}")]
    Payload {
        channel: String,
        type_name: &'static str,
        reason: String,
    },
}
