//! # Shared Bus - Channel Runtime
//!
//! Named publish/subscribe channels that let components exchange events
//! without knowing about each other.
//!
//! ```text
//! ┌──────────────┐                       ┌──────────────┐
//! │ Component A  │  ProducerHandle       │ Component B  │
//! │              │ ──────┐               │              │
//! └──────────────┘       │               └──────────────┘
//!                        ▼                       ↑
//!                 ┌──────────────┐   subscribe() │ ConsumerHandle
//!                 │   Channel    │ ──────────────┘
//!                 │  (+ topics)  │
//!                 └──────────────┘
//! ```
//!
//! ## Channel Lifecycle
//!
//! `UNCREATED → ACTIVE → CLOSED`. A channel becomes active when a deployment
//! declares it or when the first handle is resolved against its name. Closing
//! is terminal: every outstanding handle fails with `ChannelError::Closed`.
//!
//! ## Delivery
//!
//! Push subscribers run on the publishing thread, so events published from
//! one producer handle reach each subscriber in publish order. Nothing is
//! promised across producer handles or across subscribers.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel;
pub mod errors;
pub mod events;
pub mod publisher;
pub mod release;
pub mod runtime;
pub mod subscriber;

pub use channel::{Channel, ChannelState};
pub use errors::ChannelError;
pub use events::{ChannelEvent, TopicFilter};
pub use publisher::ProducerHandle;
pub use release::Closeable;
pub use runtime::{ChannelDeclaration, ChannelRuntime};
pub use subscriber::{ConsumerHandle, ConsumerStream, Subscription};
