//! # Built-in Components
//!
//! Implementations available to every descriptor without host code:
//!
//! | Implementation | Behaviour |
//! |----------------|-----------|
//! | `loom.echo` | returns what it is sent, optionally tagged |
//! | `loom.forwarder` | forwards every invocation through a reference |
//! | `loom.publisher` | publishes invocation payloads on a producer slot |
//! | `loom.collector` | keeps events from subscriptions and a consumer slot |

mod echo;
mod events;

pub use echo::{Echo, EchoFactory, Forwarder, ForwarderFactory};
pub use events::{Collector, CollectorFactory, Publisher, PublisherFactory};

use lm_03_building::ComponentFactoryRegistry;
use std::sync::Arc;

pub const ECHO: &str = "loom.echo";
pub const FORWARDER: &str = "loom.forwarder";
pub const PUBLISHER: &str = "loom.publisher";
pub const COLLECTOR: &str = "loom.collector";

/// Register every built-in implementation.
pub fn register_builtin(registry: &ComponentFactoryRegistry) {
    registry.register(ECHO, Arc::new(EchoFactory));
    registry.register(FORWARDER, Arc::new(ForwarderFactory));
    registry.register(PUBLISHER, Arc::new(PublisherFactory));
    registry.register(COLLECTOR, Arc::new(CollectorFactory));
}
