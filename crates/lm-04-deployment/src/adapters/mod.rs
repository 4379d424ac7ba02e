//! # Adapters Layer
//!
//! Monitor implementations: structured logs plus Prometheus counters, and an
//! in-memory recorder for tests and embedding hosts.

mod recording;
mod tracing_monitor;

pub use recording::RecordingMonitor;
pub use tracing_monitor::TracingMonitor;
