//! Ports: the monitor/logging collaborator.

pub mod monitor;

pub use monitor::{DeploymentMonitor, MonitorEvent, Outcome};
