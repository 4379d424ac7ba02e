//! # lm-04-deployment
//!
//! The deployment orchestrator: turns a set of logical units into a live,
//! wired topology as one all-or-nothing transaction, and takes it down again.
//!
//! ## Transaction
//!
//! 1. Federation resolution for the proposed units.
//! 2. Topological ordering of every definition over local, imported and
//!    channel edges.
//! 3. Generation of the whole set. Any failure aborts with nothing built.
//! 4. Builder preflight, wire attachment, then building in order. A build
//!    failure removes what was built, in reverse, and surfaces the failure.
//!
//! Removal runs the builders' `remove` in reverse build order and reports
//! every failure only after all artifacts were attempted.
//!
//! ## Architecture
//!
//! - `domain/`: deployment receipts and definition ordering
//! - `ports/`: the monitor collaborator
//! - `adapters/`: tracing/Prometheus monitor and an in-memory recorder
//! - `service`: the orchestrator

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{RecordingMonitor, TracingMonitor};
pub use domain::{order_definitions, Deployment, DeploymentId, DeploymentSummary};
pub use error::{DeploymentError, DeploymentResult};
pub use ports::{DeploymentMonitor, MonitorEvent, Outcome};
pub use service::{DeploymentOrchestrator, OrchestratorConfig};
