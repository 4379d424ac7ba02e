use crate::domain::DeploymentId;
use crate::ports::{DeploymentMonitor, MonitorEvent, Outcome};
use loom_telemetry::{
    metric_inc, ARTIFACTS_BUILT, ARTIFACTS_REMOVED, BUILD_FAILURES, DEFINITIONS_GENERATED,
    DEPLOYMENTS_ACTIVE, DEPLOYMENTS_COMMITTED, DEPLOYMENT_ROLLBACKS, GENERATION_FAILURES,
    REMOVE_FAILURES,
};
use tracing::{debug, error, info, warn};

/// Logs every event through `tracing` and bumps the matching counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl DeploymentMonitor for TracingMonitor {
    fn record(&self, event: &MonitorEvent) {
        let kind = event.kind.as_str();
        let error = event.error.as_deref().unwrap_or("");
        match event.outcome {
            Outcome::Generated => {
                metric_inc!(DEFINITIONS_GENERATED, &[kind]);
                debug!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, "Definition generated");
            }
            Outcome::Built => {
                metric_inc!(ARTIFACTS_BUILT, &[kind]);
                debug!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, "Artifact built");
            }
            Outcome::Removed => {
                metric_inc!(ARTIFACTS_REMOVED, &[kind]);
                info!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, "Artifact removed");
            }
            Outcome::GenerationFailed => {
                metric_inc!(GENERATION_FAILURES, &[kind]);
                error!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, error, "Generation failed");
            }
            Outcome::BuildFailed => {
                metric_inc!(BUILD_FAILURES, &[kind]);
                error!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, error, "Build failed");
            }
            Outcome::RemoveFailed => {
                metric_inc!(REMOVE_FAILURES, &[kind]);
                warn!(unit = %event.unit, kind, definition = %event.definition, outcome = %event.outcome, error, "Remove failed");
            }
        }
    }

    fn committed(&self, deployment: &DeploymentId, units: usize, artifacts: usize) {
        metric_inc!(DEPLOYMENTS_COMMITTED);
        DEPLOYMENTS_ACTIVE.inc();
        info!(deployment = %deployment, units, artifacts, "Deployment committed");
    }

    fn rolled_back(&self, deployment: &DeploymentId, removed: usize) {
        metric_inc!(DEPLOYMENT_ROLLBACKS);
        warn!(deployment = %deployment, removed, "Deployment rolled back");
    }

    fn undeployed(&self, deployment: &DeploymentId, failures: usize) {
        DEPLOYMENTS_ACTIVE.dec();
        info!(deployment = %deployment, failures, "Deployment removed");
    }
}
