use crate::domain::DeploymentId;
use crate::ports::{DeploymentMonitor, MonitorEvent, Outcome};
use parking_lot::Mutex;

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<MonitorEvent>>,
    rollbacks: Mutex<Vec<(DeploymentId, usize)>>,
}

impl RecordingMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Names of the definitions whose events carry `outcome`, in arrival
    /// order.
    #[must_use]
    pub fn with_outcome(&self, outcome: Outcome) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.definition.clone())
            .collect()
    }

    #[must_use]
    pub fn rollbacks(&self) -> Vec<(DeploymentId, usize)> {
        self.rollbacks.lock().clone()
    }
}

impl DeploymentMonitor for RecordingMonitor {
    fn record(&self, event: &MonitorEvent) {
        self.events.lock().push(event.clone());
    }

    fn rolled_back(&self, deployment: &DeploymentId, removed: usize) {
        self.rollbacks.lock().push((*deployment, removed));
    }
}
