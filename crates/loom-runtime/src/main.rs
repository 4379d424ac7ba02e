//! `loom-runtime` executable.
//!
//! Usage: `loom-runtime <descriptor.json | directory>...`
//!
//! Every descriptor found is deployed as one transaction. The process then
//! runs until Ctrl+C and undeploys everything before exiting.

use anyhow::{bail, Context, Result};
use loom_runtime::{load_units, Runtime, RuntimeConfig};
use loom_telemetry::init_telemetry;
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    let _telemetry = init_telemetry(config.telemetry.clone()).context("initializing telemetry")?;

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("usage: loom-runtime <descriptor.json | directory>...");
    }

    let units = load_units(paths.as_slice())?;
    info!(units = units.len(), "Descriptors loaded");

    let runtime = Runtime::new(config);
    let id = match runtime.deploy(units).await {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Deployment failed");
            return Err(e.into());
        }
    };
    if let Some(summary) = runtime.orchestrator().deployment(id) {
        info!(
            deployment = %id,
            artifacts = summary.artifacts,
            wires = summary.wires,
            "Deployed"
        );
    }
    for address in runtime.endpoints().addresses() {
        info!(address = %address, "Endpoint bound");
    }

    info!("Runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;

    let failures = runtime.shutdown().await;
    for failure in &failures {
        error!(error = %failure, "Undeploy failed");
    }
    if !failures.is_empty() {
        bail!("shutdown left {} failure(s)", failures.len());
    }
    Ok(())
}
