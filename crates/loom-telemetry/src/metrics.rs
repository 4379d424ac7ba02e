//! Prometheus metrics for the Loom runtime.
//!
//! All metrics follow the naming convention: `loom_<area>_<metric>_<unit>`
//!
//! Per-kind counters are labelled with the definition kind (`component`,
//! `wire`, `binding.local`, ...).

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Physical definitions produced, by kind
    pub static ref DEFINITIONS_GENERATED: CounterVec = CounterVec::new(
        Opts::new("loom_generation_definitions_total", "Physical definitions generated"),
        &["kind"]
    ).expect("metric creation failed");

    /// Generation failures, by logical kind
    pub static ref GENERATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new("loom_generation_failures_total", "Logical definitions that failed to generate"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Artifacts built, by kind
    pub static ref ARTIFACTS_BUILT: CounterVec = CounterVec::new(
        Opts::new("loom_building_artifacts_built_total", "Artifacts built"),
        &["kind"]
    ).expect("metric creation failed");

    /// Artifacts removed, by kind
    pub static ref ARTIFACTS_REMOVED: CounterVec = CounterVec::new(
        Opts::new("loom_building_artifacts_removed_total", "Artifacts removed"),
        &["kind"]
    ).expect("metric creation failed");

    /// Build failures, by kind
    pub static ref BUILD_FAILURES: CounterVec = CounterVec::new(
        Opts::new("loom_building_build_failures_total", "Builds that failed"),
        &["kind"]
    ).expect("metric creation failed");

    /// Remove failures, by kind
    pub static ref REMOVE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("loom_building_remove_failures_total", "Removals that reported a failure"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // DEPLOYMENT
    // =========================================================================

    /// Deployments committed
    pub static ref DEPLOYMENTS_COMMITTED: Counter = Counter::new(
        "loom_deployment_committed_total",
        "Deployments committed"
    ).expect("metric creation failed");

    /// Deployments rolled back
    pub static ref DEPLOYMENT_ROLLBACKS: Counter = Counter::new(
        "loom_deployment_rollbacks_total",
        "Deployments rolled back after a build failure"
    ).expect("metric creation failed");

    /// Currently committed deployments
    pub static ref DEPLOYMENTS_ACTIVE: Gauge = Gauge::new(
        "loom_deployment_active",
        "Deployments currently committed"
    ).expect("metric creation failed");

    /// Wall time of a deploy call, successful or not
    pub static ref DEPLOYMENT_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "loom_deployment_duration_seconds",
            "Time spent deploying a set of units"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CHANNELS
    // =========================================================================

    /// Open channels
    pub static ref CHANNELS_OPEN: Gauge = Gauge::new(
        "loom_channels_open",
        "Channels currently known to the channel runtime"
    ).expect("metric creation failed");

    /// Events accepted by the channel runtime since start
    pub static ref CHANNEL_EVENTS_PUBLISHED: Gauge = Gauge::new(
        "loom_channels_events_published",
        "Events published through the channel runtime"
    ).expect("metric creation failed");
}

/// Keeps the registry alive for the lifetime of the process.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Generation
        Box::new(DEFINITIONS_GENERATED.clone()),
        Box::new(GENERATION_FAILURES.clone()),
        // Building
        Box::new(ARTIFACTS_BUILT.clone()),
        Box::new(ARTIFACTS_REMOVED.clone()),
        Box::new(BUILD_FAILURES.clone()),
        Box::new(REMOVE_FAILURES.clone()),
        // Deployment
        Box::new(DEPLOYMENTS_COMMITTED.clone()),
        Box::new(DEPLOYMENT_ROLLBACKS.clone()),
        Box::new(DEPLOYMENTS_ACTIVE.clone()),
        Box::new(DEPLOYMENT_DURATION.clone()),
        // Channels
        Box::new(CHANNELS_OPEN.clone()),
        Box::new(CHANNEL_EVENTS_PUBLISHED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
