use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static BFHL_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the global `metrics` recorder and register the custom counters.
///
/// Call once, at startup.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    if METRICS_HANDLE.set(handle).is_err() {
        anyhow::bail!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    let operations_counter = IntCounterVec::new(
        Opts::new(
            "bfhl_operations_total",
            "Dispatched /bfhl operations by functional key and outcome",
        ),
        &["operation", "outcome"],
    )?;

    registry.register(Box::new(operations_counter.clone()))?;

    PROMETHEUS_REGISTRY
        .set(registry)
        .map_err(|_| anyhow::anyhow!("prometheus registry already initialized"))?;
    BFHL_OPERATIONS_TOTAL
        .set(operations_counter)
        .map_err(|_| anyhow::anyhow!("bfhl_operations_total already initialized"))?;

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    // Append custom prometheus metrics
    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Count one dispatched operation. No-op until [`init_metrics`] has run.
pub fn record_operation(operation: &str, outcome: &str) {
    if let Some(counter) = BFHL_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}
