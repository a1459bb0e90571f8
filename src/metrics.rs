#[cfg(feature = "server")]
use axum::{http::StatusCode, response::IntoResponse};
#[cfg(feature = "server")]
use metrics::{counter, histogram};
#[cfg(feature = "server")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
#[cfg(feature = "server")]
use std::sync::OnceLock;

#[cfg(feature = "server")]
use crate::RecordSource;

#[cfg(feature = "server")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[cfg(feature = "server")]
pub fn init_metrics() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Metrics recorder already initialized");
                return;
            }

            // Initialize metrics with zero values
            counter!("icp_requests_total", "source" => "cache").absolute(0);
            counter!("icp_cache_hits_total").absolute(0);
            counter!("icp_cache_misses_total").absolute(0);
            counter!("icp_not_found_total").absolute(0);
            counter!("icp_errors_total", "error_type" => "unknown").absolute(0);
            histogram!("icp_request_duration_seconds").record(0.0);
        }
        Err(e) => {
            tracing::error!("Failed to install metrics recorder: {}", e);
        }
    }
}

#[cfg(feature = "server")]
pub fn record_lookup(source: RecordSource, duration_ms: u64) {
    let label = match source {
        RecordSource::Cache => "cache",
        RecordSource::Provider(id) => id.as_str(),
        RecordSource::NotFound => "not_found",
    };
    counter!("icp_requests_total", "source" => label).increment(1);

    match source {
        RecordSource::Cache => counter!("icp_cache_hits_total").increment(1),
        RecordSource::Provider(_) => counter!("icp_cache_misses_total").increment(1),
        RecordSource::NotFound => {
            counter!("icp_cache_misses_total").increment(1);
            counter!("icp_not_found_total").increment(1);
        }
    }

    histogram!("icp_request_duration_seconds").record(duration_ms as f64 / 1000.0);
}

#[cfg(feature = "server")]
pub fn increment_errors(error_type: &'static str) {
    counter!("icp_errors_total", "error_type" => error_type).increment(1);
}

#[cfg(feature = "server")]
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized".to_string()),
    }
}
