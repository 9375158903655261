// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::classifier::Label;

pub const PREDICTIONS_TOTAL: &str = "hatex_predictions_total";
pub const PREDICT_REJECTED_TOTAL: &str = "hatex_predict_rejected_total";
pub const PREDICT_FAILURES_TOTAL: &str = "hatex_predict_failures_total";
pub const PREDICT_DURATION_MS: &str = "hatex_predict_duration_ms";

// The recorder is process-global; routers built later share the first handle.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_prediction(label: Label, elapsed_ms: f64) {
    counter!(PREDICTIONS_TOTAL, "label" => label.as_str()).increment(1);
    histogram!(PREDICT_DURATION_MS).record(elapsed_ms);
}

pub fn record_rejected() {
    counter!(PREDICT_REJECTED_TOTAL).increment(1);
}

pub fn record_failure() {
    counter!(PREDICT_FAILURES_TOTAL).increment(1);
}
