// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod classifier;
pub mod config;
pub mod metrics;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;

pub use crate::api::{router, AppState};
pub use crate::classifier::{Classify, HeuristicClassifier, Label, Prediction};
pub use crate::config::AppConfig;

/// Full application router: API routes plus `/metrics`.
pub fn app(config: &AppConfig) -> anyhow::Result<Router> {
    let classifier = HeuristicClassifier::new()?;
    let metrics = crate::metrics::Metrics::init()?;
    let state = AppState::new(Arc::new(classifier), config.debug);
    Ok(api::router(state).merge(metrics.router()))
}
