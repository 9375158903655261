// src/api.rs
//! HTTP surface: index page, `/predict`, `/health` (and `/metrics` when wired by [`crate::app`]).

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::classifier::{Classify, Label};
use crate::metrics;
use crate::telemetry::anon_hash;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    classifier: Arc<dyn Classify>,
    debug: bool,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classify>, debug: bool) -> Self {
        Self { classifier, debug }
    }
}

thread_local! {
    // Backtrace of the last panic on this thread, taken at the panic site.
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chains a hook in front of the existing one that records where a panic happened.
fn install_panic_trace_hook() {
    PANIC_HOOK.call_once(|| {
        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            let _ = PANIC_TRACE.try_with(|t| *t.borrow_mut() = Some(trace));
            prev(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    PANIC_TRACE.with(|t| t.borrow_mut().take())
}

/// Routes without `/metrics`; the recorder is process-global so the caller decides.
/// Request bodies are not capped: input text has no length limit.
pub fn router(state: AppState) -> Router {
    install_panic_trace_hook();
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
struct PredictReq {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct PredictResp {
    prediction: Label,
    score: f64,
}

#[derive(Debug)]
pub enum ApiError {
    /// Missing or blank `text`.
    EmptyText,
    /// Classification failed; `trace` is only filled in debug mode. For a panic it is
    /// the panic-site backtrace, for a returned error the handler's stack.
    PredictionFailed {
        details: String,
        trace: Option<String>,
    },
}

impl ApiError {
    fn prediction_failed(details: String, site: Option<String>, debug: bool) -> Self {
        let trace = debug.then(|| site.unwrap_or_else(|| Backtrace::force_capture().to_string()));
        ApiError::PredictionFailed { details, trace }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::EmptyText => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Empty text" })),
            )
                .into_response(),
            ApiError::PredictionFailed { details, trace } => {
                let mut body = json!({
                    "error": "prediction failed",
                    "details": details,
                });
                if let Some(t) = trace {
                    body["trace"] = json!(t);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictResp>, ApiError> {
    // An unparsable body counts as `{}`, i.e. missing text.
    let req: PredictReq = serde_json::from_slice(&body).unwrap_or_default();
    let text = req.text.unwrap_or_default();
    if text.trim().is_empty() {
        metrics::record_rejected();
        debug!(target: "predict", "rejected empty text");
        return Err(ApiError::EmptyText);
    }

    let id = anon_hash(&text);
    let started = Instant::now();
    let _ = take_panic_trace();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| state.classifier.classify(&text)));

    let (details, site) = match outcome {
        Ok(Ok(p)) => {
            let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
            metrics::record_prediction(p.label, elapsed_ms);
            let indicator = p.indicator.map(|i| i.to_string());
            info!(
                target: "predict",
                %id,
                label = %p.label,
                score = p.score,
                indicator = ?indicator,
                chars = text.chars().count(),
                "prediction"
            );
            return Ok(Json(PredictResp {
                prediction: p.label,
                score: p.score,
            }));
        }
        Ok(Err(e)) => (e.to_string(), None),
        Err(payload) => (panic_message(payload.as_ref()), take_panic_trace()),
    };

    metrics::record_failure();
    warn!(target: "predict", %id, error = %details, "prediction failed");
    Err(ApiError::prediction_failed(details, site, state.debug))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "classifier panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_extracts_str_and_string() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(a.as_ref()), "boom");
        assert_eq!(panic_message(b.as_ref()), "bang");
        assert_eq!(panic_message(c.as_ref()), "classifier panicked");
    }

    #[test]
    fn trace_only_in_debug() {
        match ApiError::prediction_failed("x".into(), Some("site".into()), false) {
            ApiError::PredictionFailed { trace, .. } => assert!(trace.is_none()),
            other => panic!("unexpected {other:?}"),
        }
        match ApiError::prediction_failed("x".into(), None, true) {
            ApiError::PredictionFailed { trace, .. } => assert!(trace.is_some()),
            other => panic!("unexpected {other:?}"),
        }
        match ApiError::prediction_failed("x".into(), Some("site".into()), true) {
            ApiError::PredictionFailed { trace, .. } => assert_eq!(trace.as_deref(), Some("site")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn panic_hook_records_trace_on_this_thread() {
        install_panic_trace_hook();
        let _ = take_panic_trace();
        let r = panic::catch_unwind(|| panic!("kaboom"));
        assert!(r.is_err());
        assert!(take_panic_trace().is_some());
        assert!(take_panic_trace().is_none(), "trace is taken once");
    }

    #[test]
    fn predict_req_tolerates_missing_and_wrong_types() {
        let r: PredictReq = serde_json::from_slice(b"{}").unwrap();
        assert!(r.text.is_none());
        let r: PredictReq = serde_json::from_slice(br#"{"text": 5}"#).unwrap_or_default();
        assert!(r.text.is_none());
        let r: PredictReq = serde_json::from_slice(b"not json").unwrap_or_default();
        assert!(r.text.is_none());
    }
}
