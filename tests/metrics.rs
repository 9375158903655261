// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use hatex::AppConfig;

// Build full in-process app (API + /metrics).
fn build_app() -> Router {
    hatex::app(&AppConfig::default()).expect("app() should build Router in tests")
}

fn predict(text: &str) -> Request<Body> {
    Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "text": text }).to_string()))
        .unwrap()
}

async fn scrape(app: Router) -> String {
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn predictions_and_rejections_show_up_in_exposition() {
    let app = build_app();

    for text in ["I hate you", "Have a nice day", "   "] {
        let r = app.clone().oneshot(predict(text)).await.unwrap();
        assert!(r.status() == StatusCode::OK || r.status() == StatusCode::BAD_REQUEST);
    }

    let text = scrape(app).await;
    for needle in [
        "hatex_predictions_total",
        "label=\"Hate\"",
        "label=\"Not Hate\"",
        "hatex_predict_rejected_total",
        "hatex_predict_duration_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

#[tokio::test]
async fn app_can_be_built_twice_in_one_process() {
    // Recorder is global; the second build must reuse it instead of failing.
    let a = build_app();
    let b = build_app();
    let _ = scrape(a).await;
    let _ = scrape(b).await;
}
