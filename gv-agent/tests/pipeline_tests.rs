//! End-to-end pipeline tests against a local mock inference endpoint.
//!
//! The mock endpoint runs on an ephemeral port per test, so tests are free
//! to run in parallel.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use gv_agent::services::{AgentOrchestrator, TriageWriter, UploadClient};
use gv_agent::utils::RetryPolicy;

/// Serve `app` on an ephemeral port, returning the predict URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/predict", addr)
}

/// Millisecond-scale policy so retry tests stay fast.
fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        multiplier: 2.0,
        max_delay: Duration::from_millis(50),
    }
}

fn orchestrator(url: String, root: &Path, threshold: f64) -> AgentOrchestrator {
    let client =
        UploadClient::with_retry_policy(url, Duration::from_secs(5), fast_policy()).unwrap();
    let writer = TriageWriter::new(root.join("results"), root.join("for_review"), threshold);
    AgentOrchestrator::new(client, writer)
}

fn fixed_response(confidence: f64) -> Router {
    Router::new().route(
        "/predict",
        post(move || async move { Json(json!({"confidence": confidence})) }),
    )
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_high_confidence_writes_result_only() {
    let url = serve(fixed_response(0.95)).await;
    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 1);
    let record = read_json(&temp.path().join("results").join("cat.json"));
    assert_eq!(record["response"]["confidence"], 0.95);
    assert!(record["image"].as_str().unwrap().ends_with("cat.jpg"));
    assert!(!temp.path().join("for_review").join("cat.json").exists());
}

#[tokio::test]
async fn test_low_confidence_also_writes_review_copy() {
    let url = serve(fixed_response(0.5)).await;
    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 1);
    assert!(temp.path().join("results").join("cat.json").is_file());

    let review = read_json(&temp.path().join("for_review").join("cat.json"));
    assert_eq!(review["max_confidence"], 0.5);
    assert_eq!(review["response"]["confidence"], 0.5);
}

#[tokio::test]
async fn test_negative_confidence_passes_through_to_review() {
    let url = serve(fixed_response(-0.25)).await;
    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("odd.png"), b"png bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    orch.scan_existing(&watch).await;

    let review = read_json(&temp.path().join("for_review").join("odd.json"));
    assert_eq!(review["max_confidence"], -0.25);
}

type Received = Arc<Mutex<Vec<(String, String, String)>>>;

async fn recording_handler(
    State(received): State<Received>,
    mut multipart: Multipart,
) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        field.bytes().await.unwrap();
        received.lock().unwrap().push((name, file_name, content_type));
    }
    Json(json!({"confidence": 0.9}))
}

#[tokio::test]
async fn test_multipart_contract_and_sorted_scan_order() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/predict", post(recording_handler))
        .with_state(received.clone());
    let url = serve(app).await;

    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("c.gif"), b"gif").unwrap();
    std::fs::write(watch.join("a.jpg"), b"jpg").unwrap();
    std::fs::write(watch.join("b.png"), b"png").unwrap();
    std::fs::write(watch.join("zz.txt"), b"not an image").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 3);
    let uploads = received.lock().unwrap().clone();
    assert_eq!(
        uploads,
        vec![
            (
                "file".to_string(),
                "a.jpg".to_string(),
                "application/octet-stream".to_string()
            ),
            (
                "file".to_string(),
                "b.png".to_string(),
                "application/octet-stream".to_string()
            ),
            (
                "file".to_string(),
                "c.gif".to_string(),
                "application/octet-stream".to_string()
            ),
        ]
    );
}

async fn flaky_handler(State(counter): State<Arc<AtomicUsize>>) -> axum::response::Response {
    let attempt = counter.fetch_add(1, Ordering::SeqCst);
    if attempt < 2 {
        (StatusCode::INTERNAL_SERVER_ERROR, "unavailable").into_response()
    } else {
        Json(json!({"confidence": 0.9})).into_response()
    }
}

#[tokio::test]
async fn test_upload_retries_through_two_failures() {
    let counter = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/predict", post(flaky_handler))
        .with_state(counter.clone());
    let url = serve(app).await;

    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 1);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(temp.path().join("results").join("cat.json").is_file());
}

async fn failing_handler(State(counter): State<Arc<AtomicUsize>>) -> axum::response::Response {
    counter.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "down for maintenance").into_response()
}

#[tokio::test]
async fn test_exhausted_retries_leave_no_record() {
    let counter = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/predict", post(failing_handler))
        .with_state(counter.clone());
    let url = serve(app).await;

    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 0);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(!temp.path().join("results").join("cat.json").exists());
    assert!(!temp.path().join("for_review").join("cat.json").exists());
}

#[tokio::test]
async fn test_non_json_body_is_retried_then_dropped() {
    let counter = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/predict",
        post(|State(counter): State<Arc<AtomicUsize>>| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            "this is not json"
        }),
    )
    .with_state(counter.clone());
    let url = serve(app).await;

    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);
    let processed = orch.scan_existing(&watch).await;

    assert_eq!(processed, 0);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(!temp.path().join("results").join("cat.json").exists());
}

#[tokio::test]
async fn test_rescan_overwrites_with_identical_content() {
    let url = serve(fixed_response(0.95)).await;
    let temp = tempfile::tempdir().unwrap();
    let watch = temp.path().join("images");
    std::fs::create_dir(&watch).unwrap();
    std::fs::write(watch.join("cat.jpg"), b"jpeg bytes").unwrap();

    let orch = orchestrator(url, temp.path(), 0.8);

    assert_eq!(orch.scan_existing(&watch).await, 1);
    let result_path = temp.path().join("results").join("cat.json");
    let first = std::fs::read(&result_path).unwrap();

    assert_eq!(orch.scan_existing(&watch).await, 1);
    let second = std::fs::read(&result_path).unwrap();

    assert_eq!(first, second);
}
