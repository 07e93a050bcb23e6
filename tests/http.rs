//! HTTP API tests against stub services.

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{test_settings, Harness, HashEmbedder, StubExtractor, StubTranscriber, DIMENSIONS};
use earnings_ai::cli::commands::router;
use earnings_ai::orchestrator::Orchestrator;
use earnings_ai::query::Generator;
use earnings_ai::store::{DocumentStore, MemoryDocumentStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

const BOUNDARY: &str = "earnings-ai-test-boundary";

/// The router plus the temp dir its uploads are written to.
fn app() -> (Router, tempfile::TempDir) {
    let Harness {
        orchestrator,
        temp_dir,
        ..
    } = Harness::new();
    (router(orchestrator), temp_dir)
}

fn multipart_body(files: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (name, mime, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn upload_request(files: &[(&str, &str, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

fn ask_request(question: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "question": question }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app().0, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_then_ask() {
    let (app, _temp) = app();

    let (status, body) = send(
        &app,
        upload_request(&[
            ("report.pdf", "application/pdf", "Q3 revenue was $500M"),
            ("blank.txt", "text/plain", "  "),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["filename"], "report.pdf");
    assert_eq!(body["results"][0]["status"], "success");
    assert_eq!(body["results"][1]["status"], "error");

    let (_, files) = send(&app, get("/files")).await;
    assert_eq!(files["files"], json!(["report.pdf"]));

    let (status, answer) = send(&app, ask_request("What was Q3 revenue?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["sources"][0]["metadata"]["filename"], "report.pdf");
    assert_eq!(answer["sources"][0]["metadata"]["company_ticker"], "MDB");
    assert!(answer["response"].as_str().unwrap().contains("report.pdf"));
}

#[tokio::test]
async fn history_can_be_cleared() {
    let (app, _temp) = app();

    send(&app, ask_request("What was Q3 revenue?")).await;
    let (_, history) = send(&app, get("/history")).await;
    assert_eq!(history["history"].as_array().unwrap().len(), 1);
    assert_eq!(history["history"][0]["question"], "What was Q3 revenue?");

    let clear = Request::builder()
        .method(Method::DELETE)
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, clear).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, history) = send(&app, get("/history")).await;
    assert!(history["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let (status, body) = send(&app().0, ask_request("   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let (status, _) = send(&app().0, upload_request(&[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reupload_in_same_session_is_skipped() {
    let Harness {
        orchestrator,
        store,
        temp_dir: _temp,
        ..
    } = Harness::new();
    let app = router(orchestrator);

    send(&app, upload_request(&[("report.pdf", "application/pdf", "Q3 revenue was $500M")])).await;

    let (status, body) = send(
        &app,
        upload_request(&[
            ("report.pdf", "application/pdf", "Q3 revenue was $500M"),
            ("notes.txt", "text/plain", "Guidance raised for Q4"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["filename"], "report.pdf");
    assert_eq!(body["results"][0]["status"], "skipped");
    assert_eq!(body["results"][1]["filename"], "notes.txt");
    assert_eq!(body["results"][1]["status"], "success");

    assert_eq!(store.document_count().await.unwrap(), 2);
    let (_, files) = send(&app, get("/files")).await;
    assert_eq!(files["files"], json!(["notes.txt", "report.pdf"]));
}

/// Holds every answer until released.
struct GatedGenerator {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl Generator for GatedGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> earnings_ai::Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("Q3 revenue was $500M".to_string())
    }
}

#[tokio::test]
async fn history_stays_readable_while_answering() {
    let temp_dir = tempfile::tempdir().unwrap();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let orchestrator = Orchestrator::with_components(
        test_settings(&temp_dir),
        Arc::new(StubTranscriber::default()),
        Arc::new(StubExtractor::default()),
        Arc::new(HashEmbedder),
        Arc::new(MemoryDocumentStore::new(DIMENSIONS)),
        Arc::new(GatedGenerator {
            entered: entered.clone(),
            release: release.clone(),
        }),
    )
    .unwrap();
    let app = router(orchestrator);

    send(&app, upload_request(&[("report.pdf", "application/pdf", "Q3 revenue was $500M")])).await;

    let pending = tokio::spawn({
        let app = app.clone();
        async move { send(&app, ask_request("What was Q3 revenue?")).await }
    });
    entered.notified().await;

    let (status, history) = tokio::time::timeout(Duration::from_secs(5), send(&app, get("/history")))
        .await
        .expect("history request blocked by an in-flight question");
    assert_eq!(status, StatusCode::OK);
    assert!(history["history"].as_array().unwrap().is_empty());

    release.notify_one();
    let (status, answer) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["response"], "Q3 revenue was $500M");

    let (_, history) = send(&app, get("/history")).await;
    assert_eq!(history["history"].as_array().unwrap().len(), 1);
}
