//! HTTP API server.
//!
//! Exposes upload, question answering and session history over REST. The
//! server holds a single session shared by all clients.

use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, UploadedFile};
use crate::query::Source;
use crate::report::FileReport;
use crate::session::{ChatTurn, SessionContext};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    session: Mutex<SessionContext>,
}

/// Build the API router around an orchestrator.
pub fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState {
        orchestrator,
        session: Mutex::new(SessionContext::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .route("/history", get(history).delete(clear_history))
        .route("/files", get(files))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = super::connect(settings, Operation::Ingest)?;
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("EarningsAI API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Upload", "POST   /upload (multipart)");
    Output::kv("Ask", "POST   /ask");
    Output::kv("History", "GET    /history");
    Output::kv("Clear history", "DELETE /history");
    Output::kv("Files", "GET    /files");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    results: Vec<FileReport>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    response: String,
    sources: Vec<Source>,
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct FilesResponse {
    files: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut uploads = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        };

        let name = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let mime_type = field.content_type().map(str::to_string);

        match field.bytes().await {
            Ok(bytes) => uploads.push(UploadedFile::new(name, mime_type, bytes.to_vec())),
            Err(e) => {
                warn!("Failed to read upload {}: {}", name, e);
                return error_response(StatusCode::BAD_REQUEST, e);
            }
        }
    }

    if uploads.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No files in request");
    }

    let (uploads, mut report) = state.session.lock().await.filter_new_uploads(uploads);
    if !uploads.is_empty() {
        let processed = state.orchestrator.process_uploads(uploads).await;
        state.session.lock().await.record_batch(&processed);
        report.extend(processed);
    }

    Json(UploadResponse {
        results: report.files,
    })
    .into_response()
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let question = req.question.trim();
    if question.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question must not be empty");
    }

    match state.orchestrator.answer(question).await {
        Ok(result) => {
            state.session.lock().await.record_answer(question, &result);
            Json(AskResponse {
                response: result.response,
                sources: result.sources,
            })
            .into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HistoryResponse {
        history: state.session.lock().await.chat_history.clone(),
    })
}

async fn clear_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.clear_history();
    StatusCode::NO_CONTENT
}

async fn files(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(FilesResponse {
        files: state
            .session
            .lock()
            .await
            .processed_files
            .iter()
            .cloned()
            .collect(),
    })
}
