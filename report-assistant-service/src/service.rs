use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use dialog_flow::{FlowRunner, SessionStorage};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::ServiceConfig,
    extract::{read_pdf_text, title_from_filename},
    llm::{ChatClient, OpenRouterChat},
    models::{
        CreateSessionResponse, MessageRequest, MessageResponse, ReportResponse,
        SessionStatusResponse, TrainingDocument, UploadParams, UploadResponse, session_keys,
    },
    workflow::{GREETING, create_flow_runner, create_report_session, install_document},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
}

pub fn create_app(config: &ServiceConfig) -> Router {
    let client: Arc<dyn ChatClient> =
        Arc::new(OpenRouterChat::new(&config.api_key, config.model.clone()));
    let app_state = create_app_state(client, config);
    build_router(app_state)
}

pub fn create_app_state(client: Arc<dyn ChatClient>, config: &ServiceConfig) -> AppState {
    let session_storage: Arc<dyn SessionStorage> =
        Arc::new(dialog_flow::InMemorySessionStorage::new());
    let flow_runner = create_flow_runner(session_storage.clone(), client, config.question_source);

    AppState {
        session_storage,
        flow_runner,
    }
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/session", post(create_session))
        .route("/session/{session_id}", get(get_session_status))
        .route("/session/{session_id}/document", post(upload_document))
        .route("/session/{session_id}/message", post(post_message))
        .route("/session/{session_id}/report", get(get_report))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Training Reflection Report Assistant",
        "version": "0.1.0",
        "description": "Chat-driven drafting of training reflection reports from uploaded PDFs",
        "endpoints": {
            "POST /session": "Create a new session",
            "POST /session/{session_id}/document": "Upload the training PDF (raw bytes, ?filename=...)",
            "POST /session/{session_id}/message": "Send a chat message",
            "GET /session/{session_id}": "Session status",
            "GET /session/{session_id}/report": "Most recent report draft",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<CreateSessionResponse> {
    let session = create_report_session().await;
    let session_id = session.id.clone();

    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        internal_error("Failed to create session", &e.to_string())
    })?;

    info!("Session {} created", session_id);
    Ok(Json(CreateSessionResponse {
        session_id,
        greeting: GREETING.to_string(),
    }))
}

async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ApiResult<UploadResponse> {
    if body.is_empty() {
        return Err(bad_request_error("Document body is empty"));
    }

    let session = load_session(&state, &session_id).await?;

    let (text, pages) = read_pdf_text(&body);
    let title = title_from_filename(params.filename.as_deref());
    let readable = !text.is_empty();
    info!(
        session_id = %session_id,
        pages,
        readable,
        "document uploaded"
    );

    let document = TrainingDocument {
        title: title.clone(),
        text,
        page_count: pages,
    };
    install_document(&session.context, document).await;

    save_session(&state, session).await?;

    let message = if readable {
        format!("📄 PDFを読み込みました：{}ページ（タイトル：{}）", pages, title)
    } else {
        "PDFからテキストを抽出できませんでした。このまま自由記述で進められます。".to_string()
    };

    Ok(Json(UploadResponse {
        session_id,
        title,
        pages,
        readable,
        message,
    }))
}

async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<MessageResponse> {
    if request.content.trim().is_empty() {
        return Err(bad_request_error("Message content cannot be empty"));
    }

    let session = load_session(&state, &session_id).await?;
    session.context.add_user_message(request.content.clone()).await;
    session
        .context
        .set(session_keys::USER_INPUT, request.content)
        .await;
    save_session(&state, session).await?;

    match state.flow_runner.run(&session_id).await {
        Ok(result) => Ok(Json(MessageResponse {
            session_id,
            response: result.response,
            status: format!("{:?}", result.status),
        })),
        Err(e) => {
            error!("Turn failed for session {}: {}", session_id, e);
            Err(internal_error("Failed to process message", &e.to_string()))
        }
    }
}

async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionStatusResponse> {
    let session = load_session(&state, &session_id).await?;

    let document: Option<TrainingDocument> = session.context.get(session_keys::DOCUMENT).await;
    let questions: Vec<String> = session
        .context
        .get(session_keys::QUESTIONS)
        .await
        .unwrap_or_default();
    let cursor: usize = session.context.get(session_keys::CURSOR).await.unwrap_or(0);
    let report: Option<String> = session.context.get(session_keys::REPORT_DRAFT).await;

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        current_task: session.current_task_id.clone(),
        status_message: session.status_message.clone(),
        document_title: document.as_ref().map(|d| d.title.clone()),
        document_pages: document.as_ref().map(|d| d.page_count),
        question_count: questions.len(),
        questions_asked: cursor,
        has_report_draft: report.is_some(),
    }))
}

async fn get_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ReportResponse> {
    let session = load_session(&state, &session_id).await?;

    match session.context.get::<String>(session_keys::REPORT_DRAFT).await {
        Some(report) => Ok(Json(ReportResponse { session_id, report })),
        None => Err(not_found_error("No report draft for session", &session_id)),
    }
}

async fn load_session(
    state: &AppState,
    session_id: &str,
) -> Result<dialog_flow::Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: dialog_flow::Session) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to save session: {}", e);
        internal_error("Failed to save session", &e.to_string())
    })
}
