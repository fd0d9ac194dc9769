mod config;
mod error;
mod models;
mod services;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use error::{AppError, Result};
use models::{ContentRequest, ExplainRequest, LessonPlan, LessonPlanRequest, RecoveryResult, WorksheetRequest};
use serde_json::json;
use services::llm::TextGenerator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LANGUAGE: &str = "English";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    generator: Arc<dyn TextGenerator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::Config::from_env();
    let llm_client = services::llm::LLMClient::new(&config.llm)?;
    tracing::info!(api_url = %config.llm.api_url, model = %config.llm.model, "Model backend configured");

    let app = app(AppState {
        generator: Arc::new(llm_client),
    });

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/lesson-plan", post(lesson_plan))
        .route("/api/worksheets", post(worksheets))
        .route("/api/content", post(content))
        .route("/api/explain", post(explain))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

fn request_span(feature: &'static str) -> tracing::Span {
    tracing::info_span!("generation", feature, request_id = %uuid::Uuid::new_v4())
}

async fn lesson_plan(
    State(state): State<AppState>,
    Json(mut req): Json<LessonPlanRequest>,
) -> Result<Json<serde_json::Value>> {
    if req.topic.trim().chars().count() < 3 {
        return Err(AppError::InvalidRequest("topic must be at least 3 characters".into()));
    }
    if req.grade_level.trim().is_empty() {
        return Err(AppError::InvalidRequest("grade level is required".into()));
    }
    req.language = language_or_default(&req.language);

    let result = services::generation::generate_lesson_plan(state.generator.as_ref(), &req)
        .instrument(request_span("lesson_plan"))
        .await?;

    let plan = if result.is_structured() {
        LessonPlan::from_json(result.as_str()).filter(|plan| !plan.is_empty())
    } else {
        None
    };

    Ok(Json(json!({ "result": result, "plan": plan })))
}

async fn worksheets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let req = read_worksheet_form(&mut multipart).await?;

    let result = services::generation::generate_worksheets(state.generator.as_ref(), &req)
        .instrument(request_span("worksheets"))
        .await?;

    let worksheet_count = match &result {
        RecoveryResult::Structured(json) => serde_json::from_str::<models::WorksheetCollection>(json)
            .map(|c| c.differentiated_materials.len())
            .unwrap_or(0),
        RecoveryResult::Fallback(_) => 0,
    };
    tracing::info!(structured = result.is_structured(), worksheet_count, "Worksheet generation finished");

    Ok(Json(json!({ "result": result, "worksheetCount": worksheet_count })))
}

async fn read_worksheet_form(multipart: &mut Multipart) -> Result<WorksheetRequest> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut grade_levels = String::new();
    let mut language = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        match name.as_str() {
            "textbook_page_image" => {
                let mime = field.content_type().unwrap_or("image/png").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("could not read image: {}", e)))?;
                image = Some((data.to_vec(), mime));
            }
            "grade_levels" | "language" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("could not read {}: {}", name, e)))?;
                if name == "grade_levels" {
                    grade_levels = value;
                } else {
                    language = value;
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let (bytes, mime_type) = match image {
        Some((bytes, mime)) if !bytes.is_empty() => (bytes, mime),
        _ => return Err(AppError::InvalidRequest("image is required".into())),
    };
    if grade_levels.trim().is_empty() {
        return Err(AppError::InvalidRequest("at least one grade level is required".into()));
    }

    Ok(WorksheetRequest {
        textbook_page_image: BASE64.encode(bytes),
        mime_type,
        grade_levels: grade_levels.trim().to_string(),
        language: language_or_default(&language),
    })
}

async fn content(
    State(state): State<AppState>,
    Json(mut req): Json<ContentRequest>,
) -> Result<Json<serde_json::Value>> {
    if req.request.trim().chars().count() < 10 {
        return Err(AppError::InvalidRequest("request must be at least 10 characters".into()));
    }
    req.language = language_or_default(&req.language);

    let text = services::generation::generate_content(state.generator.as_ref(), &req)
        .instrument(request_span("content"))
        .await?;
    Ok(Json(json!({ "content": text })))
}

async fn explain(
    State(state): State<AppState>,
    Json(mut req): Json<ExplainRequest>,
) -> Result<Json<serde_json::Value>> {
    if req.question.trim().chars().count() < 5 {
        return Err(AppError::InvalidRequest("question must be at least 5 characters".into()));
    }
    req.language = language_or_default(&req.language);

    let text = services::generation::explain_concept(state.generator.as_ref(), &req)
        .instrument(request_span("explain"))
        .await?;
    Ok(Json(json!({ "explanation": text })))
}

fn language_or_default(language: &str) -> String {
    let language = language.trim();
    if language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        language.to_string()
    }
}
