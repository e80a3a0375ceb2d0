use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{Activity, AnalysisSummary, Project, ProjectError, ProjectMetadata, RiskError};

#[derive(Clone)]
pub struct AppState {
    project: Arc<RwLock<Project>>,
}

impl AppState {
    pub fn new(project: Project) -> Self {
        Self {
            project: Arc::new(RwLock::new(project)),
        }
    }

    pub fn with_shared(project: Arc<RwLock<Project>>) -> Self {
        Self { project }
    }

    fn project(&self) -> Arc<RwLock<Project>> {
        self.project.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    ZeroVariance(String),
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisRequest {
    #[serde(default)]
    target_duration: Option<f64>,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ProjectError> for ApiError {
    fn from(value: ProjectError) -> Self {
        match value {
            ProjectError::Risk(RiskError::ZeroVariance) => ApiError::ZeroVariance(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::ZeroVariance(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "zero_variance", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:name",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/analysis", post(run_analysis))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, project: Project) -> std::io::Result<()> {
    let state = AppState::new(project);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<ProjectMetadata> {
    let project = state.project();
    let metadata = project.read().metadata().clone();
    Json(metadata)
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<ProjectMetadata>,
) -> Result<Json<ProjectMetadata>, ApiError> {
    let project = state.project();
    let mut guard = project.write();
    guard.set_metadata(metadata)?;
    Ok(Json(guard.metadata().clone()))
}

async fn list_activities(State(state): State<AppState>) -> Json<Vec<Activity>> {
    let project = state.project();
    let activities = project.read().activities().to_vec();
    Json(activities)
}

async fn get_activity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Activity>, ApiError> {
    let project = state.project();
    let guard = project.read();
    guard
        .find_activity(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("activity {name} not found")))
}

async fn create_activity(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    let project = state.project();
    let mut guard = project.write();
    if guard.find_activity(&activity.name).is_some() {
        return Err(ApiError::Conflict(format!(
            "activity {} already exists",
            activity.name
        )));
    }
    let name = activity.name.clone();
    guard.upsert_activity(activity)?;
    let created = guard
        .find_activity(&name)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("activity {name} not found after creation")))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_activity(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(activity): Json<Activity>,
) -> Result<Json<Activity>, ApiError> {
    if !activity.name.trim().eq_ignore_ascii_case(name.trim()) {
        return Err(ApiError::invalid(
            "activity name in payload does not match path parameter",
        ));
    }
    let project = state.project();
    let mut guard = project.write();
    if guard.find_activity(&name).is_none() {
        return Err(ApiError::not_found(format!("activity {name} not found")));
    }
    guard.upsert_activity(activity)?;
    let updated = guard
        .find_activity(&name)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("activity {name} not found after update")))?;
    Ok(Json(updated))
}

async fn delete_activity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let project = state.project();
    let removed = project.write().delete_activity(&name);
    if !removed {
        return Err(ApiError::not_found(format!("activity {name} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn run_analysis(
    State(state): State<AppState>,
    payload: Option<Json<AnalysisRequest>>,
) -> Result<Json<AnalysisSummary>, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let project = state.project();
    let report = project.read().analyze(request.target_duration)?;
    if let Some(Err(err)) = report.risk.clone() {
        return Err(ProjectError::Risk(err).into());
    }
    Ok(Json(report.summary()))
}
