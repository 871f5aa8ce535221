//! Admin handlers
//!
//! Login issues a session token; every other handler requires one through
//! the `AdminSession` extractor. Writes go through the query cache so the
//! public reads see them immediately.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use folio_common::{
    auth::{credentials_match, SessionToken},
    db::models::{NewProject, Project, ProjectPatch},
    db::SeedOutcome,
    errors::{AppError, Result},
    metrics,
};
use serde::{Deserialize, Serialize};

use crate::middleware::auth::AdminSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub file_name: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub url: String,
}

/// Check the admin credentials and issue a session token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if !credentials_match(&state.config.admin, &request.email, &request.password) {
        metrics::record_login(false);
        tracing::warn!(email = %request.email, "Admin login rejected");
        return Err(AppError::Unauthorized {
            message: "Invalid email or password".to_string(),
        });
    }

    let token = SessionToken::issue(request.email, Utc::now());
    metrics::record_login(true);
    tracing::info!(email = %token.email, "Admin token issued");

    Ok(Json(LoginResponse {
        token: token.encode(),
        expires_at: token.expires_at(state.config.session.ttl()),
    }))
}

pub async fn create_project(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Json(project): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>)> {
    let created = state.cache.create(project).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_project(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>> {
    let updated = state.cache.update(id, patch).await?;
    Ok(Json(updated))
}

pub async fn delete_project(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.cache.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Raw request body is the image; `file_name` supplies the extension
pub async fn upload_image(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    if body.is_empty() {
        return Err(AppError::Validation {
            message: "Image body is empty".to_string(),
            field: Some("body".to_string()),
        });
    }

    let url = state
        .cache
        .upload_image(id, &params.file_name, body.to_vec())
        .await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

pub async fn delete_image(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Json(request): Json<DeleteImageRequest>,
) -> Result<StatusCode> {
    state.cache.delete_image(&request.url).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Insert the sample projects into an empty table
pub async fn seed(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<SeedOutcome>> {
    let outcome = state.cache.seed_samples().await?;
    Ok(Json(outcome))
}
