//! Public project reads, served from the query cache

use axum::{
    extract::{Path, State},
    Json,
};
use folio_common::{db::models::Project, errors::Result};

use crate::AppState;

/// All projects, newest first
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    let projects = state.cache.list().await?;
    Ok(Json(projects.to_vec()))
}

/// Featured projects, newest first
pub async fn list_featured(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    let projects = state.cache.list_featured().await?;
    Ok(Json(projects.to_vec()))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Project>> {
    let project = state.cache.get(id).await?;
    Ok(Json(Project::clone(&project)))
}
