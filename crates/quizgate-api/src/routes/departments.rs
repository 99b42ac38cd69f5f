//! Routes for browsing departments.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use quizgate_content::application::query_handlers::{self, DepartmentView};
use quizgate_core::ids::DepartmentId;
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for GET /{department_id}/link.
#[derive(Debug, Serialize)]
pub struct DepartmentLinkResponse {
    /// The department.
    pub department_id: DepartmentId,
    /// Deep link that opens the department directly.
    pub link: String,
}

/// GET /
#[instrument(skip(state))]
async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentView>>, ApiError> {
    let departments = query_handlers::list_departments(&*state.content).await?;
    Ok(Json(departments))
}

/// GET /{department_id}/link
#[instrument(skip(state))]
async fn department_link(
    State(state): State<AppState>,
    Path(department_id): Path<String>,
) -> Result<Json<DepartmentLinkResponse>, ApiError> {
    let department_id = DepartmentId::new(&department_id)?;
    let department =
        query_handlers::require_playable_department(&department_id, &*state.content).await?;
    Ok(Json(DepartmentLinkResponse {
        link: state.links.department_link(&department.id),
        department_id: department.id,
    }))
}

/// Returns the router for department browsing.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments))
        .route("/{department_id}/link", get(department_link))
}
