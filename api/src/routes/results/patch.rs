use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum::http::StatusCode;
use serde::Deserialize;

use db::models::result::{self, UpdateResult};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::results::common::ResultResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateResultRequest {
    pub marks_obtained: Option<f64>,
    pub total_marks: Option<f64>,
    /// Required whenever `marks_obtained` changes; recorded in the revision
    /// trail.
    pub reason: Option<String>,
    pub is_published: Option<bool>,
    pub remarks: Option<String>,
}

/// PATCH /api/v1/results/{result_id}
///
/// Patch a result. The authoring teacher or a school admin of the same
/// school; a mark change recomputes the derived fields and appends one
/// revision entry.
pub async fn update_result(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(result_id): Path<i64>,
    Json(req): Json<UpdateResultRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let patch = UpdateResult {
        marks_obtained: req.marks_obtained,
        total_marks: req.total_marks,
        reason: req.reason,
        is_published: req.is_published,
        remarks: req.remarks,
    };

    match result::Model::apply_update(db, &actor, result_id, patch).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ResultResponse::from(updated),
                "Result updated successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
