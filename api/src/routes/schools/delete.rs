use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;

use db::models::school;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, Empty, error_response};
use crate::state::AppState;

/// DELETE /api/v1/schools/{school_id}
///
/// Hard delete of a tenant and, via cascading foreign keys, everything it
/// owns. Super admin only.
pub async fn delete_school(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_super_admin(&actor) {
        return error_response(e);
    }

    match school::Entity::find_by_id(school_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("School not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(format!("Database error: {}", e))),
            )
                .into_response();
        }
    }

    match school::Entity::delete_by_id(school_id).exec(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "School deleted successfully")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Database error: {}", e))),
        )
            .into_response(),
    }
}
