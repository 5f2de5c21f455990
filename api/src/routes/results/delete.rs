use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;

use db::error::DomainError;
use db::models::result;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, Empty, error_response};
use crate::state::AppState;

/// DELETE /api/v1/results/{result_id}
///
/// Hard delete by the authoring teacher or a school admin; the revision
/// trail goes with the record.
pub async fn delete_result(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(result_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let record = match result::Entity::find_by_id(result_id).one(db).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(DomainError::not_found("Result not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    if let Err(e) = result::Model::authorize_modify(&actor, &record) {
        return error_response(e);
    }

    match result::Entity::delete_by_id(record.id).exec(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Result deleted successfully")),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Db(e)),
    }
}
