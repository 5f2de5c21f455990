use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;

use db::error::DomainError;
use db::models::attendance_record;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, Empty, error_response};
use crate::state::AppState;

/// DELETE /api/v1/attendance/{attendance_id}
///
/// Hard delete by the original marker or a school admin of the same school.
pub async fn delete_attendance(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(attendance_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let record = match attendance_record::Entity::find_by_id(attendance_id).one(db).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(DomainError::not_found("Attendance record not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    if let Err(e) = attendance_record::Model::authorize_modify(&actor, &record) {
        return error_response(e);
    }

    match attendance_record::Entity::delete_by_id(record.id).exec(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Empty,
                "Attendance record deleted successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Db(e)),
    }
}
