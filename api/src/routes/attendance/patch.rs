use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde::Deserialize;
use serde_json::Value;

use db::error::DomainError;
use db::models::attendance_record::{self, Status};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::attendance::common::AttendanceResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub status: Option<Status>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub is_half_day: Option<bool>,
    pub remarks: Option<String>,
    pub period_details: Option<Value>,
}

/// PATCH /api/v1/attendance/{attendance_id}
///
/// Field patch by the original marker or a school admin of the same school;
/// re-stamps `updated_at`.
pub async fn update_attendance(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(attendance_id): Path<i64>,
    Json(req): Json<UpdateAttendanceRequest>,
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

    let mut active: attendance_record::ActiveModel = record.into();
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    if let Some(time_in) = req.time_in {
        active.time_in = Set(Some(time_in));
    }
    if let Some(time_out) = req.time_out {
        active.time_out = Set(Some(time_out));
    }
    if let Some(is_half_day) = req.is_half_day {
        active.is_half_day = Set(is_half_day);
    }
    if let Some(remarks) = req.remarks {
        active.remarks = Set(Some(remarks));
    }
    if let Some(period_details) = req.period_details {
        active.period_details = Set(Some(period_details));
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceResponse::from(updated),
                "Attendance updated successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Db(e)),
    }
}
