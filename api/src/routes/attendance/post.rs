use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use db::models::attendance_record::{self, BulkMarkEntry, MarkInput, Status};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::attendance::common::AttendanceResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub student_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub status: Status,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub is_half_day: Option<bool>,
    pub remarks: Option<String>,
    pub period_details: Option<Value>,
}

/// POST /api/v1/attendance/mark
///
/// Record one student's attendance for a date. Teacher of the class only;
/// a second mark for the same (student, class, date) conflicts.
pub async fn mark_attendance(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<MarkAttendanceRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let input = MarkInput {
        student_id: req.student_id,
        date: req.date,
        status: req.status,
        time_in: req.time_in,
        time_out: req.time_out,
        is_half_day: req.is_half_day.unwrap_or(false),
        remarks: req.remarks,
        period_details: req.period_details,
    };

    match attendance_record::Model::mark(db, &actor, req.class_id, input).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceResponse::from(record),
                "Attendance marked successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkMarkRow {
    pub student_id: i64,
    pub status: Status,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkMarkRequest {
    pub class_id: i64,
    pub date: NaiveDate,
    pub records: Vec<BulkMarkRow>,
}

/// POST /api/v1/attendance/mark-bulk
///
/// Mark a whole class for one date. All rows land or none do; any existing
/// record for the class/date rejects the batch with a conflict.
pub async fn mark_attendance_bulk(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<BulkMarkRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let entries = req
        .records
        .into_iter()
        .map(|row| BulkMarkEntry {
            student_id: row.student_id,
            status: row.status,
            remarks: row.remarks,
        })
        .collect();

    match attendance_record::Model::mark_bulk(db, &actor, req.class_id, req.date, entries).await {
        Ok(records) => {
            let records: Vec<AttendanceResponse> =
                records.into_iter().map(AttendanceResponse::from).collect();
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    records,
                    "Attendance marked successfully",
                )),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
