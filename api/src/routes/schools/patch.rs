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
use validator::Validate;

use common::format_validation_errors;
use db::models::school;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::schools::common::SchoolResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSchoolRequest {
    #[validate(length(min = 2, message = "School name must be at least 2 characters"))]
    pub name: Option<String>,

    pub address: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub academic_year: Option<String>,
    pub term_system: Option<String>,
    pub grading_system: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Attendance threshold must be 0-100"))]
    pub attendance_threshold: Option<i32>,
}

/// PATCH /api/v1/schools/{school_id}
///
/// Partial update of the tenant record. Super admin only; the school code
/// itself is immutable.
pub async fn update_school(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
    Json(req): Json<UpdateSchoolRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_super_admin(&actor) {
        return error_response(e);
    }

    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<SchoolResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    let school = match school::Entity::find_by_id(school_id).one(db).await {
        Ok(Some(school)) => school,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<SchoolResponse>::error("School not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<SchoolResponse>::error(format!(
                    "Database error: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    let mut active: school::ActiveModel = school.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(address) = req.address {
        active.address = Set(Some(address));
    }
    if let Some(email) = req.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = req.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(academic_year) = req.academic_year {
        active.academic_year = Set(academic_year);
    }
    if let Some(term_system) = req.term_system {
        active.term_system = Set(term_system);
    }
    if let Some(grading_system) = req.grading_system {
        active.grading_system = Set(grading_system);
    }
    if let Some(threshold) = req.attendance_threshold {
        active.attendance_threshold = Set(threshold);
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SchoolResponse::from(updated),
                "School updated successfully",
            )),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<SchoolResponse>::error(format!(
                "Database error: {}",
                e
            ))),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SmsQuotaRequest {
    #[validate(range(min = 0, message = "Monthly limit must not be negative"))]
    pub monthly_limit: Option<i32>,

    /// Zero the usage counter immediately.
    pub reset_usage: Option<bool>,
}

/// PATCH /api/v1/schools/{school_id}/sms-quota
///
/// Adjust the SMS quota counter. Super admin or that school's admin.
pub async fn update_sms_quota(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
    Json(req): Json<SmsQuotaRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_school_admin(&actor, school_id) {
        return error_response(e);
    }

    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<SchoolResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    let school = match school::Entity::find_by_id(school_id).one(db).await {
        Ok(Some(school)) => school,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<SchoolResponse>::error("School not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<SchoolResponse>::error(format!(
                    "Database error: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    let mut active: school::ActiveModel = school.into();
    if let Some(limit) = req.monthly_limit {
        active.sms_monthly_limit = Set(limit);
    }
    if req.reset_usage.unwrap_or(false) {
        active.sms_used = Set(0);
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SchoolResponse::from(updated),
                "SMS quota updated successfully",
            )),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<SchoolResponse>::error(format!(
                "Database error: {}",
                e
            ))),
        )
            .into_response(),
    }
}
