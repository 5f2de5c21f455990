use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use db::error::DomainError;
use db::models::attendance_record::{self, Column, Entity, Status};
use db::models::{school_class, user};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::attendance::common::{AttendanceListResponse, AttendanceResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAttendanceQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub status: Option<Status>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/v1/attendance
///
/// Role-scoped listing with filters, pagination, and an aggregate
/// per-status breakdown over everything the filters match.
pub async fn list_attendance(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListAttendanceQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let mut condition = match attendance_record::Model::scope_condition(db, &actor).await {
        Ok(condition) => condition,
        Err(e) => return error_response(e),
    };
    if let Some(student_id) = query.student_id {
        condition = condition.add(Column::StudentId.eq(student_id));
    }
    if let Some(class_id) = query.class_id {
        condition = condition.add(Column::ClassId.eq(class_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }
    if let Some(from) = query.from {
        condition = condition.add(Column::Date.gte(from));
    }
    if let Some(to) = query.to {
        condition = condition.add(Column::Date.lte(to));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let paginator = Entity::find()
        .filter(condition.clone())
        .order_by_desc(Column::Date)
        .order_by_asc(Column::StudentId)
        .paginate(db, per_page);

    let total = match paginator.num_items().await {
        Ok(total) => total,
        Err(e) => return error_response(DomainError::Db(e)),
    };
    let records = match paginator.fetch_page(page - 1).await {
        Ok(records) => records,
        Err(e) => return error_response(DomainError::Db(e)),
    };

    let breakdown = match attendance_record::Model::status_breakdown(db, condition).await {
        Ok(breakdown) => breakdown,
        Err(e) => return error_response(DomainError::Db(e)),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AttendanceListResponse {
                records: records.into_iter().map(AttendanceResponse::from).collect(),
                page,
                per_page,
                total,
                breakdown,
            },
            "Attendance retrieved successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct StudentStatsQuery {
    /// Defaults to the caller for student tokens.
    pub student_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/v1/attendance/student-stats
///
/// Per-status counts and rate for one student. Students see only
/// themselves; teachers only students of classes they teach.
pub async fn student_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<StudentStatsQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let student_id = match query.student_id {
        Some(student_id) => student_id,
        None if actor.role == user::Role::Student => actor.id,
        None => {
            return error_response(DomainError::invalid("student_id is required"));
        }
    };

    let student = match user::Entity::find_by_id(student_id).one(db).await {
        Ok(Some(student)) => student,
        Ok(None) => return error_response(DomainError::not_found("Student not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    match user::Model::can_view_student(db, &actor, &student).await {
        Ok(true) => {}
        Ok(false) => {
            return error_response(DomainError::forbidden(
                "You may not view this student's attendance",
            ));
        }
        Err(e) => return error_response(DomainError::Db(e)),
    }

    let mut condition = sea_orm::Condition::all().add(Column::StudentId.eq(student.id));
    if let Some(from) = query.from {
        condition = condition.add(Column::Date.gte(from));
    }
    if let Some(to) = query.to {
        condition = condition.add(Column::Date.lte(to));
    }

    match attendance_record::Model::status_breakdown(db, condition).await {
        Ok(breakdown) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                breakdown,
                "Student stats retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Db(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassReportQuery {
    pub class_id: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/v1/attendance/class-report
///
/// Per-student breakdowns and the class average rate over a date range.
/// Teacher of the class, school admin of its school, or super admin.
pub async fn class_report(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ClassReportQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let class = match school_class::Entity::find_by_id(query.class_id).one(db).await {
        Ok(Some(class)) => class,
        Ok(None) => return error_response(DomainError::not_found("Class not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    let allowed = match actor.role {
        user::Role::SuperAdmin => true,
        user::Role::SchoolAdmin => actor.school_id == Some(class.school_id),
        user::Role::Teacher => {
            match school_class::Model::teaches(db, actor.id, class.id).await {
                Ok(teaches) => teaches,
                Err(e) => return error_response(DomainError::Db(e)),
            }
        }
        user::Role::Student => false,
    };
    if !allowed {
        return error_response(DomainError::forbidden(
            "You may not view this class's attendance report",
        ));
    }

    match attendance_record::Model::class_report(db, class.id, query.from, query.to).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                report,
                "Class report retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
