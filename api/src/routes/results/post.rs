use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use common::format_validation_errors;
use db::models::result::{self, AssessmentType, BulkResultEntry, NewResult, Term};
use db::models::subject;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::results::common::{ResultResponse, SubjectResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateResultRequest {
    pub student_id: i64,
    pub class_id: i64,
    pub subject: String,
    pub assessment_type: AssessmentType,
    pub term: Term,
    pub academic_year: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub is_published: Option<bool>,
    pub remarks: Option<String>,
}

/// POST /api/v1/results
///
/// Record one assessment result. Teacher of the class only; duplicate
/// (student, subject, assessment, term, year) conflicts. Percentage, grade,
/// and gpa are derived server-side.
pub async fn create_result(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateResultRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let input = NewResult {
        student_id: req.student_id,
        class_id: req.class_id,
        subject: req.subject,
        assessment_type: req.assessment_type,
        term: req.term,
        academic_year: req.academic_year,
        marks_obtained: req.marks_obtained,
        total_marks: req.total_marks,
        is_published: req.is_published.unwrap_or(false),
        remarks: req.remarks,
    };

    match result::Model::create(db, &actor, input).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                ResultResponse::from(created),
                "Result recorded successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkResultRow {
    pub student_id: i64,
    pub marks_obtained: f64,
}

#[derive(Debug, Deserialize)]
pub struct BulkResultsRequest {
    pub class_id: i64,
    pub subject: String,
    pub assessment_type: AssessmentType,
    pub term: Term,
    pub academic_year: String,
    pub total_marks: f64,
    pub is_published: Option<bool>,
    pub results: Vec<BulkResultRow>,
}

/// POST /api/v1/results/bulk
///
/// Record one assessment for many students of a class; all rows land or
/// none do.
pub async fn create_results_bulk(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<BulkResultsRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let entries = req
        .results
        .into_iter()
        .map(|row| BulkResultEntry {
            student_id: row.student_id,
            marks_obtained: row.marks_obtained,
        })
        .collect();

    match result::Model::create_bulk(
        db,
        &actor,
        req.class_id,
        &req.subject,
        req.assessment_type,
        req.term,
        &req.academic_year,
        req.total_marks,
        req.is_published.unwrap_or(false),
        entries,
    )
    .await
    {
        Ok(created) => {
            let results: Vec<ResultResponse> =
                created.into_iter().map(ResultResponse::from).collect();
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    results,
                    "Results recorded successfully",
                )),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    pub school_id: i64,

    #[validate(length(min = 1, message = "Subject name must not be empty"))]
    pub name: String,

    #[validate(length(min = 2, max = 10, message = "Subject code must be 2-10 characters"))]
    pub code: String,

    #[validate(range(min = 1, max = 13, message = "Grade level must be 1-13"))]
    pub grade_level: i32,

    pub max_marks: Option<i32>,
    pub pass_marks: Option<i32>,
    pub grade_scale: Option<Value>,
}

/// POST /api/v1/results/subjects
///
/// Create a subject catalog entry. School admin of that school only; the
/// code must be unique within the school.
pub async fn create_subject(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateSubjectRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_school_admin(&actor, req.school_id) {
        return error_response(e);
    }

    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<SubjectResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    match subject::Model::create(
        db,
        req.school_id,
        &req.name,
        &req.code,
        req.grade_level,
        req.max_marks.unwrap_or(100),
        req.pass_marks.unwrap_or(35),
        req.grade_scale,
    )
    .await
    {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SubjectResponse::from(created),
                "Subject created successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
