use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use db::error::DomainError;
use db::models::result::{self, AssessmentType, Column, Entity, Term};
use db::models::{school_class, subject, user};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::results::common::{ResultResponse, ResultsListResponse, SubjectResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListResultsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub subject: Option<String>,
    pub assessment_type: Option<AssessmentType>,
    pub term: Option<Term>,
    pub academic_year: Option<String>,
    pub is_published: Option<bool>,
}

/// GET /api/v1/results
///
/// Role-scoped listing. Student callers only ever see published records,
/// regardless of the filters supplied.
pub async fn list_results(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListResultsQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let mut condition = match result::Model::scope_condition(db, &actor).await {
        Ok(condition) => condition,
        Err(e) => return error_response(e),
    };
    if let Some(student_id) = query.student_id {
        condition = condition.add(Column::StudentId.eq(student_id));
    }
    if let Some(class_id) = query.class_id {
        condition = condition.add(Column::ClassId.eq(class_id));
    }
    if let Some(subject_name) = &query.subject {
        condition = condition.add(Column::Subject.eq(subject_name.as_str()));
    }
    if let Some(assessment_type) = query.assessment_type {
        condition = condition.add(Column::AssessmentType.eq(assessment_type));
    }
    if let Some(term) = query.term {
        condition = condition.add(Column::Term.eq(term));
    }
    if let Some(academic_year) = &query.academic_year {
        condition = condition.add(Column::AcademicYear.eq(academic_year.as_str()));
    }
    if let Some(is_published) = query.is_published {
        // For students the scope already pins this to true; the filter can
        // only narrow further, never widen.
        condition = condition.add(Column::IsPublished.eq(is_published));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let paginator = Entity::find()
        .filter(condition)
        .order_by_asc(Column::Subject)
        .order_by_asc(Column::StudentId)
        .paginate(db, per_page);

    let total = match paginator.num_items().await {
        Ok(total) => total,
        Err(e) => return error_response(DomainError::Db(e)),
    };
    let results = match paginator.fetch_page(page - 1).await {
        Ok(results) => results,
        Err(e) => return error_response(DomainError::Db(e)),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ResultsListResponse {
                results: results.into_iter().map(ResultResponse::from).collect(),
                page,
                per_page,
                total,
            },
            "Results retrieved successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ReportCardQuery {
    /// Defaults to the caller for student tokens.
    pub student_id: Option<i64>,
    pub term: Term,
    pub academic_year: String,
}

/// GET /api/v1/results/report-card
///
/// Published results for one student/term/year grouped per subject with
/// overall totals, gpa, and banded grade.
pub async fn report_card(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ReportCardQuery>,
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
                "You may not view this student's report card",
            ));
        }
        Err(e) => return error_response(DomainError::Db(e)),
    }

    match result::Model::report_card(db, student.id, query.term, &query.academic_year).await {
        Ok(card) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                card,
                "Report card retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassResultsQuery {
    pub class_id: i64,
    pub subject: String,
    pub term: Term,
    pub academic_year: String,
}

/// GET /api/v1/results/class-results
///
/// Class average/highest/lowest percentage and a grade histogram for one
/// class/subject/term/year. Teacher of the class, school admin, or super
/// admin.
pub async fn class_results(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ClassResultsQuery>,
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
            "You may not view this class's results",
        ));
    }

    match result::Model::class_summary(db, class.id, &query.subject, query.term, &query.academic_year)
        .await
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                summary,
                "Class results retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/results/subjects/{school_id}
///
/// Subject catalog for one school; any member of the school.
pub async fn list_subjects(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_same_school(&actor, school_id) {
        return error_response(e);
    }

    match subject::Model::list_for_school(db, school_id).await {
        Ok(subjects) => {
            let subjects: Vec<SubjectResponse> =
                subjects.into_iter().map(SubjectResponse::from).collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    subjects,
                    "Subjects retrieved successfully",
                )),
            )
                .into_response()
        }
        Err(e) => error_response(DomainError::Db(e)),
    }
}
