use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use db::error::DomainError;
use db::models::{school, school_class, user};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::{ClassResponse, PageQuery, UserResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<UserResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

async fn list_school_users_by_role(
    state: &AppState,
    claims: &crate::auth::Claims,
    school_id: i64,
    role: user::Role,
    page_query: &PageQuery,
) -> Result<UsersListResponse, DomainError> {
    let db = state.db();

    let actor = guards::load_actor(db, claims).await?;
    guards::ensure_same_school(&actor, school_id)?;

    let (page, per_page) = page_query.resolve();

    let paginator = user::Entity::find()
        .filter(user::Column::SchoolId.eq(school_id))
        .filter(user::Column::Role.eq(role))
        .order_by_asc(user::Column::Username)
        .paginate(db, per_page);

    let total = paginator.num_items().await?;
    let users = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(UsersListResponse {
        users,
        page,
        per_page,
        total,
    })
}

/// GET /api/v1/user-management/schools/{school_id}/teachers
pub async fn list_teachers(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
    Query(page_query): Query<PageQuery>,
) -> impl IntoResponse {
    match list_school_users_by_role(&state, &claims, school_id, user::Role::Teacher, &page_query)
        .await
    {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(list, "Teachers retrieved successfully")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/user-management/schools/{school_id}/students
pub async fn list_students(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
    Query(page_query): Query<PageQuery>,
) -> impl IntoResponse {
    match list_school_users_by_role(&state, &claims, school_id, user::Role::Student, &page_query)
        .await
    {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(list, "Students retrieved successfully")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Serialize)]
pub struct ClassesListResponse {
    pub classes: Vec<ClassResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// GET /api/v1/user-management/schools/{school_id}/classes
pub async fn list_classes(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
    Query(page_query): Query<PageQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_same_school(&actor, school_id) {
        return error_response(e);
    }

    let (page, per_page) = page_query.resolve();

    let paginator = school_class::Entity::find()
        .filter(school_class::Column::SchoolId.eq(school_id))
        .order_by_asc(school_class::Column::GradeLevel)
        .order_by_asc(school_class::Column::Name)
        .paginate(db, per_page);

    let total = match paginator.num_items().await {
        Ok(total) => total,
        Err(e) => return error_response(DomainError::Db(e)),
    };
    let classes = match paginator.fetch_page(page - 1).await {
        Ok(classes) => classes,
        Err(e) => return error_response(DomainError::Db(e)),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ClassesListResponse {
                classes: classes.into_iter().map(ClassResponse::from).collect(),
                page,
                per_page,
                total,
            },
            "Classes retrieved successfully",
        )),
    )
        .into_response()
}

/// GET /api/v1/user-management/schools/{school_id}/stats
///
/// Same aggregate counters as the school stats endpoint, scoped the same
/// way (super admin or that school's admin).
pub async fn school_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(school_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_school_admin(&actor, school_id) {
        return error_response(e);
    }

    match school::Model::stats(db, school_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                stats,
                "School stats retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/user-management/users/{user_id}
///
/// One user: self, a school admin of the same school, or a super admin.
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };

    let target = match user::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(target)) => target,
        Ok(None) => return error_response(DomainError::not_found("User not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    let allowed = actor.id == target.id
        || actor.role == user::Role::SuperAdmin
        || (actor.role == user::Role::SchoolAdmin
            && actor.school_id.is_some()
            && actor.school_id == target.school_id);
    if !allowed {
        return error_response(DomainError::forbidden("You may not view this user"));
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from(target),
            "User retrieved successfully",
        )),
    )
        .into_response()
}
