use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use db::models::school::{self, Column as SchoolColumn, Entity as SchoolEntity};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::schools::common::SchoolResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSchoolsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive partial match against name or code.
    pub query: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SchoolsListResponse {
    pub schools: Vec<SchoolResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// GET /api/v1/schools
///
/// Paginated tenant list with optional filtering and sorting. Super admin
/// only.
///
/// ### Query Parameters
/// - `page` (default 1), `per_page` (default 20, max 100)
/// - `query`: partial match on name or code
/// - `sort`: comma-separated fields, `-` prefix for descending
pub async fn list_schools(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListSchoolsQuery>,
) -> impl IntoResponse {
    let db = state.db();

    let actor = match guards::load_actor(db, &claims).await {
        Ok(actor) => actor,
        Err(e) => return error_response(e),
    };
    if let Err(e) = guards::ensure_super_admin(&actor) {
        return error_response(e);
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut condition = Condition::all();
    if let Some(q) = &query.query {
        let pattern = q.to_lowercase();
        condition = condition.add(
            Condition::any()
                .add(SchoolColumn::Name.contains(&pattern))
                .add(SchoolColumn::Code.contains(&pattern)),
        );
    }

    let mut query_builder = SchoolEntity::find().filter(condition);

    if let Some(sort_param) = &query.sort {
        for sort_field in sort_param.split(',') {
            let (field, desc) = if let Some(stripped) = sort_field.strip_prefix('-') {
                (stripped, true)
            } else {
                (sort_field, false)
            };

            let column = match field {
                "name" => SchoolColumn::Name,
                "code" => SchoolColumn::Code,
                "created_at" => SchoolColumn::CreatedAt,
                _ => continue,
            };
            query_builder = if desc {
                query_builder.order_by_desc(column)
            } else {
                query_builder.order_by_asc(column)
            };
        }
    } else {
        query_builder = query_builder.order_by_asc(SchoolColumn::Id);
    }

    let paginator = query_builder.paginate(db, per_page);
    let total = paginator.num_items().await.unwrap_or(0);
    let schools = paginator.fetch_page(page - 1).await.unwrap_or_default();
    let schools = schools.into_iter().map(SchoolResponse::from).collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            SchoolsListResponse {
                schools,
                page,
                per_page,
                total,
            },
            "Schools retrieved successfully",
        )),
    )
        .into_response()
}

/// GET /api/v1/schools/{school_id}
///
/// One school; super admin or an admin of that school.
pub async fn get_school(
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

    match SchoolEntity::find_by_id(school_id).one(db).await {
        Ok(Some(school)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SchoolResponse::from(school),
                "School retrieved successfully",
            )),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<SchoolResponse>::error("School not found")),
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

/// GET /api/v1/schools/{school_id}/stats
///
/// Teacher/student/class counts plus the SMS usage snapshot.
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
