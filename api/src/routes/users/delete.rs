use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;

use db::error::DomainError;
use db::models::user;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, Empty, error_response};
use crate::state::AppState;

/// DELETE /api/v1/user-management/users/{user_id}
///
/// Hard delete. School admin of the target's school or super admin; class
/// links, attendance, and results go with the account via cascading keys.
pub async fn delete_user(
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

    let allowed = match target.school_id {
        Some(school_id) => guards::ensure_school_admin(&actor, school_id),
        None => Err(DomainError::forbidden(
            "Super admin accounts cannot be managed here",
        )),
    };
    if let Err(e) = allowed {
        return error_response(e);
    }

    match user::Entity::delete_by_id(target.id).exec(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "User deleted successfully")),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Db(e)),
    }
}
