use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{AuthUser, guards::load_actor};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::UserResponse;
use crate::state::AppState;

/// GET /api/v1/auth/profile
///
/// The authenticated caller's own user record.
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> impl IntoResponse {
    let db = state.db();

    match load_actor(db, &claims).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                UserResponse::from(user),
                "Profile retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
