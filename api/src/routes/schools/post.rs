use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use common::format_validation_errors;
use db::models::school;

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::schools::common::SchoolResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSchoolRequest {
    #[validate(length(min = 2, message = "School name must be at least 2 characters"))]
    pub name: String,

    #[validate(length(min = 2, max = 10, message = "School code must be 2-10 characters"))]
    pub code: String,

    pub address: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub phone: Option<String>,
}

/// POST /api/v1/schools
///
/// Create a tenant. Super admin only; the school code must be unique.
pub async fn create_school(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateSchoolRequest>,
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

    match school::Model::create(
        db,
        &req.name,
        &req.code,
        req.address.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .await
    {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SchoolResponse::from(created),
                "School created successfully",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
