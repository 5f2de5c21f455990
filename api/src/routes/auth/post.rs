use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

use common::format_validation_errors;
use db::models::{school, user};

use crate::auth::{AuthUser, generate_jwt, guards::load_actor};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::UserResponse;
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref USERNAME_REGEX: regex::Regex =
        regex::Regex::new("^[a-z0-9_.]{3,32}$").unwrap();
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: user::Role,

    pub school_id: Option<i64>,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// POST /api/v1/auth/register
///
/// Provision an account. School-scoped roles require an existing school;
/// a super admin may only be registered while none exists yet (bootstrap).
///
/// ### Responses
/// - `201 Created` with token and profile
/// - `400 Bad Request` (validation failure, missing school)
/// - `404 Not Found` (school does not exist)
/// - `409 Conflict` (duplicate username/email)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let db = state.db();

    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }
    if !USERNAME_REGEX.is_match(&req.username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthResponse>::error(
                "Username must be 3-32 lowercase letters, digits, dots or underscores",
            )),
        )
            .into_response();
    }

    match req.role {
        user::Role::SuperAdmin => {
            let existing = user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::SuperAdmin))
                .count(db)
                .await
                .unwrap_or(0);
            if existing > 0 {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::<AuthResponse>::error(
                        "A super admin already exists",
                    )),
                )
                    .into_response();
            }
        }
        _ => {
            let Some(school_id) = req.school_id else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<AuthResponse>::error(
                        "school_id is required for this role",
                    )),
                )
                    .into_response();
            };
            match school::Entity::find_by_id(school_id).one(db).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(ApiResponse::<AuthResponse>::error("School not found")),
                    )
                        .into_response();
                }
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::<AuthResponse>::error(format!(
                            "Database error: {}",
                            e
                        ))),
                    )
                        .into_response();
                }
            }
        }
    }

    match user::Model::create(
        db,
        &req.username,
        &req.email,
        &req.password,
        req.role,
        req.school_id,
    )
    .await
    {
        Ok(created) => {
            let (token, expires_at) = generate_jwt(&created);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    AuthResponse {
                        token,
                        expires_at,
                        user: UserResponse::from(created),
                    },
                    "User registered successfully",
                )),
            )
                .into_response()
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("users.email") {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::<AuthResponse>::error(
                        "A user with this email already exists",
                    )),
                )
                    .into_response();
            }
            if msg.contains("users.username") {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::<AuthResponse>::error(
                        "A user with this username already exists",
                    )),
                )
                    .into_response();
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<AuthResponse>::error(format!(
                    "Database error: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// Authenticate an existing user and issue a JWT.
///
/// ### Responses
/// - `200 OK` with token and profile
/// - `401 Unauthorized` (unknown user or wrong password)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let db = state.db();

    let user = match user::Model::find_by_username(db, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<AuthResponse>::error("Invalid credentials")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<AuthResponse>::error(format!(
                    "Database error: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    if !user.verify_password(&req.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<AuthResponse>::error("Invalid credentials")),
        )
            .into_response();
    }

    let (token, expires_at) = generate_jwt(&user);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AuthResponse {
                token,
                expires_at,
                user: UserResponse::from(user),
            },
            "Login successful",
        )),
    )
        .into_response()
}

/// POST /api/v1/auth/refresh
///
/// Issue a fresh token for the bearer of a still-valid one. The user is
/// re-loaded so deleted accounts cannot refresh.
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> impl IntoResponse {
    let db = state.db();

    let user = match load_actor(db, &claims).await {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let (token, expires_at) = generate_jwt(&user);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AuthResponse {
                token,
                expires_at,
                user: UserResponse::from(user),
            },
            "Token refreshed",
        )),
    )
        .into_response()
}
