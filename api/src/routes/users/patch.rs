use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use validator::Validate;

use common::format_validation_errors;
use db::error::DomainError;
use db::models::{class_student, school_class, user};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::UserResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub employee_id: Option<String>,
    pub student_no: Option<String>,

    /// Re-enrolls a student into another class of the same school. Existing
    /// attendance and result rows keep their original class.
    pub class_id: Option<i64>,

    pub role: Option<user::Role>,
}

/// PATCH /api/v1/user-management/users/{user_id}
///
/// Partial update. School admin of the target's school or super admin;
/// nobody can be promoted to super admin this way.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
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

    let target_school = match target.school_id {
        Some(school_id) => school_id,
        None => {
            return error_response(DomainError::forbidden(
                "Super admin accounts cannot be managed here",
            ));
        }
    };
    if let Err(e) = guards::ensure_school_admin(&actor, target_school) {
        return error_response(e);
    }

    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<UserResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    if req.role == Some(user::Role::SuperAdmin) {
        return error_response(DomainError::forbidden(
            "Users cannot be promoted to super admin",
        ));
    }

    // A class move re-rosters the student; historical records are left on
    // the old class.
    if let Some(new_class_id) = req.class_id {
        if target.role != user::Role::Student {
            return error_response(DomainError::invalid(
                "Only students can be assigned to a class",
            ));
        }
        let class = match school_class::Entity::find_by_id(new_class_id).one(db).await {
            Ok(Some(class)) => class,
            Ok(None) => return error_response(DomainError::not_found("Class not found")),
            Err(e) => return error_response(DomainError::Db(e)),
        };
        if Some(class.school_id) != target.school_id {
            return error_response(DomainError::invalid(
                "Class does not belong to the student's school",
            ));
        }

        if let Err(e) = class_student::Entity::delete_many()
            .filter(class_student::Column::StudentId.eq(target.id))
            .exec(db)
            .await
        {
            return error_response(DomainError::Db(e));
        }
        if let Err(e) = school_class::Model::enroll_student(db, new_class_id, target.id).await {
            return error_response(DomainError::Db(e));
        }
    }

    let mut active: user::ActiveModel = target.into();
    if let Some(email) = req.email {
        active.email = Set(email);
    }
    if let Some(phone) = req.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(employee_id) = req.employee_id {
        active.employee_id = Set(Some(employee_id));
    }
    if let Some(student_no) = req.student_no {
        active.student_no = Set(Some(student_no));
    }
    if let Some(class_id) = req.class_id {
        active.class_id = Set(Some(class_id));
    }
    if let Some(role) = req.role {
        active.role = Set(role);
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                UserResponse::from(updated),
                "User updated successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("users.email") {
                return error_response(DomainError::conflict(
                    "A user with this email already exists",
                ));
            }
            error_response(DomainError::Db(e))
        }
    }
}
