use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::EntityTrait;
use serde::Deserialize;
use validator::Validate;

use common::format_validation_errors;
use db::error::DomainError;
use db::models::{school, school_class, user};

use crate::auth::{AuthUser, guards};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::{ClassResponse, UserResponse};
use crate::state::AppState;

/// Duplicate-username/email translation shared by the create handlers.
fn user_insert_error(e: sea_orm::DbErr) -> DomainError {
    let msg = e.to_string();
    if msg.contains("users.email") {
        return DomainError::conflict("A user with this email already exists");
    }
    if msg.contains("users.username") {
        return DomainError::conflict("A user with this username already exists");
    }
    DomainError::Db(e)
}

async fn check_is_teacher_of_school(
    db: &sea_orm::DatabaseConnection,
    teacher_id: i64,
    school_id: i64,
) -> Result<user::Model, DomainError> {
    let teacher = user::Entity::find_by_id(teacher_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Teacher not found"))?;
    if teacher.role != user::Role::Teacher || teacher.school_id != Some(school_id) {
        return Err(DomainError::invalid(
            "Referenced teacher does not belong to this school",
        ));
    }
    Ok(teacher)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeacherRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub school_id: i64,

    #[validate(length(min = 1, message = "Employee id must not be empty"))]
    pub employee_id: String,

    pub phone: Option<String>,

    /// Classes this teacher joins as subject staff.
    pub subject_classes: Option<Vec<i64>>,
}

/// POST /api/v1/user-management/teachers
///
/// Create a teacher account for a school. School admin of that school or
/// super admin.
pub async fn create_teacher(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateTeacherRequest>,
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
            Json(ApiResponse::<UserResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    // Every listed class must exist within this school.
    if let Some(class_ids) = &req.subject_classes {
        for class_id in class_ids {
            match school_class::Entity::find_by_id(*class_id).one(db).await {
                Ok(Some(class)) if class.school_id == req.school_id => {}
                Ok(_) => {
                    return error_response(DomainError::invalid(format!(
                        "Class {} does not belong to this school",
                        class_id
                    )));
                }
                Err(e) => return error_response(DomainError::Db(e)),
            }
        }
    }

    let created = match user::Model::create_teacher(
        db,
        &req.username,
        &req.email,
        &req.password,
        req.school_id,
        &req.employee_id,
        req.phone.as_deref(),
    )
    .await
    {
        Ok(created) => created,
        Err(e) => return error_response(user_insert_error(e)),
    };

    if let Some(class_ids) = &req.subject_classes {
        for class_id in class_ids {
            if let Err(e) =
                school_class::Model::add_subject_teacher(db, *class_id, created.id).await
            {
                return error_response(DomainError::Db(e));
            }
        }
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            UserResponse::from(created),
            "Teacher created successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub school_id: i64,

    #[validate(length(min = 1, message = "Student number must not be empty"))]
    pub student_no: String,

    /// The single class the student is enrolled in.
    pub class_id: i64,

    pub phone: Option<String>,
}

/// POST /api/v1/user-management/students
///
/// Create a student enrolled in exactly one existing class of the school.
pub async fn create_student(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateStudentRequest>,
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
            Json(ApiResponse::<UserResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    let class = match school_class::Entity::find_by_id(req.class_id).one(db).await {
        Ok(Some(class)) => class,
        Ok(None) => return error_response(DomainError::not_found("Class not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };
    if class.school_id != req.school_id {
        return error_response(DomainError::invalid(
            "Class does not belong to this school",
        ));
    }

    let created = match user::Model::create_student(
        db,
        &req.username,
        &req.email,
        &req.password,
        req.school_id,
        &req.student_no,
        req.class_id,
        req.phone.as_deref(),
    )
    .await
    {
        Ok(created) => created,
        Err(e) => return error_response(user_insert_error(e)),
    };

    if let Err(e) = school_class::Model::enroll_student(db, req.class_id, created.id).await {
        return error_response(DomainError::Db(e));
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            UserResponse::from(created),
            "Student created successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct SubjectEntry {
    pub name: String,
    pub teacher_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    pub school_id: i64,

    #[validate(length(min = 1, message = "Class name must not be empty"))]
    pub name: String,

    #[validate(range(min = 1, max = 13, message = "Grade level must be 1-13"))]
    pub grade_level: i32,

    pub class_teacher_id: i64,

    pub academic_year: Option<String>,

    /// Additional subject staff beyond the class teacher.
    pub subject_teachers: Option<Vec<i64>>,

    /// Subjects taught in the class, each naming its own teacher.
    pub subjects: Option<Vec<SubjectEntry>>,
}

/// POST /api/v1/user-management/classes
///
/// Create a class with its teacher links. Every referenced teacher must
/// belong to the school.
pub async fn create_class(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateClassRequest>,
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
            Json(ApiResponse::<ClassResponse>::error(
                format_validation_errors(&e),
            )),
        )
            .into_response();
    }

    let school = match school::Entity::find_by_id(req.school_id).one(db).await {
        Ok(Some(school)) => school,
        Ok(None) => return error_response(DomainError::not_found("School not found")),
        Err(e) => return error_response(DomainError::Db(e)),
    };

    if let Err(e) = check_is_teacher_of_school(db, req.class_teacher_id, req.school_id).await {
        return error_response(e);
    }
    for teacher_id in req.subject_teachers.iter().flatten() {
        if let Err(e) = check_is_teacher_of_school(db, *teacher_id, req.school_id).await {
            return error_response(e);
        }
    }
    for subject in req.subjects.iter().flatten() {
        if let Err(e) = check_is_teacher_of_school(db, subject.teacher_id, req.school_id).await {
            return error_response(e);
        }
    }

    let academic_year = req
        .academic_year
        .clone()
        .unwrap_or_else(|| school.academic_year.clone());

    let created = match school_class::Model::create(
        db,
        req.school_id,
        &req.name,
        req.grade_level,
        req.class_teacher_id,
        &academic_year,
    )
    .await
    {
        Ok(created) => created,
        Err(e) => return error_response(DomainError::Db(e)),
    };

    for teacher_id in req.subject_teachers.iter().flatten() {
        if let Err(e) = school_class::Model::add_subject_teacher(db, created.id, *teacher_id).await
        {
            return error_response(DomainError::Db(e));
        }
    }
    for subject in req.subjects.iter().flatten() {
        if let Err(e) =
            school_class::Model::add_subject(db, created.id, &subject.name, subject.teacher_id)
                .await
        {
            return error_response(DomainError::Db(e));
        }
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            ClassResponse::from(created),
            "Class created successfully",
        )),
    )
        .into_response()
}
