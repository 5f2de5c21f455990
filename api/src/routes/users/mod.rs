use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

mod delete;
mod get;
mod patch;
mod post;

pub use self::delete::delete_user;
pub use get::{get_user, list_classes, list_students, list_teachers, school_stats};
pub use patch::update_user;
pub use post::{create_class, create_student, create_teacher};

pub fn user_management_routes() -> Router<AppState> {
    Router::new()
        .route("/teachers", post(create_teacher))
        .route("/students", post(create_student))
        .route("/classes", post(create_class))
        .route("/schools/{school_id}/teachers", get(list_teachers))
        .route("/schools/{school_id}/students", get(list_students))
        .route("/schools/{school_id}/classes", get(list_classes))
        .route("/schools/{school_id}/stats", get(school_stats))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}", patch(update_user))
        .route("/users/{user_id}", delete(delete_user))
}
