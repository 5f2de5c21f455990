use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

mod common;
mod delete;
mod get;
mod patch;
mod post;

pub use self::delete::delete_attendance;
pub use get::{class_report, list_attendance, student_stats};
pub use patch::update_attendance;
pub use post::{mark_attendance, mark_attendance_bulk};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/mark", post(mark_attendance))
        .route("/mark-bulk", post(mark_attendance_bulk))
        .route("/", get(list_attendance))
        .route("/student-stats", get(student_stats))
        .route("/class-report", get(class_report))
        .route("/{attendance_id}", patch(update_attendance))
        .route("/{attendance_id}", delete(delete_attendance))
}
