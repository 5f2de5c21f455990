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

pub use self::delete::delete_result;
pub use get::{class_results, list_results, list_subjects, report_card};
pub use patch::update_result;
pub use post::{create_result, create_results_bulk, create_subject};

pub fn result_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_result))
        .route("/bulk", post(create_results_bulk))
        .route("/", get(list_results))
        .route("/report-card", get(report_card))
        .route("/class-results", get(class_results))
        .route("/subjects", post(create_subject))
        .route("/subjects/{school_id}", get(list_subjects))
        .route("/{result_id}", patch(update_result))
        .route("/{result_id}", delete(delete_result))
}
