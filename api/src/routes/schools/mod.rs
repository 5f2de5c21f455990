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

pub use self::delete::delete_school;
pub use get::{get_school, list_schools, school_stats};
pub use patch::{update_school, update_sms_quota};
pub use post::create_school;

pub fn school_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_school))
        .route("/", get(list_schools))
        .route("/{school_id}", get(get_school))
        .route("/{school_id}", patch(update_school))
        .route("/{school_id}", delete(delete_school))
        .route("/{school_id}/sms-quota", patch(update_sms_quota))
        .route("/{school_id}/stats", get(school_stats))
}
