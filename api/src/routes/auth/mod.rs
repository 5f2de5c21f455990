use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod get;
mod post;

pub use get::profile;
pub use post::{login, refresh, register};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh", post(refresh))
        .route("/profile", get(profile))
}
