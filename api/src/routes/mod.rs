//! HTTP route entry point for `/api/v1/...`.
//!
//! Routes are organized by domain, each enforcing its own role and tenant
//! scope via the guards in `crate::auth::guards` and the model-level rules.
//!
//! Route groups:
//! - `/health` → Liveness probe (public)
//! - `/auth` → Login, registration, profile, token refresh
//! - `/schools` → Tenant management (super admin, plus per-school reads)
//! - `/user-management` → Teachers, students, classes, per-school stats
//! - `/attendance` → Marking, listing, stats, class reports
//! - `/results` → Results, report cards, class summaries, subject catalog

use axum::Router;

use crate::state::AppState;

pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod results;
pub mod schools;
pub mod users;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes())
        .nest("/schools", schools::school_routes())
        .nest("/user-management", users::user_management_routes())
        .nest("/attendance", attendance::attendance_routes())
        .nest("/results", results::result_routes())
}
