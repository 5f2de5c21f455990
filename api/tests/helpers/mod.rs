// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::sync::Once;

use api::routes::routes;
use api::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use db::models::{school, school_class, user};

static INIT: Once = Once::new();

/// Config values the app reads at startup; the config singleton loads the
/// environment once per process.
pub fn init_test_env() {
    INIT.call_once(|| unsafe {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
        std::env::set_var("JWT_DURATION_MINUTES", "60");
        std::env::set_var("DATABASE_PATH", "data/test.db");
    });
}

/// Fresh app over a fresh in-memory database.
pub async fn make_test_app() -> (Router, DatabaseConnection) {
    init_test_env();

    let db = db::test_utils::setup_test_db().await;
    let state = AppState::new(db.clone());
    let app = Router::new().nest("/api/v1", routes()).with_state(state);

    (app, db)
}

pub fn bearer(user: &user::Model) -> String {
    let (token, _) = api::auth::generate_jwt(user);
    format!("Bearer {}", token)
}

pub fn get(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", auth)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, auth: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", auth)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn patch_json(uri: &str, auth: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("Authorization", auth)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("Authorization", auth)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

// ---------------------------
// Seed helpers
// ---------------------------

pub async fn seed_school(db: &DatabaseConnection, code: &str) -> school::Model {
    school::Model::create(db, &format!("School {code}"), code, None, None, None)
        .await
        .expect("create school")
}

pub async fn seed_super_admin(db: &DatabaseConnection) -> user::Model {
    user::Model::create(
        db,
        "root_admin",
        "root_admin@test.com",
        "password123",
        user::Role::SuperAdmin,
        None,
    )
    .await
    .expect("create super admin")
}

pub async fn seed_school_admin(
    db: &DatabaseConnection,
    school_id: i64,
    username: &str,
) -> user::Model {
    user::Model::create(
        db,
        username,
        &format!("{username}@test.com"),
        "password123",
        user::Role::SchoolAdmin,
        Some(school_id),
    )
    .await
    .expect("create school admin")
}

pub async fn seed_teacher(
    db: &DatabaseConnection,
    school_id: i64,
    username: &str,
) -> user::Model {
    user::Model::create_teacher(
        db,
        username,
        &format!("{username}@test.com"),
        "password123",
        school_id,
        &format!("EMP-{username}"),
        None,
    )
    .await
    .expect("create teacher")
}

pub async fn seed_class(
    db: &DatabaseConnection,
    school_id: i64,
    teacher_id: i64,
    name: &str,
) -> school_class::Model {
    school_class::Model::create(db, school_id, name, 5, teacher_id, "2026")
        .await
        .expect("create class")
}

pub async fn seed_student(
    db: &DatabaseConnection,
    school_id: i64,
    class_id: i64,
    username: &str,
) -> user::Model {
    let student = user::Model::create_student(
        db,
        username,
        &format!("{username}@test.com"),
        "password123",
        school_id,
        &format!("S-{username}"),
        class_id,
        None,
    )
    .await
    .expect("create student");
    school_class::Model::enroll_student(db, class_id, student.id)
        .await
        .expect("enroll student");
    student
}
