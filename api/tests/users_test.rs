mod helpers;

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use tower::ServiceExt;

use db::models::{class_student, class_subject_teacher, user};
use helpers::*;

#[tokio::test]
async fn create_teacher_with_subject_classes() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "UM1").await;
    let admin = seed_school_admin(&db, school.id, "um1_admin").await;
    let class_teacher = seed_teacher(&db, school.id, "um1_ct").await;
    let class = seed_class(&db, school.id, class_teacher.id, "Grade 4A").await;

    let body = json!({
        "username": "um1_teacher",
        "email": "um1_teacher@test.com",
        "password": "password123",
        "school_id": school.id,
        "employee_id": "EMP-900",
        "subject_classes": [class.id],
    });
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/v1/user-management/teachers",
            &bearer(&admin),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["data"]["role"], "teacher");
    let teacher_id = json["data"]["id"].as_i64().unwrap();

    let links = class_subject_teacher::Entity::find()
        .filter(class_subject_teacher::Column::TeacherId.eq(teacher_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(links, 1);
}

#[tokio::test]
async fn create_student_enrolls_into_class() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "UM2").await;
    let other_school = seed_school(&db, "UM2B").await;
    let admin = seed_school_admin(&db, school.id, "um2_admin").await;
    let teacher = seed_teacher(&db, school.id, "um2_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 3C").await;

    let body = json!({
        "username": "um2_student",
        "email": "um2_student@test.com",
        "password": "password123",
        "school_id": school.id,
        "student_no": "S-900",
        "class_id": class.id,
    });
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/v1/user-management/students",
            &bearer(&admin),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    let student_id = json["data"]["id"].as_i64().unwrap();

    let rostered = class_student::Entity::find()
        .filter(class_student::Column::ClassId.eq(class.id))
        .filter(class_student::Column::StudentId.eq(student_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rostered, 1);

    // A class belonging to another school is rejected before any insert.
    let other_teacher = seed_teacher(&db, other_school.id, "um2b_teacher").await;
    let other_class = seed_class(&db, other_school.id, other_teacher.id, "Grade 3D").await;
    let body = json!({
        "username": "um2_student_b",
        "email": "um2_student_b@test.com",
        "password": "password123",
        "school_id": school.id,
        "student_no": "S-901",
        "class_id": other_class.id,
    });
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/v1/user-management/students",
            &bearer(&admin),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(
        user::Model::find_by_username(&db, "um2_student_b")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn cross_school_admin_cannot_manage_users() {
    let (app, db) = make_test_app().await;

    let school_a = seed_school(&db, "UM3A").await;
    let school_b = seed_school(&db, "UM3B").await;
    let admin_b = seed_school_admin(&db, school_b.id, "um3_admin_b").await;
    let teacher_a = seed_teacher(&db, school_a.id, "um3_teacher").await;

    let uri = format!("/api/v1/user-management/users/{}", teacher_a.id);
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&admin_b), &json!({ "phone": "555" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.clone().oneshot(delete(&uri, &bearer(&admin_b))).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_and_get_users() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "UM4").await;
    let admin = seed_school_admin(&db, school.id, "um4_admin").await;
    let teacher = seed_teacher(&db, school.id, "um4_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 2A").await;
    let student = seed_student(&db, school.id, class.id, "um4_student").await;

    let uri = format!("/api/v1/user-management/schools/{}/teachers", school.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["users"][0]["username"], "um4_teacher");

    let uri = format!("/api/v1/user-management/schools/{}/students", school.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin))).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 1);

    let uri = format!("/api/v1/user-management/schools/{}/classes", school.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin))).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["classes"][0]["name"], "Grade 2A");

    // A student may fetch their own record but not the teacher's.
    let uri = format!("/api/v1/user-management/users/{}", student.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&student))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let uri = format!("/api/v1/user-management/users/{}", teacher.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&student))).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn class_move_re_rosters_but_never_promotes() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "UM5").await;
    let admin = seed_school_admin(&db, school.id, "um5_admin").await;
    let teacher = seed_teacher(&db, school.id, "um5_teacher").await;
    let class_a = seed_class(&db, school.id, teacher.id, "Grade 1A").await;
    let class_b = seed_class(&db, school.id, teacher.id, "Grade 1B").await;
    let student = seed_student(&db, school.id, class_a.id, "um5_student").await;

    let uri = format!("/api/v1/user-management/users/{}", student.id);
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&admin), &json!({ "class_id": class_b.id })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["class_id"], class_b.id);

    let old_roster = class_student::Entity::find()
        .filter(class_student::Column::ClassId.eq(class_a.id))
        .filter(class_student::Column::StudentId.eq(student.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(old_roster, 0);

    // Promotion to super admin is refused.
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&admin), &json!({ "role": "super_admin" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_user_removes_account() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "UM6").await;
    let admin = seed_school_admin(&db, school.id, "um6_admin").await;
    let teacher = seed_teacher(&db, school.id, "um6_teacher").await;

    let uri = format!("/api/v1/user-management/users/{}", teacher.id);
    let res = app.clone().oneshot(delete(&uri, &bearer(&admin))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert!(
        user::Entity::find_by_id(teacher.id)
            .one(&db)
            .await
            .unwrap()
            .is_none()
    );
}
