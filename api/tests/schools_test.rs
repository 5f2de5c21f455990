mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use helpers::*;

#[tokio::test]
async fn create_school_is_super_admin_only() {
    let (app, db) = make_test_app().await;

    let root = seed_super_admin(&db).await;
    let school = seed_school(&db, "EX1").await;
    let school_admin = seed_school_admin(&db, school.id, "sch_admin").await;

    let body = json!({ "name": "Northside Primary", "code": "NSP" });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/schools", &bearer(&root), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["data"]["code"], "NSP");
    assert_eq!(json["data"]["sms_used"], 0);

    // Duplicate code conflicts.
    let body = json!({ "name": "Other", "code": "NSP" });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/schools", &bearer(&root), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // School admins may not create tenants.
    let body = json!({ "name": "Rogue", "code": "RGE" });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/schools", &bearer(&school_admin), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn get_school_respects_tenant_boundary() {
    let (app, db) = make_test_app().await;

    let school_a = seed_school(&db, "TA1").await;
    let school_b = seed_school(&db, "TB1").await;
    let admin_a = seed_school_admin(&db, school_a.id, "admin_a").await;

    let uri = format!("/api/v1/schools/{}", school_a.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin_a))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let uri = format!("/api/v1/schools/{}", school_b.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin_a))).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_schools_paginates() {
    let (app, db) = make_test_app().await;

    let root = seed_super_admin(&db).await;
    for i in 0..3 {
        seed_school(&db, &format!("LS{i}")).await;
    }

    let res = app
        .clone()
        .oneshot(get("/api/v1/schools?page=1&per_page=2", &bearer(&root)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["schools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_school_and_sms_quota() {
    let (app, db) = make_test_app().await;

    let root = seed_super_admin(&db).await;
    let school = seed_school(&db, "UP1").await;
    let admin = seed_school_admin(&db, school.id, "up_admin").await;

    let uri = format!("/api/v1/schools/{}", school.id);
    let body = json!({ "name": "Renamed Academy", "attendance_threshold": 80 });
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&root), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["name"], "Renamed Academy");
    assert_eq!(json["data"]["attendance_threshold"], 80);

    // The school's own admin may adjust the quota.
    let uri = format!("/api/v1/schools/{}/sms-quota", school.id);
    let body = json!({ "monthly_limit": 500, "reset_usage": true });
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&admin), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["sms_monthly_limit"], 500);
    assert_eq!(json["data"]["sms_used"], 0);

    // Plain school updates stay super-admin-only.
    let uri = format!("/api/v1/schools/{}", school.id);
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&admin), &json!({ "name": "Nope" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn school_stats_counts_members() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "ST1").await;
    let admin = seed_school_admin(&db, school.id, "st_admin").await;
    let teacher = seed_teacher(&db, school.id, "st_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 5A").await;
    seed_student(&db, school.id, class.id, "st_student1").await;
    seed_student(&db, school.id, class.id, "st_student2").await;

    let uri = format!("/api/v1/schools/{}/stats", school.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&admin))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["teachers"], 1);
    assert_eq!(json["data"]["students"], 2);
    assert_eq!(json["data"]["classes"], 1);
}

#[tokio::test]
async fn delete_school_hard_deletes() {
    let (app, db) = make_test_app().await;

    let root = seed_super_admin(&db).await;
    let school = seed_school(&db, "DL1").await;

    let uri = format!("/api/v1/schools/{}", school.id);
    let res = app.clone().oneshot(delete(&uri, &bearer(&root))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(get(&uri, &bearer(&root))).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
