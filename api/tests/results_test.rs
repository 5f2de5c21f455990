mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use db::models::result_revision;
use helpers::*;

#[tokio::test]
async fn create_derives_grade_from_band_table() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS1").await;
    let teacher = seed_teacher(&db, school.id, "rs1_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 6B").await;
    let student = seed_student(&db, school.id, class.id, "rs1_student").await;

    let body = json!({
        "student_id": student.id,
        "class_id": class.id,
        "subject": "Maths",
        "assessment_type": "test",
        "term": "first",
        "academic_year": "2026",
        "marks_obtained": 42.0,
        "total_marks": 60.0,
        "is_published": true,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["data"]["percentage"], 70.0);
    assert_eq!(json["data"]["grade"], "B+");
    assert_eq!(json["data"]["gpa"], 3.0);

    // Same assessment again conflicts.
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Marks above the total are a bad request.
    let body = json!({
        "student_id": student.id,
        "class_id": class.id,
        "subject": "Maths",
        "assessment_type": "quiz",
        "term": "first",
        "academic_year": "2026",
        "marks_obtained": 61.0,
        "total_marks": 60.0,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn students_never_see_unpublished_results() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS2").await;
    let teacher = seed_teacher(&db, school.id, "rs2_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 7B").await;
    let student = seed_student(&db, school.id, class.id, "rs2_student").await;

    for (assessment, published) in [("quiz", true), ("test", false)] {
        let body = json!({
            "student_id": student.id,
            "class_id": class.id,
            "subject": "English",
            "assessment_type": assessment,
            "term": "first",
            "academic_year": "2026",
            "marks_obtained": 40.0,
            "total_marks": 50.0,
            "is_published": published,
        });
        let res = app
            .clone()
            .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // The teacher sees both.
    let res = app.clone().oneshot(get("/api/v1/results", &bearer(&teacher))).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 2);

    // The student sees only the published one, even when filtering for
    // unpublished explicitly.
    let res = app.clone().oneshot(get("/api/v1/results", &bearer(&student))).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["results"][0]["is_published"], true);

    let res = app
        .clone()
        .oneshot(get("/api/v1/results?is_published=false", &bearer(&student)))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 0);
}

#[tokio::test]
async fn update_marks_appends_revision_history() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS3").await;
    let admin = seed_school_admin(&db, school.id, "rs3_admin").await;
    let teacher = seed_teacher(&db, school.id, "rs3_teacher").await;
    let colleague = seed_teacher(&db, school.id, "rs3_colleague").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 8B").await;
    let student = seed_student(&db, school.id, class.id, "rs3_student").await;

    db::models::school_class::Model::add_subject_teacher(&db, class.id, colleague.id)
        .await
        .unwrap();

    let body = json!({
        "student_id": student.id,
        "class_id": class.id,
        "subject": "Science",
        "assessment_type": "midterm",
        "term": "second",
        "academic_year": "2026",
        "marks_obtained": 42.0,
        "total_marks": 60.0,
        "is_published": true,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
        .await
        .unwrap();
    let result_id = body_json(res).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/results/{}", result_id);

    // A teacher of the same class who is not the author is refused.
    let res = app
        .clone()
        .oneshot(patch_json(
            &uri,
            &bearer(&colleague),
            &json!({ "marks_obtained": 50.0, "reason": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Changing marks without a reason is a bad request.
    let res = app
        .clone()
        .oneshot(patch_json(&uri, &bearer(&teacher), &json!({ "marks_obtained": 48.0 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Proper correction: derived fields recomputed, one revision appended.
    let res = app
        .clone()
        .oneshot(patch_json(
            &uri,
            &bearer(&teacher),
            &json!({ "marks_obtained": 48.0, "reason": "Addition error" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["percentage"], 80.0);
    assert_eq!(json["data"]["grade"], "A");

    // The school admin may amend too; history strictly grows.
    let res = app
        .clone()
        .oneshot(patch_json(
            &uri,
            &bearer(&admin),
            &json!({ "marks_obtained": 45.0, "reason": "Moderation" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let history = result_revision::Model::for_result(&db, result_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].old_marks, 42.0);
    assert_eq!(history[0].new_marks, 48.0);
    assert_eq!(history[1].old_marks, 48.0);
    assert_eq!(history[1].new_marks, 45.0);
}

#[tokio::test]
async fn bulk_create_is_atomic() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS4").await;
    let teacher = seed_teacher(&db, school.id, "rs4_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 9B").await;
    let s1 = seed_student(&db, school.id, class.id, "rs4_s1").await;
    let s2 = seed_student(&db, school.id, class.id, "rs4_s2").await;

    let body = json!({
        "class_id": class.id,
        "subject": "Maths",
        "assessment_type": "final",
        "term": "third",
        "academic_year": "2026",
        "total_marks": 60.0,
        "is_published": true,
        "results": [
            { "student_id": s1.id, "marks_obtained": 54.0 },
            { "student_id": s2.id, "marks_obtained": 30.0 },
        ],
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results/bulk", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    // Re-submitting the same assessment conflicts and adds nothing.
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results/bulk", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.clone().oneshot(get("/api/v1/results", &bearer(&teacher))).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["data"]["total"], 2);
}

#[tokio::test]
async fn report_card_folds_published_results() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS5").await;
    let teacher = seed_teacher(&db, school.id, "rs5_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 10B").await;
    let student = seed_student(&db, school.id, class.id, "rs5_student").await;

    for (subject, assessment, marks) in [
        ("Maths", "test", 42.0),
        ("Maths", "final", 54.0),
        ("English", "test", 30.0),
    ] {
        let body = json!({
            "student_id": student.id,
            "class_id": class.id,
            "subject": subject,
            "assessment_type": assessment,
            "term": "first",
            "academic_year": "2026",
            "marks_obtained": marks,
            "total_marks": 60.0,
            "is_published": true,
        });
        let res = app
            .clone()
            .oneshot(post_json("/api/v1/results", &bearer(&teacher), &body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // The student pulls their own card without naming themselves.
    let res = app
        .clone()
        .oneshot(get(
            "/api/v1/results/report-card?term=first&academic_year=2026",
            &bearer(&student),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["subjects"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["total_marks_obtained"], 126.0);
    assert_eq!(json["data"]["total_marks"], 180.0);
    assert_eq!(json["data"]["overall_percentage"], 70.0);
    assert_eq!(json["data"]["overall_grade"], "B+");
    assert_eq!(json["data"]["gpa"], 2.75);

    // A classmate cannot pull someone else's card.
    let peer = seed_student(&db, school.id, class.id, "rs5_peer").await;
    let uri = format!(
        "/api/v1/results/report-card?student_id={}&term=first&academic_year=2026",
        student.id
    );
    let res = app.clone().oneshot(get(&uri, &bearer(&peer))).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn class_results_summary() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS6").await;
    let teacher = seed_teacher(&db, school.id, "rs6_teacher").await;
    let class = seed_class(&db, school.id, teacher.id, "Grade 11B").await;
    let s1 = seed_student(&db, school.id, class.id, "rs6_s1").await;
    let s2 = seed_student(&db, school.id, class.id, "rs6_s2").await;

    let body = json!({
        "class_id": class.id,
        "subject": "Maths",
        "assessment_type": "midterm",
        "term": "first",
        "academic_year": "2026",
        "total_marks": 60.0,
        "is_published": true,
        "results": [
            { "student_id": s1.id, "marks_obtained": 54.0 },
            { "student_id": s2.id, "marks_obtained": 30.0 },
        ],
    });
    app.clone()
        .oneshot(post_json("/api/v1/results/bulk", &bearer(&teacher), &body))
        .await
        .unwrap();

    let uri = format!(
        "/api/v1/results/class-results?class_id={}&subject=Maths&term=first&academic_year=2026",
        class.id
    );
    let res = app.clone().oneshot(get(&uri, &bearer(&teacher))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["students"], 2);
    assert_eq!(json["data"]["average_percentage"], 70.0);
    assert_eq!(json["data"]["highest_percentage"], 90.0);
    assert_eq!(json["data"]["lowest_percentage"], 50.0);
    assert_eq!(json["data"]["grade_distribution"]["A+"], 1);
    assert_eq!(json["data"]["grade_distribution"]["C+"], 1);

    // Students cannot pull the class summary.
    let res = app.clone().oneshot(get(&uri, &bearer(&s1))).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn subject_catalog_crud() {
    let (app, db) = make_test_app().await;

    let school = seed_school(&db, "RS7").await;
    let admin = seed_school_admin(&db, school.id, "rs7_admin").await;
    let teacher = seed_teacher(&db, school.id, "rs7_teacher").await;

    let body = json!({
        "school_id": school.id,
        "name": "Mathematics",
        "code": "MATH",
        "grade_level": 6,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results/subjects", &bearer(&admin), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Duplicate code within the school conflicts.
    let body = json!({
        "school_id": school.id,
        "name": "More Maths",
        "code": "MATH",
        "grade_level": 7,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results/subjects", &bearer(&admin), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Teachers may not create catalog entries.
    let body = json!({
        "school_id": school.id,
        "name": "Physics",
        "code": "PHY",
        "grade_level": 8,
    });
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/results/subjects", &bearer(&teacher), &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Any member of the school can read the catalog.
    let uri = format!("/api/v1/results/subjects/{}", school.id);
    let res = app.clone().oneshot(get(&uri, &bearer(&teacher))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["code"], "MATH");
}
