mod common;

use api_lib::config::Config;
use axum::http::StatusCode;
use common::{app, app_with, register, send};
use coursebuilder_core::course::CourseOutline;
use serde_json::json;

const ADA: (&str, &str) = ("u-ada", "ada@example.com");

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_identity_headers() {
    let app = app();
    let (status, body) = send(&app, "GET", "/student/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn unregistered_student_is_sent_to_register() {
    let app = app();
    let (status, body) = send(&app, "GET", "/student/progress", Some(ADA), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["redirect"], "/register");
}

#[tokio::test]
async fn register_unenroll_and_reenroll() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, profile) = send(&app, "GET", "/student/profile", Some(ADA), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Ada");
    assert_eq!(profile["is_enrolled"], true);

    let (status, _) = send(&app, "POST", "/student/unenroll", Some(ADA), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/student/profile", Some(ADA), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, profile) = send(&app, "POST", "/register", Some(ADA), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["is_enrolled"], true);
    assert_eq!(profile["name"], "Ada");
}

#[tokio::test]
async fn rename_rejects_blank_names() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, _) = send(&app, "PUT", "/student/profile", Some(ADA), Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = send(
        &app,
        "PUT",
        "/student/profile",
        Some(ADA),
        Some(json!({ "name": "Ada Lovelace" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Ada Lovelace");
}

#[tokio::test]
async fn class_size_limit_closes_registration() {
    let app = app_with(
        common::sample_outline(),
        Config {
            max_class_size: Some(1),
            ..Config::default()
        },
    );
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        Some(("u-bob", "bob@example.com")),
        Some(json!({ "name": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn returning_students_also_need_a_free_seat() {
    let app = app_with(
        common::sample_outline(),
        Config {
            max_class_size: Some(2),
            ..Config::default()
        },
    );
    const BOB: (&str, &str) = ("u-bob", "bob@example.com");
    register(&app, ADA.0, ADA.1, "Ada").await;
    register(&app, BOB.0, BOB.1, "Bob").await;

    let (status, _) = send(&app, "POST", "/student/unenroll", Some(ADA), None).await;
    assert_eq!(status, StatusCode::OK);

    // Unenrolled records still hold their seat.
    let (status, body) = send(&app, "POST", "/register", Some(ADA), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("full"));

    // An enrolled student re-registering is not turned away.
    let (status, profile) = send(&app, "POST", "/register", Some(BOB), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["is_enrolled"], true);
}

#[tokio::test]
async fn concurrent_registrations_never_overfill_the_class() {
    let app = app_with(
        common::sample_outline(),
        Config {
            max_class_size: Some(1),
            ..Config::default()
        },
    );
    let ((ada, _), (bob, _)) = tokio::join!(
        send(&app, "POST", "/register", Some(ADA), Some(json!({}))),
        send(&app, "POST", "/register", Some(("u-bob", "bob@example.com")), Some(json!({}))),
    );
    let mut statuses = vec![ada, bob];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn postcourse_blends_with_midcourse() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, body) = send(
        &app,
        "POST",
        "/answer",
        Some(ADA),
        Some(json!({ "assessment_type": "midcourse", "score": 80, "answers": {"q1": "b"} })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"], "midcourse");
    assert!(body["student_score"].is_null());

    // floor(0.3 * 80 + 0.7 * 60) = 66
    let (status, body) = send(
        &app,
        "POST",
        "/answer",
        Some(ADA),
        Some(json!({ "assessment_type": "postcourse", "score": "60", "answers": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"], "postcourse_fail");
    assert_eq!(body["student_score"], json!(66.0));

    // A lower retake keeps the best score; a higher one passes.
    let (_, body) = send(
        &app,
        "POST",
        "/answer",
        Some(ADA),
        Some(json!({ "assessment_type": "postcourse", "score": 40, "answers": [] })),
    )
    .await;
    assert_eq!(body["student_score"], json!(66.0));

    let (_, body) = send(
        &app,
        "POST",
        "/answer",
        Some(ADA),
        Some(json!({ "assessment_type": "postcourse", "score": 90.4, "answers": [] })),
    )
    .await;
    assert_eq!(body["assessment"], "postcourse_pass");
    assert_eq!(body["student_score"], json!(87.0));
}

#[tokio::test]
async fn concurrent_submissions_keep_the_best_score() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let submit = |score: i32| {
        send(
            &app,
            "POST",
            "/answer",
            Some(ADA),
            Some(json!({ "assessment_type": "midcourse", "score": score })),
        )
    };
    let ((high, _), (low, _)) = tokio::join!(submit(90), submit(60));
    assert_eq!(high, StatusCode::OK);
    assert_eq!(low, StatusCode::OK);

    let (_, profile) = send(&app, "GET", "/student/profile", Some(ADA), None).await;
    let midcourse = profile["scores"]
        .as_array()
        .unwrap()
        .iter()
        .find(|line| line["assessment_type"] == "midcourse")
        .cloned()
        .unwrap();
    assert_eq!(midcourse["score"], 90);
}

#[tokio::test]
async fn invalid_scores_are_rejected() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    for score in [json!("abc"), json!(-5), json!(true)] {
        let (status, _) = send(
            &app,
            "POST",
            "/answer",
            Some(ADA),
            Some(json!({ "assessment_type": "midcourse", "score": score })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "score {score}");
    }

    let (status, _) = send(
        &app,
        "POST",
        "/answer",
        Some(ADA),
        Some(json!({ "assessment_type": "", "score": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn progress_reports_units_and_embedded_assessments() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l1",
        Some(ADA),
        Some(json!({ "status": "completed", "activity": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l2",
        Some(ADA),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "POST", "/student/units/u1-quiz/complete", Some(ADA), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "GET",
        "/student/progress?include_assessments=true",
        Some(ADA),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unit_completion"]["u1"], 75);
    assert_eq!(body["unit_completion"]["u1-quiz"], 100);
    assert_eq!(body["unit_completion"]["u2"], 0);
    // (75 + 100 + 0) / 3, floored
    assert_eq!(body["course_completion"], 58);

    let detail = body["detailed_course_completion"].as_array().unwrap();
    let ids: Vec<_> = detail.iter().map(|u| u["unit_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);
    assert_eq!(detail[0]["lessons"][0]["completion"], "completed");
    assert_eq!(detail[0]["lessons"][0]["activity_completion"], "in_progress");
    assert!(detail[0]["lessons"][1]["activity_completion"].is_null());
    assert_eq!(detail[0]["assessments"][0]["unit_id"], "u1-quiz");
    assert_eq!(detail[0]["assessments"][0]["completion"], 100);

    let (_, body) = send(&app, "GET", "/student/progress", Some(ADA), None).await;
    assert!(body["detailed_course_completion"][0].get("assessments").is_none());
}

#[tokio::test]
async fn progress_updates_are_validated() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/missing",
        Some(ADA),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PUT", "/student/progress/u1/l2", Some(ADA), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l2",
        Some(ADA),
        Some(json!({ "activity": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/student/units/u1/complete", Some(ADA), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_lesson_named_complete_is_still_trackable() {
    let outline: CourseOutline = serde_json::from_value(json!({
        "units": [
            {
                "id": "u1",
                "title": "Wrap Up",
                "lessons": [ { "id": "complete", "title": "Complete", "has_activity": true } ]
            }
        ]
    }))
    .unwrap();
    let app = app_with(outline, Config::default());
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/complete",
        Some(ADA),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/student/progress", Some(ADA), None).await;
    assert_eq!(body["unit_completion"]["u1"], 100);

    let (status, _) = send(&app, "POST", "/student/units/u1/complete", Some(ADA), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn question_results_are_validated() {
    let app = app();
    register(&app, ADA.0, ADA.1, "Ada").await;
    let answer = json!({ "sequence": 0, "kind": "multiple_choice", "choice_count": 3, "selected": [1] });

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l1/questions",
        Some(ADA),
        Some(json!({ "questions": [answer] })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l2/questions",
        Some(ADA),
        Some(json!({ "questions": [answer] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u1/l1/questions",
        Some(ADA),
        Some(json!({ "questions": [
            { "sequence": 0, "kind": "multiple_choice", "choice_count": 3, "selected": [3] }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/student/progress/u9/l1/questions",
        Some(ADA),
        Some(json!({ "questions": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn course_completion_is_null_without_units() {
    let app = app_with(CourseOutline::default(), Config::default());
    register(&app, ADA.0, ADA.1, "Ada").await;

    let (status, body) = send(&app, "GET", "/student/progress", Some(ADA), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["course_completion"].is_null());
    assert_eq!(body["unit_completion"], json!({}));
}

#[tokio::test]
async fn outline_is_served_in_course_order() {
    let app = app();
    let (status, body) = send(&app, "GET", "/course/outline", Some(ADA), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["u1", "u1-quiz", "u2"]);
}
