//! services/api/src/web/router.rs
//!
//! Assembles the HTTP routes. Kept in the library so the binary and the
//! integration tests serve exactly the same application.

use crate::web::{
    dashboard::dashboard_handler,
    middleware::require_user,
    rest::{
        complete_unit_handler, get_profile_handler, health_handler, outline_handler,
        progress_handler, record_lesson_handler, record_questions_handler, register_handler,
        rename_handler, submit_answer_handler, unenroll_handler,
    },
    sections::{
        activity_scores_handler, add_students_handler, create_section_handler, get_section_handler,
        list_sections_handler, register_teacher_handler, remove_student_handler,
        update_section_handler,
    },
    state::AppState,
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no identity required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Student routes
    let student_routes = Router::new()
        .route("/register", post(register_handler))
        .route(
            "/student/profile",
            get(get_profile_handler).put(rename_handler),
        )
        .route("/student/unenroll", post(unenroll_handler))
        .route("/answer", post(submit_answer_handler))
        .route("/student/progress", get(progress_handler))
        .route(
            "/student/progress/{unit_id}/{lesson_id}",
            put(record_lesson_handler),
        )
        .route(
            "/student/progress/{unit_id}/{lesson_id}/questions",
            put(record_questions_handler),
        )
        .route(
            "/student/units/{unit_id}/complete",
            post(complete_unit_handler),
        )
        .route("/course/outline", get(outline_handler));

    // Teacher routes
    let teacher_routes = Router::new()
        .route("/teachers", post(register_teacher_handler))
        .route("/dashboard", get(dashboard_handler))
        .route(
            "/sections",
            get(list_sections_handler).post(create_section_handler),
        )
        .route(
            "/sections/{section_id}",
            get(get_section_handler).put(update_section_handler),
        )
        .route(
            "/sections/{section_id}/students",
            post(add_students_handler),
        )
        .route(
            "/sections/{section_id}/students/{user_id}",
            delete(remove_student_handler),
        )
        .route(
            "/sections/{section_id}/activity_scores",
            get(activity_scores_handler),
        );

    let protected_routes = student_routes
        .merge(teacher_routes)
        .layer(axum_middleware::from_fn(require_user));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
