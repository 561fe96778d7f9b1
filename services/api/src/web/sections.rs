//! services/api/src/web/sections.rs
//!
//! Teacher-facing handlers: teacher registration and course section management.

use crate::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::rest::find_lesson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use coursebuilder_core::analytics::{self, QuestionTally};
use coursebuilder_core::domain::{CourseSection, Teacher};
use coursebuilder_core::ports::PortError;
use coursebuilder_core::sections::{self, SectionDraft, SectionUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterTeacherRequest {
    /// Email of an existing student account.
    pub email: String,
    pub school: Option<String>,
    pub additional_fields: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddStudentsRequest {
    pub emails: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AddStudentsResponse {
    /// User ids added to the section.
    pub added: Vec<String>,
    /// Emails with no matching student.
    pub not_found: Vec<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityScoresQuery {
    pub unit_id: String,
    pub lesson_id: String,
}

/// Section-wide answers to one lesson activity.
#[derive(Serialize, ToSchema)]
pub struct ActivityScores {
    pub section_id: String,
    pub unit_id: String,
    pub lesson_id: String,
    /// Rostered students who submitted any result.
    pub students_reporting: u32,
    pub questions: Vec<QuestionTally>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Register an existing student as a teacher (administrators only).
#[utoipa::path(
    post,
    path = "/teachers",
    request_body = RegisterTeacherRequest,
    responses(
        (status = 201, description = "Teacher registered", body = Teacher),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "No student with that email")
    )
)]
pub async fn register_teacher_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RegisterTeacherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&user)?;

    let student = state.students.get_student_by_email(req.email.trim()).await?;
    let enrolled_on = match state.teachers.get_teacher_by_email(&student.email).await {
        Ok(existing) => existing.enrolled_on,
        Err(PortError::NotFound(_)) => Utc::now(),
        Err(e) => return Err(e.into()),
    };

    let teacher = Teacher {
        email: student.email.clone(),
        user_id: student.user_id.clone(),
        name: student.name.clone(),
        school: req.school.filter(|s| !s.trim().is_empty()),
        additional_fields: req.additional_fields,
        enrolled_on,
    };
    state.teachers.save_teacher(&teacher).await?;
    info!("Registered teacher {} by {}", teacher.email, user.email);

    Ok((StatusCode::CREATED, Json(teacher)))
}

/// The caller's sections.
#[utoipa::path(
    get,
    path = "/sections",
    responses(
        (status = 200, description = "Sections", body = Vec<CourseSection>),
        (status = 403, description = "Caller is not a teacher")
    )
)]
pub async fn list_sections_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<CourseSection>>, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    Ok(Json(state.sections.list_sections(&teacher.email).await?))
}

/// Create a section.
#[utoipa::path(
    post,
    path = "/sections",
    request_body = SectionDraft,
    responses(
        (status = 201, description = "Section created", body = CourseSection),
        (status = 400, description = "Invalid section"),
        (status = 409, description = "Section id already used")
    )
)]
pub async fn create_section_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(draft): Json<SectionDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    let section = draft.into_section()?;
    state.sections.create_section(&teacher.email, &section).await?;
    info!("Teacher {} created section {}", teacher.email, section.section_id);
    Ok((StatusCode::CREATED, Json(section)))
}

/// Load a section with each student's completion figures filled in.
pub(crate) async fn section_with_progress(
    state: &AppState,
    teacher_email: &str,
    section_id: &str,
) -> Result<CourseSection, ApiError> {
    let mut section = state.sections.get_section(teacher_email, section_id).await?;
    let outline = state.catalog.load_outline().await?;

    for (user_id, entry) in section.students.iter_mut() {
        let student = match state.students.get_student_by_user_id(user_id).await {
            Ok(student) => student,
            Err(PortError::NotFound(_)) => {
                warn!("Section {} lists missing student {}", section_id, user_id);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot = state.tracker.load_progress(user_id, &outline).await?;
        *entry = sections::summarize_student(&student, &outline, &snapshot);
    }
    Ok(section)
}

/// A section's roster with computed completion.
#[utoipa::path(
    get,
    path = "/sections/{section_id}",
    params(("section_id" = String, Path, description = "Section id")),
    responses(
        (status = 200, description = "Section", body = CourseSection),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn get_section_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(section_id): Path<String>,
) -> Result<Json<CourseSection>, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    let section = section_with_progress(&state, &teacher.email, &section_id).await?;
    Ok(Json(section))
}

/// Update a section's name, description, active flag or year.
#[utoipa::path(
    put,
    path = "/sections/{section_id}",
    request_body = SectionUpdate,
    params(("section_id" = String, Path, description = "Section id")),
    responses(
        (status = 200, description = "Section updated", body = CourseSection),
        (status = 400, description = "Invalid section"),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn update_section_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(section_id): Path<String>,
    Json(update): Json<SectionUpdate>,
) -> Result<Json<CourseSection>, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    let mut section = state.sections.get_section(&teacher.email, &section_id).await?;
    update.apply(&mut section)?;
    state.sections.update_section(&teacher.email, &section).await?;
    Ok(Json(section))
}

/// Add students to a section by email.
#[utoipa::path(
    post,
    path = "/sections/{section_id}/students",
    request_body = AddStudentsRequest,
    params(("section_id" = String, Path, description = "Section id")),
    responses(
        (status = 200, description = "Students added", body = AddStudentsResponse),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn add_students_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(section_id): Path<String>,
    Json(req): Json<AddStudentsRequest>,
) -> Result<Json<AddStudentsResponse>, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    // Fail early on an unknown section rather than reporting every email as missing.
    state.sections.get_section(&teacher.email, &section_id).await?;

    let mut response = AddStudentsResponse {
        added: Vec::new(),
        not_found: Vec::new(),
    };
    for email in req.emails.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        match state.students.get_student_by_email(email).await {
            Ok(student) => {
                state
                    .sections
                    .add_student(&teacher.email, &section_id, &student)
                    .await?;
                response.added.push(student.user_id);
            }
            Err(PortError::NotFound(_)) => response.not_found.push(email.to_string()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Json(response))
}

/// Remove a student from a section.
#[utoipa::path(
    delete,
    path = "/sections/{section_id}/students/{user_id}",
    params(
        ("section_id" = String, Path, description = "Section id"),
        ("user_id" = String, Path, description = "Student user id")
    ),
    responses(
        (status = 204, description = "Student removed"),
        (status = 404, description = "Unknown section or student")
    )
)]
pub async fn remove_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path((section_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    state
        .sections
        .remove_student(&teacher.email, &section_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Per-question answer counts for a lesson activity across a section's roster.
#[utoipa::path(
    get,
    path = "/sections/{section_id}/activity_scores",
    params(
        ("section_id" = String, Path, description = "Section id"),
        ActivityScoresQuery
    ),
    responses(
        (status = 200, description = "Activity scores", body = ActivityScores),
        (status = 403, description = "Caller is not a teacher"),
        (status = 404, description = "Unknown section or lesson")
    )
)]
pub async fn activity_scores_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(section_id): Path<String>,
    Query(query): Query<ActivityScoresQuery>,
) -> Result<Json<ActivityScores>, ApiError> {
    let teacher = state.current_teacher(&user).await?;
    let section = state.sections.get_section(&teacher.email, &section_id).await?;
    let outline = state.catalog.load_outline().await?;
    find_lesson(&outline, &query.unit_id, &query.lesson_id)?;

    let mut submissions = Vec::new();
    for user_id in section.students.keys() {
        let results = state
            .tracker
            .load_question_results(user_id, &query.unit_id, &query.lesson_id)
            .await?;
        if !results.is_empty() {
            submissions.push(results);
        }
    }

    Ok(Json(ActivityScores {
        questions: analytics::tally_lesson_scores(submissions.iter().map(Vec::as_slice)),
        students_reporting: submissions.len() as u32,
        section_id,
        unit_id: query.unit_id,
        lesson_id: query.lesson_id,
    }))
}
