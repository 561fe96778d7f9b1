//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the student-facing REST endpoints and the
//! master definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::{dashboard, sections};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use coursebuilder_core::analytics::{self, QuestionKind, QuestionResult, QuestionTally};
use coursebuilder_core::course::{CourseOutline, Lesson};
use coursebuilder_core::domain::{
    CourseSection, LessonStatus, ScoreLine, SectionStudent, StudentRecord, Teacher,
};
use coursebuilder_core::enrollment::{RegistrationOutcome, RegistrationRequest};
use coursebuilder_core::progress::{self, EmbeddedUnit, LessonDetail, UnitDetail};
use coursebuilder_core::scoring::{self, AssessmentType, Submission, OVERALL_SCORE_METRIC};
use coursebuilder_core::sections::{SectionDraft, SectionUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        register_handler,
        get_profile_handler,
        rename_handler,
        unenroll_handler,
        submit_answer_handler,
        progress_handler,
        record_lesson_handler,
        record_questions_handler,
        complete_unit_handler,
        outline_handler,
        sections::register_teacher_handler,
        sections::list_sections_handler,
        sections::create_section_handler,
        sections::get_section_handler,
        sections::update_section_handler,
        sections::add_students_handler,
        sections::remove_student_handler,
        sections::activity_scores_handler,
        dashboard::dashboard_handler,
    ),
    components(
        schemas(
            RegisterRequest, RenameRequest, StudentProfile, AnswerRequest, AnswerResponse,
            ProgressResponse, LessonProgressRequest, UnitDetail, LessonDetail, EmbeddedUnit,
            LessonStatus, ScoreLine, CourseOutline, Teacher, CourseSection, SectionStudent,
            SectionDraft, SectionUpdate, sections::RegisterTeacherRequest,
            sections::AddStudentsRequest, sections::AddStudentsResponse, dashboard::TabEntry,
            dashboard::DashboardPage, QuestionResultsRequest, QuestionResult, QuestionKind,
            QuestionTally, sections::ActivityScores,
        )
    ),
    tags(
        (name = "Course Builder API", description = "Student registration, assessments, progress and teacher sections.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    pub name: String,
}

/// A student's own view of their record.
#[derive(Serialize, ToSchema)]
pub struct StudentProfile {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_enrolled: bool,
    pub enrolled_on: chrono::DateTime<chrono::Utc>,
    pub scores: Vec<ScoreLine>,
    pub overall_score: Option<f64>,
}

impl From<&StudentRecord> for StudentProfile {
    fn from(student: &StudentRecord) -> Self {
        Self {
            user_id: student.user_id.clone(),
            email: student.email.clone(),
            name: student.name.clone(),
            is_enrolled: student.is_enrolled,
            enrolled_on: student.enrolled_on,
            scores: student.all_scores(),
            overall_score: student.metric(OVERALL_SCORE_METRIC),
        }
    }
}

/// An assessment submission. `score` may be sent as a number or as text.
#[derive(Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub assessment_type: String,
    #[schema(value_type = String)]
    pub score: Value,
    /// The submitted answers, stored verbatim.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub answers: Value,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Label for the confirmation shown to the student, e.g. `postcourse_pass`.
    pub assessment: String,
    pub student_score: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgressQuery {
    #[serde(default)]
    pub include_assessments: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub unit_completion: BTreeMap<String, u8>,
    /// `null` when the course has no units.
    pub course_completion: Option<u8>,
    pub detailed_course_completion: Vec<UnitDetail>,
}

#[derive(Deserialize, ToSchema)]
pub struct LessonProgressRequest {
    pub status: Option<LessonStatus>,
    pub activity: Option<LessonStatus>,
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionResultsRequest {
    pub questions: Vec<QuestionResult>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register for the course, or re-enroll a previously unenrolled student.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student registered", body = StudentProfile),
        (status = 200, description = "Existing student re-enrolled", body = StudentProfile),
        (status = 409, description = "The course is full, or the email belongs to another student")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = RegistrationRequest {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        max_class_size: state.config.max_class_size,
    };

    let (student, outcome) = state.students.register_student(&request).await?;
    let status = match outcome {
        RegistrationOutcome::Created => {
            info!("Registered student {}", student.user_id);
            StatusCode::CREATED
        }
        RegistrationOutcome::Reenrolled => {
            info!("Re-enrolled student {}", student.user_id);
            StatusCode::OK
        }
        RegistrationOutcome::AlreadyEnrolled => StatusCode::OK,
    };
    Ok((status, Json(StudentProfile::from(&student))))
}

/// The caller's profile and scores.
#[utoipa::path(
    get,
    path = "/student/profile",
    responses(
        (status = 200, description = "Profile", body = StudentProfile),
        (status = 403, description = "Not enrolled")
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<StudentProfile>, ApiError> {
    let student = state.enrolled_student(&user).await?;
    Ok(Json(StudentProfile::from(&student)))
}

/// Change the caller's display name.
#[utoipa::path(
    put,
    path = "/student/profile",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Profile updated", body = StudentProfile),
        (status = 400, description = "Empty name"),
        (status = 403, description = "Not enrolled")
    )
)]
pub async fn rename_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<StudentProfile>, ApiError> {
    let mut student = state.enrolled_student(&user).await?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    student.name = Some(name.to_string());
    state.students.save_profile(&student).await?;
    Ok(Json(StudentProfile::from(&student)))
}

/// Leave the course. Scores are kept for a later re-enrollment.
#[utoipa::path(
    post,
    path = "/student/unenroll",
    responses(
        (status = 200, description = "Unenrolled", body = StudentProfile),
        (status = 403, description = "Not enrolled")
    )
)]
pub async fn unenroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<StudentProfile>, ApiError> {
    let mut student = state.enrolled_student(&user).await?;
    student.is_enrolled = false;
    state.students.save_profile(&student).await?;
    info!("Unenrolled student {}", student.user_id);
    Ok(Json(StudentProfile::from(&student)))
}

fn score_text(score: &Value) -> Result<String, ApiError> {
    match score {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ApiError::BadRequest(format!("score must be a number, got {}", other))),
    }
}

/// Submit an assessment.
///
/// The answer is always replaced; the score only if it beats the stored one.
/// Submitting `postcourse` recomputes the overall score and answers with
/// `postcourse_pass` or `postcourse_fail`.
#[utoipa::path(
    post,
    path = "/answer",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Submission stored", body = AnswerResponse),
        (status = 400, description = "Invalid score or assessment type"),
        (status = 403, description = "Not enrolled")
    )
)]
pub async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let student = state.enrolled_student(&user).await?;

    let assessment_type: AssessmentType = req.assessment_type.parse()?;
    let score = scoring::parse_score(&score_text(&req.score)?)?;
    let answer = serde_json::to_string(&req.answers)
        .map_err(|e| ApiError::BadRequest(format!("answers are not serializable: {}", e)))?;

    let Submission { outcome, student } = state
        .students
        .submit_assessment(&student.user_id, &assessment_type, score, answer)
        .await?;

    info!(
        "Student {} submitted {} with score {} -> {}",
        student.user_id, assessment_type, score, outcome
    );

    Ok(Json(AnswerResponse {
        assessment: outcome.to_string(),
        student_score: student.metric(OVERALL_SCORE_METRIC),
    }))
}

pub(crate) fn progress_response(
    outline: &CourseOutline,
    snapshot: &coursebuilder_core::ProgressSnapshot,
    include_assessments: bool,
) -> ProgressResponse {
    let unit_completion = progress::unit_completion(snapshot);
    ProgressResponse {
        course_completion: progress::overall_progress(&unit_completion).ok(),
        detailed_course_completion: progress::detailed_progress(outline, snapshot, include_assessments),
        unit_completion,
    }
}

/// The caller's progress through the course.
#[utoipa::path(
    get,
    path = "/student/progress",
    params(ProgressQuery),
    responses(
        (status = 200, description = "Progress", body = ProgressResponse),
        (status = 403, description = "Not enrolled")
    )
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let student = state.enrolled_student(&user).await?;
    let outline = state.catalog.load_outline().await?;
    let snapshot = state.tracker.load_progress(&student.user_id, &outline).await?;
    Ok(Json(progress_response(&outline, &snapshot, query.include_assessments)))
}

pub(crate) fn find_lesson<'a>(
    outline: &'a CourseOutline,
    unit_id: &str,
    lesson_id: &str,
) -> Result<&'a Lesson, ApiError> {
    outline
        .lessons(unit_id)
        .iter()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| ApiError::NotFound(format!("Lesson {} not found in unit {}", lesson_id, unit_id)))
}

/// Record the caller's state for a lesson and/or its activity.
#[utoipa::path(
    put,
    path = "/student/progress/{unit_id}/{lesson_id}",
    request_body = LessonProgressRequest,
    params(
        ("unit_id" = String, Path, description = "Unit id"),
        ("lesson_id" = String, Path, description = "Lesson id")
    ),
    responses(
        (status = 204, description = "Recorded"),
        (status = 400, description = "Nothing to record, or the lesson has no activity"),
        (status = 404, description = "Unknown unit or lesson")
    )
)]
pub async fn record_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path((unit_id, lesson_id)): Path<(String, String)>,
    Json(req): Json<LessonProgressRequest>,
) -> Result<StatusCode, ApiError> {
    let student = state.enrolled_student(&user).await?;
    let outline = state.catalog.load_outline().await?;
    let lesson = find_lesson(&outline, &unit_id, &lesson_id)?;

    if req.status.is_none() && req.activity.is_none() {
        return Err(ApiError::BadRequest("status or activity is required".to_string()));
    }
    if req.activity.is_some() && !lesson.has_activity {
        return Err(ApiError::BadRequest(format!("Lesson {} has no activity", lesson_id)));
    }

    if let Some(status) = req.status {
        state
            .tracker
            .record_lesson(&student.user_id, &unit_id, &lesson_id, status)
            .await?;
    }
    if let Some(activity) = req.activity {
        state
            .tracker
            .record_activity(&student.user_id, &unit_id, &lesson_id, activity)
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Record the caller's per-question results for a lesson activity,
/// replacing any earlier submission.
#[utoipa::path(
    put,
    path = "/student/progress/{unit_id}/{lesson_id}/questions",
    request_body = QuestionResultsRequest,
    params(
        ("unit_id" = String, Path, description = "Unit id"),
        ("lesson_id" = String, Path, description = "Lesson id")
    ),
    responses(
        (status = 204, description = "Recorded"),
        (status = 400, description = "Inconsistent results, or the lesson has no activity"),
        (status = 404, description = "Unknown unit or lesson")
    )
)]
pub async fn record_questions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path((unit_id, lesson_id)): Path<(String, String)>,
    Json(req): Json<QuestionResultsRequest>,
) -> Result<StatusCode, ApiError> {
    let student = state.enrolled_student(&user).await?;
    let outline = state.catalog.load_outline().await?;
    if !find_lesson(&outline, &unit_id, &lesson_id)?.has_activity {
        return Err(ApiError::BadRequest(format!("Lesson {} has no activity", lesson_id)));
    }
    analytics::validate_results(&req.questions)?;

    state
        .tracker
        .record_question_results(&student.user_id, &unit_id, &lesson_id, &req.questions)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a unit without lessons (such as an assessment) as complete.
#[utoipa::path(
    post,
    path = "/student/units/{unit_id}/complete",
    params(("unit_id" = String, Path, description = "Unit id")),
    responses(
        (status = 204, description = "Recorded"),
        (status = 400, description = "The unit is tracked per lesson"),
        (status = 404, description = "Unknown unit")
    )
)]
pub async fn complete_unit_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(unit_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let student = state.enrolled_student(&user).await?;
    let outline = state.catalog.load_outline().await?;
    let unit = outline
        .unit(&unit_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unit {} not found", unit_id)))?;
    if !unit.lessons.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Unit {} is tracked per lesson",
            unit_id
        )));
    }
    state
        .tracker
        .record_unit_completed(&student.user_id, &unit_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The course's units and lessons.
#[utoipa::path(
    get,
    path = "/course/outline",
    responses((status = 200, description = "Course outline", body = CourseOutline))
)]
pub async fn outline_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CourseOutline>, ApiError> {
    Ok(Json(state.catalog.load_outline().await?))
}

pub async fn health_handler() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
