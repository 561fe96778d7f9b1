//! crates/coursebuilder_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core consumes.
//! These traits form the boundary of the hexagonal architecture: the scoring and
//! progress logic stays pure while storage and tracking live behind adapters.

use crate::analytics::QuestionResult;
use crate::course::CourseOutline;
use crate::domain::{CourseSection, LessonStatus, ProgressSnapshot, StudentRecord, Teacher};
use crate::enrollment::{RegistrationOutcome, RegistrationRequest};
use crate::error::CoreError;
use crate::scoring::{AssessmentType, Submission};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The core refused the change the adapter was asked to commit.
    #[error("{0}")]
    Rejected(#[from] CoreError),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn get_student_by_user_id(&self, user_id: &str) -> PortResult<StudentRecord>;

    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentRecord>;

    /// Creates the student or re-enrolls a returning one, enforcing the class
    /// size limit. Counting and writing happen atomically.
    async fn register_student(
        &self,
        request: &RegistrationRequest,
    ) -> PortResult<(StudentRecord, RegistrationOutcome)>;

    /// Writes the profile fields (email, name, enrollment flag). Scores,
    /// answers and metrics are left untouched.
    async fn save_profile(&self, student: &StudentRecord) -> PortResult<()>;

    /// Reads the record, applies the submission and commits it as one unit,
    /// so concurrent submissions never lower a stored best score.
    async fn submit_assessment(
        &self,
        user_id: &str,
        assessment_type: &AssessmentType,
        score: i32,
        answer: String,
    ) -> PortResult<Submission>;
}

#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn load_outline(&self) -> PortResult<CourseOutline>;
}

#[async_trait]
pub trait CompletionTracker: Send + Sync {
    /// Everything recorded for `user_id`, interpreted against `outline`.
    async fn load_progress(
        &self,
        user_id: &str,
        outline: &CourseOutline,
    ) -> PortResult<ProgressSnapshot>;

    async fn record_lesson(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()>;

    async fn record_activity(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()>;

    /// Marks a unit without lessons (e.g. an assessment) as done.
    async fn record_unit_completed(&self, user_id: &str, unit_id: &str) -> PortResult<()>;

    /// Replaces the student's question results for a lesson activity.
    async fn record_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        results: &[QuestionResult],
    ) -> PortResult<()>;

    /// The latest question results for a lesson; empty if none were recorded.
    async fn load_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
    ) -> PortResult<Vec<QuestionResult>>;
}

#[async_trait]
pub trait TeacherStore: Send + Sync {
    async fn get_teacher_by_email(&self, email: &str) -> PortResult<Teacher>;

    async fn save_teacher(&self, teacher: &Teacher) -> PortResult<()>;
}

/// Sections are scoped to the owning teacher's email; ids only need to be
/// unique within that scope.
#[async_trait]
pub trait SectionStore: Send + Sync {
    async fn list_sections(&self, teacher_email: &str) -> PortResult<Vec<CourseSection>>;

    async fn get_section(&self, teacher_email: &str, section_id: &str) -> PortResult<CourseSection>;

    /// Fails with `PortError::Conflict` if the id is already taken.
    async fn create_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()>;

    /// Updates the section's own fields; the roster is managed separately.
    async fn update_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()>;

    async fn add_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        student: &StudentRecord,
    ) -> PortResult<()>;

    async fn remove_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        user_id: &str,
    ) -> PortResult<()>;
}
