//! crates/coursebuilder_core/src/error.rs
//!
//! Errors raised by the pure scoring, progress and section logic.

/// Errors produced by the core when its inputs are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A submitted score was negative, non-numeric or not finite.
    #[error("Invalid score value: {0}")]
    InvalidScoreValue(String),

    /// An average was requested over zero units.
    #[error("Cannot average course progress: no units have completion entries")]
    NoUnitsForAverage,

    /// Data the computation depends on is absent (e.g. a unit removed from the course).
    #[error("Missing prerequisite data: {0}")]
    MissingPrerequisiteData(String),

    /// The course outline is structurally unusable.
    #[error("Invalid course outline: {0}")]
    InvalidCourseOutline(String),

    /// A section payload failed validation.
    #[error("Invalid section: {0}")]
    InvalidSection(String),

    /// A section with this id already exists for the owning teacher.
    #[error("Section '{0}' already exists")]
    DuplicateSection(String),

    /// Registration is closed because the class has reached its size limit.
    #[error("The course is full ({0} students)")]
    ClassFull(u64),

    #[error("Invalid question result: {0}")]
    InvalidQuestionResult(String),
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
