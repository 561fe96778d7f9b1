pub mod analytics;
pub mod course;
pub mod domain;
pub mod enrollment;
pub mod error;
pub mod ports;
pub mod progress;
pub mod scoring;
pub mod sections;

pub use analytics::{tally_lesson_scores, QuestionKind, QuestionResult, QuestionTally};
pub use course::{CourseOutline, Lesson, Unit};
pub use domain::{
    AssessmentEntry, CourseSection, LessonKey, LessonStatus, ProgressSnapshot, ScoreLine,
    SectionStudent, StudentRecord, Teacher,
};
pub use enrollment::{RegistrationOutcome, RegistrationRequest};
pub use error::{CoreError, CoreResult};
pub use ports::{
    CompletionTracker, CourseCatalog, PortError, PortResult, SectionStore, StudentStore,
    TeacherStore,
};
pub use progress::{detailed_progress, overall_progress, unit_completion, UnitDetail};
pub use scoring::{store_assessment, AssessmentType, Submission};
