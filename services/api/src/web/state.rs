//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the lookups most handlers start with.

use crate::config::Config;
use crate::error::ApiError;
use crate::web::dashboard::TabRegistry;
use crate::web::middleware::CurrentUser;
use coursebuilder_core::domain::{StudentRecord, Teacher};
use coursebuilder_core::ports::{
    CompletionTracker, CourseCatalog, PortError, SectionStore, StudentStore, TeacherStore,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub students: Arc<dyn StudentStore>,
    pub catalog: Arc<dyn CourseCatalog>,
    pub tracker: Arc<dyn CompletionTracker>,
    pub teachers: Arc<dyn TeacherStore>,
    pub sections: Arc<dyn SectionStore>,
    pub config: Arc<Config>,
    pub tabs: Arc<TabRegistry>,
}

impl AppState {
    /// Wires every port to a single storage adapter.
    pub fn with_storage<S>(storage: Arc<S>, config: Arc<Config>, tabs: TabRegistry) -> Self
    where
        S: StudentStore + CourseCatalog + CompletionTracker + TeacherStore + SectionStore + 'static,
    {
        Self {
            students: storage.clone(),
            catalog: storage.clone(),
            tracker: storage.clone(),
            teachers: storage.clone(),
            sections: storage,
            config,
            tabs: Arc::new(tabs),
        }
    }

    /// The caller's student record, provided they are enrolled.
    pub async fn enrolled_student(&self, user: &CurrentUser) -> Result<StudentRecord, ApiError> {
        match self.students.get_student_by_user_id(&user.user_id).await {
            Ok(student) if student.is_enrolled => Ok(student),
            Ok(_) | Err(PortError::NotFound(_)) => Err(ApiError::NotEnrolled),
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's teacher record.
    pub async fn current_teacher(&self, user: &CurrentUser) -> Result<Teacher, ApiError> {
        match self.teachers.get_teacher_by_email(&user.email).await {
            Ok(teacher) => Ok(teacher),
            Err(PortError::NotFound(_)) => Err(ApiError::Forbidden(
                "Teacher access is required".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn require_admin(&self, user: &CurrentUser) -> Result<(), ApiError> {
        if self.config.is_admin(&user.email) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator access is required".to_string()))
        }
    }
}
