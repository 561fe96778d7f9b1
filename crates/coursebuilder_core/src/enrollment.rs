//! crates/coursebuilder_core/src/enrollment.rs
//!
//! Registration rules: creating a student, re-enrolling one who left, and the
//! class size limit. Storage adapters run this under their own lock or
//! transaction so the head count and the write cannot interleave.

use crate::domain::StudentRecord;
use crate::error::{CoreError, CoreResult};

/// What a registration request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    Reenrolled,
    /// The student was already enrolled; nothing changed.
    AlreadyEnrolled,
}

/// A registration request from the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub max_class_size: Option<u64>,
}

/// Applies `request` to the stored record, if any.
///
/// `class_size` counts every stored student, enrolled or not. The limit is
/// checked whenever the call would enroll someone.
pub fn register(
    existing: Option<StudentRecord>,
    request: RegistrationRequest,
    class_size: u64,
) -> CoreResult<(StudentRecord, RegistrationOutcome)> {
    if let Some(student) = &existing {
        if student.is_enrolled {
            return Ok((student.clone(), RegistrationOutcome::AlreadyEnrolled));
        }
    }
    if let Some(limit) = request.max_class_size {
        if class_size >= limit {
            return Err(CoreError::ClassFull(limit));
        }
    }

    match existing {
        Some(mut student) => {
            student.is_enrolled = true;
            if request.name.is_some() {
                student.name = request.name;
            }
            Ok((student, RegistrationOutcome::Reenrolled))
        }
        None => Ok((
            StudentRecord::new(request.user_id, request.email, request.name),
            RegistrationOutcome::Created,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(max: Option<u64>) -> RegistrationRequest {
        RegistrationRequest {
            user_id: "u1".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
            max_class_size: max,
        }
    }

    #[test]
    fn creates_when_there_is_room() {
        let (student, outcome) = register(None, request(Some(2)), 1).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Created);
        assert!(student.is_enrolled);
        assert_eq!(student.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn full_class_blocks_new_and_returning_students() {
        assert_eq!(register(None, request(Some(1)), 1).unwrap_err(), CoreError::ClassFull(1));

        let mut left = StudentRecord::new("u1", "ada@example.com", None);
        left.is_enrolled = false;
        assert_eq!(
            register(Some(left), request(Some(1)), 1).unwrap_err(),
            CoreError::ClassFull(1)
        );
    }

    #[test]
    fn enrolled_students_are_left_alone() {
        let current = StudentRecord::new("u1", "ada@example.com", Some("Ada L".into()));
        let (student, outcome) = register(Some(current.clone()), request(Some(1)), 5).unwrap();
        assert_eq!(outcome, RegistrationOutcome::AlreadyEnrolled);
        assert_eq!(student, current);
    }

    #[test]
    fn reenrolling_keeps_scores_and_name_unless_given() {
        let mut left = StudentRecord::new("u1", "ada@example.com", Some("Ada".into()));
        left.is_enrolled = false;
        left.set_assessment_score("midcourse", 80);
        let mut req = request(None);
        req.name = None;
        let (student, outcome) = register(Some(left), req, 10).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Reenrolled);
        assert!(student.is_enrolled);
        assert_eq!(student.name.as_deref(), Some("Ada"));
        assert_eq!(student.assessment_score("midcourse"), Some(80));
    }
}
