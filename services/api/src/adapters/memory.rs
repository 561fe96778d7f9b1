//! services/api/src/adapters/memory.rs
//!
//! An in-memory adapter implementing every storage port. Used when no
//! `DATABASE_URL` is configured and by the integration tests.

use async_trait::async_trait;
use coursebuilder_core::analytics::QuestionResult;
use coursebuilder_core::course::CourseOutline;
use coursebuilder_core::domain::{
    CourseSection, LessonKey, LessonStatus, ProgressSnapshot, SectionStudent, StudentRecord,
    Teacher,
};
use coursebuilder_core::error::CoreError;
use coursebuilder_core::ports::{
    CompletionTracker, CourseCatalog, PortError, PortResult, SectionStore, StudentStore,
    TeacherStore,
};
use coursebuilder_core::enrollment::{self, RegistrationOutcome, RegistrationRequest};
use coursebuilder_core::scoring::{self, AssessmentType, Submission};
use coursebuilder_core::{progress, sections};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

/// What the tracker has recorded for one student.
#[derive(Default)]
struct TrackerState {
    lessons: BTreeMap<LessonKey, LessonStatus>,
    activities: BTreeMap<LessonKey, LessonStatus>,
    completed_units: BTreeSet<String>,
    questions: BTreeMap<LessonKey, Vec<QuestionResult>>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
pub struct MemoryAdapter {
    outline: RwLock<CourseOutline>,
    students: RwLock<BTreeMap<String, StudentRecord>>,
    progress: RwLock<HashMap<String, TrackerState>>,
    teachers: RwLock<BTreeMap<String, Teacher>>,
    /// Sections keyed by teacher email, then section id.
    sections: RwLock<HashMap<String, BTreeMap<String, CourseSection>>>,
}

impl MemoryAdapter {
    pub fn new(outline: CourseOutline) -> Self {
        Self {
            outline: RwLock::new(outline),
            ..Default::default()
        }
    }

    /// Replaces the course outline.
    pub async fn set_outline(&self, outline: CourseOutline) {
        *self.outline.write().await = outline;
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

fn email_taken(students: &BTreeMap<String, StudentRecord>, user_id: &str, email: &str) -> bool {
    students
        .values()
        .any(|s| s.user_id != user_id && s.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl StudentStore for MemoryAdapter {
    async fn get_student_by_user_id(&self, user_id: &str) -> PortResult<StudentRecord> {
        self.students
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", user_id)))
    }

    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentRecord> {
        self.students
            .read()
            .await
            .values()
            .find(|s| s.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", email)))
    }

    async fn register_student(
        &self,
        request: &RegistrationRequest,
    ) -> PortResult<(StudentRecord, RegistrationOutcome)> {
        // One write guard covers the head count and the insert.
        let mut students = self.students.write().await;
        if email_taken(&students, &request.user_id, &request.email) {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                request.email
            )));
        }
        let existing = students.get(&request.user_id).cloned();
        let class_size = students.len() as u64;
        let (student, outcome) = enrollment::register(existing, request.clone(), class_size)?;
        if outcome != RegistrationOutcome::AlreadyEnrolled {
            students.insert(student.user_id.clone(), student.clone());
        }
        Ok((student, outcome))
    }

    async fn save_profile(&self, student: &StudentRecord) -> PortResult<()> {
        let mut students = self.students.write().await;
        if email_taken(&students, &student.user_id, &student.email) {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                student.email
            )));
        }
        let stored = students
            .get_mut(&student.user_id)
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", student.user_id)))?;
        stored.email = student.email.clone();
        stored.name = student.name.clone();
        stored.is_enrolled = student.is_enrolled;
        Ok(())
    }

    async fn submit_assessment(
        &self,
        user_id: &str,
        assessment_type: &AssessmentType,
        score: i32,
        answer: String,
    ) -> PortResult<Submission> {
        let mut students = self.students.write().await;
        let stored = students
            .get_mut(user_id)
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", user_id)))?;
        let mut student = stored.clone();
        let outcome = scoring::store_assessment(&mut student, assessment_type, score, answer)?;
        *stored = student.clone();
        Ok(Submission { outcome, student })
    }
}

#[async_trait]
impl CourseCatalog for MemoryAdapter {
    async fn load_outline(&self) -> PortResult<CourseOutline> {
        Ok(self.outline.read().await.clone())
    }
}

#[async_trait]
impl CompletionTracker for MemoryAdapter {
    async fn load_progress(
        &self,
        user_id: &str,
        outline: &CourseOutline,
    ) -> PortResult<ProgressSnapshot> {
        let progress = self.progress.read().await;
        let snapshot = match progress.get(user_id) {
            Some(state) => progress::build_snapshot(
                outline,
                state.lessons.clone(),
                state.activities.clone(),
                &state.completed_units,
            ),
            None => progress::build_snapshot(
                outline,
                BTreeMap::new(),
                BTreeMap::new(),
                &BTreeSet::new(),
            ),
        };
        Ok(snapshot)
    }

    async fn record_lesson(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()> {
        self.progress
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .lessons
            .insert(LessonKey::new(unit_id, lesson_id), status);
        Ok(())
    }

    async fn record_activity(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()> {
        self.progress
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .activities
            .insert(LessonKey::new(unit_id, lesson_id), status);
        Ok(())
    }

    async fn record_unit_completed(&self, user_id: &str, unit_id: &str) -> PortResult<()> {
        self.progress
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .completed_units
            .insert(unit_id.to_string());
        Ok(())
    }

    async fn record_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        results: &[QuestionResult],
    ) -> PortResult<()> {
        self.progress
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .questions
            .insert(LessonKey::new(unit_id, lesson_id), results.to_vec());
        Ok(())
    }

    async fn load_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
    ) -> PortResult<Vec<QuestionResult>> {
        Ok(self
            .progress
            .read()
            .await
            .get(user_id)
            .and_then(|state| state.questions.get(&LessonKey::new(unit_id, lesson_id)))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TeacherStore for MemoryAdapter {
    async fn get_teacher_by_email(&self, email: &str) -> PortResult<Teacher> {
        self.teachers
            .read()
            .await
            .get(&email.to_lowercase())
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", email)))
    }

    async fn save_teacher(&self, teacher: &Teacher) -> PortResult<()> {
        self.teachers
            .write()
            .await
            .insert(teacher.email.to_lowercase(), teacher.clone());
        Ok(())
    }
}

fn section_not_found(section_id: &str) -> PortError {
    PortError::NotFound(format!("Section {} not found", section_id))
}

#[async_trait]
impl SectionStore for MemoryAdapter {
    async fn list_sections(&self, teacher_email: &str) -> PortResult<Vec<CourseSection>> {
        let sections = self.sections.read().await;
        let mut list: Vec<CourseSection> = sections
            .get(teacher_email)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn get_section(&self, teacher_email: &str, section_id: &str) -> PortResult<CourseSection> {
        self.sections
            .read()
            .await
            .get(teacher_email)
            .and_then(|owned| owned.get(section_id))
            .cloned()
            .ok_or_else(|| section_not_found(section_id))
    }

    async fn create_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()> {
        let mut sections = self.sections.write().await;
        let owned = sections.entry(teacher_email.to_string()).or_default();
        sections::insert_section(owned, section.clone()).map_err(|e| match e {
            CoreError::DuplicateSection(id) => {
                PortError::Conflict(format!("Section {} already exists", id))
            }
            other => PortError::Unexpected(other.to_string()),
        })
    }

    async fn update_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()> {
        let mut sections = self.sections.write().await;
        let stored = sections
            .get_mut(teacher_email)
            .and_then(|owned| owned.get_mut(&section.section_id))
            .ok_or_else(|| section_not_found(&section.section_id))?;
        stored.name = section.name.clone();
        stored.description = section.description.clone();
        stored.is_active = section.is_active;
        stored.year = section.year;
        Ok(())
    }

    async fn add_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        student: &StudentRecord,
    ) -> PortResult<()> {
        let mut sections = self.sections.write().await;
        let stored = sections
            .get_mut(teacher_email)
            .and_then(|owned| owned.get_mut(section_id))
            .ok_or_else(|| section_not_found(section_id))?;
        stored.students.insert(
            student.user_id.clone(),
            SectionStudent {
                user_id: student.user_id.clone(),
                email: student.email.clone(),
                name: student.name.clone(),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn remove_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        user_id: &str,
    ) -> PortResult<()> {
        let mut sections = self.sections.write().await;
        let stored = sections
            .get_mut(teacher_email)
            .and_then(|owned| owned.get_mut(section_id))
            .ok_or_else(|| section_not_found(section_id))?;
        stored
            .students
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Student {} is not in section {}", user_id, section_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn sections_are_scoped_per_teacher() {
        let store = MemoryAdapter::default();
        let section = CourseSection::new(Some("p1".into()), "Period 1");

        store.create_section("a@example.com", &section).await.unwrap();
        store.create_section("b@example.com", &section).await.unwrap();
        let dup = store.create_section("a@example.com", &section).await;
        assert!(matches!(dup, Err(PortError::Conflict(_))));

        assert_eq!(store.list_sections("a@example.com").await.unwrap().len(), 1);
        assert!(store.list_sections("c@example.com").await.unwrap().is_empty());
    }

    fn registration(user_id: &str, email: &str, max: Option<u64>) -> RegistrationRequest {
        RegistrationRequest {
            user_id: user_id.to_string(),
            email: email.to_string(),
            name: None,
            max_class_size: max,
        }
    }

    #[tokio::test]
    async fn email_must_stay_unique() {
        let store = MemoryAdapter::default();
        store
            .register_student(&registration("u1", "ada@example.com", None))
            .await
            .unwrap();
        let clash = store
            .register_student(&registration("u2", "ADA@example.com", None))
            .await;
        assert!(matches!(clash, Err(PortError::Conflict(_))));
        assert!(store.get_student_by_user_id("u2").await.is_err());
    }

    #[tokio::test]
    async fn concurrent_registrations_respect_the_class_size() {
        let store = Arc::new(MemoryAdapter::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .register_student(&registration(
                            &format!("u{i}"),
                            &format!("s{i}@example.com"),
                            Some(3),
                        ))
                        .await
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(PortError::Rejected(CoreError::ClassFull(3))) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(store.students.read().await.len(), 3);
    }

    #[tokio::test]
    async fn overlapping_submissions_keep_the_best_score() {
        let store = Arc::new(MemoryAdapter::default());
        store
            .register_student(&registration("u1", "ada@example.com", None))
            .await
            .unwrap();

        let high = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .submit_assessment("u1", &AssessmentType::Midcourse, 90, "first".into())
                    .await
            })
        };
        let low = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .submit_assessment("u1", &AssessmentType::Midcourse, 60, "second".into())
                    .await
            })
        };
        high.await.unwrap().unwrap();
        low.await.unwrap().unwrap();

        let student = store.get_student_by_user_id("u1").await.unwrap();
        assert_eq!(student.assessment_score("midcourse"), Some(90));
    }

    #[tokio::test]
    async fn profile_saves_do_not_touch_scores() {
        let store = MemoryAdapter::default();
        let (mut stale, _) = store
            .register_student(&registration("u1", "ada@example.com", None))
            .await
            .unwrap();
        store
            .submit_assessment("u1", &AssessmentType::Midcourse, 80, "a".into())
            .await
            .unwrap();

        stale.name = Some("Ada".into());
        store.save_profile(&stale).await.unwrap();

        let student = store.get_student_by_user_id("u1").await.unwrap();
        assert_eq!(student.name.as_deref(), Some("Ada"));
        assert_eq!(student.assessment_score("midcourse"), Some(80));
    }

    #[tokio::test]
    async fn question_results_are_replaced_per_lesson() {
        let store = MemoryAdapter::default();
        let result = |selected: u32| QuestionResult {
            sequence: 0,
            kind: coursebuilder_core::QuestionKind::MultipleChoice,
            choice_count: 3,
            selected: vec![selected],
            score: 0.0,
        };
        store.record_question_results("u1", "1", "l1", &[result(0)]).await.unwrap();
        store.record_question_results("u1", "1", "l1", &[result(2)]).await.unwrap();

        let stored = store.load_question_results("u1", "1", "l1").await.unwrap();
        assert_eq!(stored, vec![result(2)]);
        assert!(store.load_question_results("u1", "1", "l2").await.unwrap().is_empty());
    }
}
