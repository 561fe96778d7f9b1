//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of
//! the storage ports from the `core` crate. It handles all interactions with
//! the database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursebuilder_core::analytics::{QuestionKind, QuestionResult};
use coursebuilder_core::course::{CourseOutline, Lesson, Unit};
use coursebuilder_core::domain::{
    AssessmentEntry, CourseSection, LessonKey, LessonStatus, ProgressSnapshot, SectionStudent,
    StudentRecord, Teacher,
};
use coursebuilder_core::ports::{
    CompletionTracker, CourseCatalog, PortError, PortResult, SectionStore, StudentStore,
    TeacherStore,
};
use coursebuilder_core::enrollment::{self, RegistrationOutcome, RegistrationRequest};
use coursebuilder_core::progress;
use coursebuilder_core::scoring::{self, AssessmentType, Submission};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const STUDENT_COLUMNS: &str = "SELECT user_id, email, name, is_enrolled, enrolled_on FROM students";

/// Attaches assessments and metrics to `record`, reading on `conn` so callers
/// inside a transaction see their own locks.
async fn load_student(conn: &mut PgConnection, record: StudentRow) -> PortResult<StudentRecord> {
    let assessments = sqlx::query_as::<_, AssessmentRow>(
        "SELECT assessment_type, score, answer FROM student_assessments WHERE user_id = $1",
    )
    .bind(&record.user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?;

    let metrics = sqlx::query_as::<_, MetricRow>(
        "SELECT name, value FROM student_metrics WHERE user_id = $1",
    )
    .bind(&record.user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?;

    Ok(record.to_domain(assessments, metrics))
}

async fn upsert_profile(conn: &mut PgConnection, student: &StudentRecord) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO students (user_id, email, name, is_enrolled, enrolled_on) VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_id) DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name, is_enrolled = EXCLUDED.is_enrolled",
    )
    .bind(&student.user_id)
    .bind(&student.email)
    .bind(&student.name)
    .bind(student.is_enrolled)
    .bind(student.enrolled_on)
    .execute(&mut *conn)
    .await
    .map_err(conflict_or(format!("Email {}", student.email)))?;
    Ok(())
}

/// Writes one assessment row and every metric of `student`.
async fn write_scores(
    conn: &mut PgConnection,
    student: &StudentRecord,
    assessment_type: &str,
) -> PortResult<()> {
    if let Some(entry) = student.assessments.get(assessment_type) {
        sqlx::query(
            "INSERT INTO student_assessments (user_id, assessment_type, score, answer) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, assessment_type) DO UPDATE SET score = EXCLUDED.score, answer = EXCLUDED.answer",
        )
        .bind(&student.user_id)
        .bind(assessment_type)
        .bind(entry.score)
        .bind(&entry.answer)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    }

    for (name, value) in &student.metrics {
        sqlx::query(
            "INSERT INTO student_metrics (user_id, name, value) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, name) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(&student.user_id)
        .bind(name)
        .bind(*value)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    }
    Ok(())
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn conflict_or(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StudentRow {
    user_id: String,
    email: String,
    name: Option<String>,
    is_enrolled: bool,
    enrolled_on: DateTime<Utc>,
}
impl StudentRow {
    fn to_domain(self, assessments: Vec<AssessmentRow>, metrics: Vec<MetricRow>) -> StudentRecord {
        StudentRecord {
            user_id: self.user_id,
            email: self.email,
            name: self.name,
            is_enrolled: self.is_enrolled,
            enrolled_on: self.enrolled_on,
            assessments: assessments
                .into_iter()
                .map(|a| {
                    (
                        a.assessment_type,
                        AssessmentEntry {
                            score: a.score,
                            answer: a.answer,
                        },
                    )
                })
                .collect(),
            metrics: metrics.into_iter().map(|m| (m.name, m.value)).collect(),
        }
    }
}

#[derive(FromRow)]
struct AssessmentRow {
    assessment_type: String,
    score: Option<i32>,
    answer: Option<String>,
}

#[derive(FromRow)]
struct MetricRow {
    name: String,
    value: f64,
}

#[derive(FromRow)]
struct UnitRow {
    id: String,
    title: String,
    parent_unit: Option<String>,
    labels: Vec<String>,
}

#[derive(FromRow)]
struct LessonRow {
    unit_id: String,
    id: String,
    title: String,
    has_activity: bool,
}

#[derive(FromRow)]
struct LessonProgressRow {
    unit_id: String,
    lesson_id: String,
    status: i16,
    activity_status: Option<i16>,
}

#[derive(FromRow)]
struct TeacherRow {
    email: String,
    user_id: String,
    name: Option<String>,
    school: Option<String>,
    additional_fields: Option<String>,
    enrolled_on: DateTime<Utc>,
}
impl TeacherRow {
    fn to_domain(self) -> Teacher {
        Teacher {
            email: self.email,
            user_id: self.user_id,
            name: self.name,
            school: self.school,
            additional_fields: self.additional_fields,
            enrolled_on: self.enrolled_on,
        }
    }
}

#[derive(FromRow)]
struct SectionRow {
    section_id: String,
    name: String,
    description: Option<String>,
    is_active: bool,
    year: Option<i32>,
    created_at: DateTime<Utc>,
}
impl SectionRow {
    fn to_domain(self, roster: Vec<RosterRow>) -> CourseSection {
        CourseSection {
            section_id: self.section_id,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            year: self.year,
            created_at: self.created_at,
            students: roster
                .into_iter()
                .map(|r| {
                    let student = SectionStudent {
                        user_id: r.user_id.clone(),
                        email: r.email,
                        name: r.name,
                        ..Default::default()
                    };
                    (r.user_id, student)
                })
                .collect(),
        }
    }
}

#[derive(FromRow)]
struct RosterRow {
    section_id: String,
    user_id: String,
    email: String,
    name: Option<String>,
}

#[derive(FromRow)]
struct QuestionRow {
    sequence: i32,
    kind: String,
    choice_count: i32,
    selected: Vec<i32>,
    score: f64,
}
impl QuestionRow {
    fn to_domain(self) -> Option<QuestionResult> {
        let kind = match self.kind.as_str() {
            "multiple_choice" => QuestionKind::MultipleChoice,
            "short_answer" => QuestionKind::ShortAnswer,
            other => {
                warn!("Unknown question kind {} in question_results; skipping", other);
                return None;
            }
        };
        Some(QuestionResult {
            sequence: self.sequence.max(0) as u32,
            kind,
            choice_count: self.choice_count.max(0) as u32,
            selected: self.selected.into_iter().map(|c| c.max(0) as u32).collect(),
            score: self.score,
        })
    }
}

fn kind_to_db(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::MultipleChoice => "multiple_choice",
        QuestionKind::ShortAnswer => "short_answer",
    }
}

fn status_from_db(raw: i16) -> LessonStatus {
    LessonStatus::from_weight(raw).unwrap_or_else(|| {
        warn!("Unknown lesson status {} in lesson_progress; treating as not started", raw);
        LessonStatus::NotStarted
    })
}

fn status_to_db(status: LessonStatus) -> i16 {
    status.weight() as i16
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl StudentStore for DbAdapter {
    async fn get_student_by_user_id(&self, user_id: &str) -> PortResult<StudentRecord> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, StudentRow>(&format!("{} WHERE user_id = $1", STUDENT_COLUMNS))
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(not_found_or(format!("Student {}", user_id)))?;
        load_student(&mut conn, record).await
    }

    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentRecord> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, StudentRow>(&format!(
            "{} WHERE lower(email) = lower($1)",
            STUDENT_COLUMNS
        ))
        .bind(email)
        .fetch_one(&mut *conn)
        .await
        .map_err(not_found_or(format!("Student {}", email)))?;
        load_student(&mut conn, record).await
    }

    async fn register_student(
        &self,
        request: &RegistrationRequest,
    ) -> PortResult<(StudentRecord, RegistrationOutcome)> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Serializes registrations until commit; plain reads are not blocked.
        sqlx::query("LOCK TABLE students IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let row = sqlx::query_as::<_, StudentRow>(&format!("{} WHERE user_id = $1", STUDENT_COLUMNS))
            .bind(&request.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        let existing = match row {
            Some(row) => Some(load_student(&mut tx, row).await?),
            None => None,
        };

        let class_size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        let (student, outcome) =
            enrollment::register(existing, request.clone(), class_size.max(0) as u64)?;
        if outcome != RegistrationOutcome::AlreadyEnrolled {
            upsert_profile(&mut tx, &student).await?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok((student, outcome))
    }

    async fn save_profile(&self, student: &StudentRecord) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE students SET email = $2, name = $3, is_enrolled = $4 WHERE user_id = $1",
        )
        .bind(&student.user_id)
        .bind(&student.email)
        .bind(&student.name)
        .bind(student.is_enrolled)
        .execute(&self.pool)
        .await
        .map_err(conflict_or(format!("Email {}", student.email)))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Student {} not found", student.user_id)));
        }
        Ok(())
    }

    async fn submit_assessment(
        &self,
        user_id: &str,
        assessment_type: &AssessmentType,
        score: i32,
        answer: String,
    ) -> PortResult<Submission> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The row lock holds off other submissions for this student until commit.
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "{} WHERE user_id = $1 FOR UPDATE",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found_or(format!("Student {}", user_id)))?;
        let mut student = load_student(&mut tx, row).await?;

        let outcome = scoring::store_assessment(&mut student, assessment_type, score, answer)?;
        write_scores(&mut tx, &student, assessment_type.as_str()).await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(Submission { outcome, student })
    }
}

#[async_trait]
impl CourseCatalog for DbAdapter {
    async fn load_outline(&self) -> PortResult<CourseOutline> {
        let unit_rows = sqlx::query_as::<_, UnitRow>(
            "SELECT id, title, parent_unit, labels FROM course_units ORDER BY position ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let lesson_rows = sqlx::query_as::<_, LessonRow>(
            "SELECT unit_id, id, title, has_activity FROM course_lessons ORDER BY unit_id, position ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut lessons: BTreeMap<String, Vec<Lesson>> = BTreeMap::new();
        for row in lesson_rows {
            lessons.entry(row.unit_id).or_default().push(Lesson {
                id: row.id,
                title: row.title,
                has_activity: row.has_activity,
            });
        }

        let units = unit_rows
            .into_iter()
            .map(|row| Unit {
                lessons: lessons.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                parent_unit: row.parent_unit,
                labels: row.labels,
            })
            .collect();

        CourseOutline::new(units).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl CompletionTracker for DbAdapter {
    async fn load_progress(
        &self,
        user_id: &str,
        outline: &CourseOutline,
    ) -> PortResult<ProgressSnapshot> {
        let rows = sqlx::query_as::<_, LessonProgressRow>(
            "SELECT unit_id, lesson_id, status, activity_status FROM lesson_progress WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let completed: Vec<String> =
            sqlx::query_scalar("SELECT unit_id FROM unit_completions WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(unexpected)?;

        let mut lessons = BTreeMap::new();
        let mut activities = BTreeMap::new();
        for row in rows {
            let key = LessonKey::new(row.unit_id, row.lesson_id);
            if let Some(activity) = row.activity_status {
                activities.insert(key.clone(), status_from_db(activity));
            }
            lessons.insert(key, status_from_db(row.status));
        }
        let completed_units: BTreeSet<String> = completed.into_iter().collect();

        Ok(progress::build_snapshot(outline, lessons, activities, &completed_units))
    }

    async fn record_lesson(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO lesson_progress (user_id, unit_id, lesson_id, status) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, unit_id, lesson_id) DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(unit_id)
        .bind(lesson_id)
        .bind(status_to_db(status))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn record_activity(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        status: LessonStatus,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO lesson_progress (user_id, unit_id, lesson_id, activity_status) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, unit_id, lesson_id) DO UPDATE SET activity_status = EXCLUDED.activity_status, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(unit_id)
        .bind(lesson_id)
        .bind(status_to_db(status))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn record_unit_completed(&self, user_id: &str, unit_id: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO unit_completions (user_id, unit_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(unit_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn record_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
        results: &[QuestionResult],
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "DELETE FROM question_results WHERE user_id = $1 AND unit_id = $2 AND lesson_id = $3",
        )
        .bind(user_id)
        .bind(unit_id)
        .bind(lesson_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        for result in results {
            let selected: Vec<i32> = result.selected.iter().map(|&c| c as i32).collect();
            sqlx::query(
                "INSERT INTO question_results (user_id, unit_id, lesson_id, sequence, kind, choice_count, selected, score) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(user_id)
            .bind(unit_id)
            .bind(lesson_id)
            .bind(result.sequence as i32)
            .bind(kind_to_db(result.kind))
            .bind(result.choice_count as i32)
            .bind(selected)
            .bind(result.score)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn load_question_results(
        &self,
        user_id: &str,
        unit_id: &str,
        lesson_id: &str,
    ) -> PortResult<Vec<QuestionResult>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT sequence, kind, choice_count, selected, score FROM question_results \
             WHERE user_id = $1 AND unit_id = $2 AND lesson_id = $3 ORDER BY sequence ASC",
        )
        .bind(user_id)
        .bind(unit_id)
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows.into_iter().filter_map(QuestionRow::to_domain).collect())
    }
}

#[async_trait]
impl TeacherStore for DbAdapter {
    async fn get_teacher_by_email(&self, email: &str) -> PortResult<Teacher> {
        let record = sqlx::query_as::<_, TeacherRow>(
            "SELECT email, user_id, name, school, additional_fields, enrolled_on FROM teachers WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or(format!("Teacher {}", email)))?;
        Ok(record.to_domain())
    }

    async fn save_teacher(&self, teacher: &Teacher) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO teachers (email, user_id, name, school, additional_fields, enrolled_on) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (email) DO UPDATE SET user_id = EXCLUDED.user_id, name = EXCLUDED.name, \
             school = EXCLUDED.school, additional_fields = EXCLUDED.additional_fields",
        )
        .bind(&teacher.email)
        .bind(&teacher.user_id)
        .bind(&teacher.name)
        .bind(&teacher.school)
        .bind(&teacher.additional_fields)
        .bind(teacher.enrolled_on)
        .execute(&self.pool)
        .await
        .map_err(conflict_or(format!("Teacher with user id {}", teacher.user_id)))?;
        Ok(())
    }
}

const ROSTER_QUERY: &str = "SELECT ss.section_id, s.user_id, s.email, s.name \
     FROM section_students ss JOIN students s ON s.user_id = ss.user_id \
     WHERE ss.teacher_email = $1";

#[async_trait]
impl SectionStore for DbAdapter {
    async fn list_sections(&self, teacher_email: &str) -> PortResult<Vec<CourseSection>> {
        let sections = sqlx::query_as::<_, SectionRow>(
            "SELECT section_id, name, description, is_active, year, created_at FROM course_sections \
             WHERE teacher_email = $1 ORDER BY created_at ASC",
        )
        .bind(teacher_email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let roster = sqlx::query_as::<_, RosterRow>(ROSTER_QUERY)
            .bind(teacher_email)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut by_section: BTreeMap<String, Vec<RosterRow>> = BTreeMap::new();
        for row in roster {
            by_section.entry(row.section_id.clone()).or_default().push(row);
        }

        Ok(sections
            .into_iter()
            .map(|s| {
                let students = by_section.remove(&s.section_id).unwrap_or_default();
                s.to_domain(students)
            })
            .collect())
    }

    async fn get_section(&self, teacher_email: &str, section_id: &str) -> PortResult<CourseSection> {
        let section = sqlx::query_as::<_, SectionRow>(
            "SELECT section_id, name, description, is_active, year, created_at FROM course_sections \
             WHERE teacher_email = $1 AND section_id = $2",
        )
        .bind(teacher_email)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or(format!("Section {}", section_id)))?;

        let roster = sqlx::query_as::<_, RosterRow>(&format!("{} AND ss.section_id = $2", ROSTER_QUERY))
            .bind(teacher_email)
            .bind(section_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(section.to_domain(roster))
    }

    async fn create_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO course_sections (teacher_email, section_id, name, description, is_active, year, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(teacher_email)
        .bind(&section.section_id)
        .bind(&section.name)
        .bind(&section.description)
        .bind(section.is_active)
        .bind(section.year)
        .bind(section.created_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_or(format!("Section {}", section.section_id)))?;
        Ok(())
    }

    async fn update_section(&self, teacher_email: &str, section: &CourseSection) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE course_sections SET name = $3, description = $4, is_active = $5, year = $6 \
             WHERE teacher_email = $1 AND section_id = $2",
        )
        .bind(teacher_email)
        .bind(&section.section_id)
        .bind(&section.name)
        .bind(&section.description)
        .bind(section.is_active)
        .bind(section.year)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Section {} not found", section.section_id)));
        }
        Ok(())
    }

    async fn add_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        student: &StudentRecord,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO section_students (teacher_email, section_id, user_id) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(teacher_email)
        .bind(section_id)
        .bind(&student.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Section {} not found", section_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(())
    }

    async fn remove_student(
        &self,
        teacher_email: &str,
        section_id: &str,
        user_id: &str,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "DELETE FROM section_students WHERE teacher_email = $1 AND section_id = $2 AND user_id = $3",
        )
        .bind(teacher_email)
        .bind(section_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Student {} is not in section {}",
                user_id, section_id
            )));
        }
        Ok(())
    }
}
