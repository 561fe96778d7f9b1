//! crates/coursebuilder_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database; they derive serde so the
//! web layer can hand them straight to JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The stored state of one assessment type for a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssessmentEntry {
    /// Best score ever submitted.
    pub score: Option<i32>,
    /// Most recently submitted answer, kept opaque.
    pub answer: Option<String>,
}

/// A student enrolled (or previously enrolled) in the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StudentRecord {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_enrolled: bool,
    pub enrolled_on: DateTime<Utc>,
    /// Keyed by assessment-type label.
    #[serde(default)]
    pub assessments: BTreeMap<String, AssessmentEntry>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl StudentRecord {
    /// A freshly enrolled student with no scores.
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name,
            is_enrolled: true,
            enrolled_on: Utc::now(),
            assessments: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn assessment_score(&self, assessment_type: &str) -> Option<i32> {
        self.assessments.get(assessment_type).and_then(|a| a.score)
    }

    pub fn set_assessment_score(&mut self, assessment_type: &str, score: i32) {
        self.assessments
            .entry(assessment_type.to_string())
            .or_default()
            .score = Some(score);
    }

    pub fn assessment_answer(&self, assessment_type: &str) -> Option<&str> {
        self.assessments
            .get(assessment_type)
            .and_then(|a| a.answer.as_deref())
    }

    pub fn set_assessment_answer(&mut self, assessment_type: &str, answer: String) {
        self.assessments
            .entry(assessment_type.to_string())
            .or_default()
            .answer = Some(answer);
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn set_metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    /// Every assessment that has a recorded score, in label order.
    pub fn all_scores(&self) -> Vec<ScoreLine> {
        self.assessments
            .iter()
            .filter_map(|(name, entry)| {
                entry.score.map(|score| ScoreLine {
                    assessment_type: name.clone(),
                    score,
                })
            })
            .collect()
    }
}

/// One row of a student's score sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreLine {
    pub assessment_type: String,
    pub score: i32,
}

/// Completion state of a lesson (or of the activity attached to it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    /// Weight used when turning lesson states into a unit percentage.
    pub fn weight(self) -> u32 {
        match self {
            LessonStatus::NotStarted => 0,
            LessonStatus::InProgress => 1,
            LessonStatus::Completed => 2,
        }
    }

    pub fn from_weight(weight: i16) -> Option<Self> {
        match weight {
            0 => Some(LessonStatus::NotStarted),
            1 => Some(LessonStatus::InProgress),
            2 => Some(LessonStatus::Completed),
            _ => None,
        }
    }
}

/// Identifies a lesson within its unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LessonKey {
    pub unit_id: String,
    pub lesson_id: String,
}

impl LessonKey {
    pub fn new(unit_id: impl Into<String>, lesson_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            lesson_id: lesson_id.into(),
        }
    }
}

/// Everything the completion tracker knows about one student, fetched in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Percent complete (0..=100) per unit.
    pub unit_completion: BTreeMap<String, u8>,
    pub lessons: BTreeMap<LessonKey, LessonStatus>,
    pub activities: BTreeMap<LessonKey, LessonStatus>,
}

impl ProgressSnapshot {
    pub fn lesson_status(&self, unit_id: &str, lesson_id: &str) -> LessonStatus {
        self.lessons
            .get(&LessonKey::new(unit_id, lesson_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn activity_status(&self, unit_id: &str, lesson_id: &str) -> Option<LessonStatus> {
        self.activities
            .get(&LessonKey::new(unit_id, lesson_id))
            .copied()
    }
}

/// A teacher registered against the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Teacher {
    pub email: String,
    pub user_id: String,
    pub name: Option<String>,
    pub school: Option<String>,
    pub additional_fields: Option<String>,
    pub enrolled_on: DateTime<Utc>,
}

/// Per-student summary stored on a section roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SectionStudent {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(default)]
    pub unit_completion: BTreeMap<String, u8>,
    /// `None` when the course has no units to average over.
    pub course_completion: Option<u8>,
    #[serde(default)]
    pub detailed_course_completion: Vec<crate::progress::UnitDetail>,
}

/// A teacher-owned group of students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourseSection {
    pub section_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub year: Option<i32>,
    pub created_at: DateTime<Utc>,
    /// Keyed by student user id.
    #[serde(default)]
    pub students: BTreeMap<String, SectionStudent>,
}

impl CourseSection {
    /// Creates an empty section; a fresh id is generated when none is supplied.
    pub fn new(section_id: Option<String>, name: impl Into<String>) -> Self {
        Self {
            section_id: section_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: name.into(),
            description: None,
            is_active: true,
            year: None,
            created_at: Utc::now(),
            students: BTreeMap::new(),
        }
    }
}
