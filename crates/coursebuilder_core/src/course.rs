//! crates/coursebuilder_core/src/course.rs
//!
//! The course's unit/lesson tree. Units are kept in course order; a unit may be
//! nested one level under another unit (an assessment embedded in a unit).

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub has_activity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Unit {
    pub id: String,
    pub title: String,
    /// Set when this unit is embedded in another unit.
    #[serde(default)]
    pub parent_unit: Option<String>,
    /// Track labels attached to the unit.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Wire form of an outline; `units` must be present, even if empty.
#[derive(Deserialize)]
struct OutlineDocument {
    units: Vec<Unit>,
}

/// A validated, ordered course tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "OutlineDocument")]
pub struct CourseOutline {
    units: Vec<Unit>,
}

impl TryFrom<OutlineDocument> for CourseOutline {
    type Error = CoreError;

    fn try_from(doc: OutlineDocument) -> Result<Self, Self::Error> {
        CourseOutline::new(doc.units)
    }
}

impl CourseOutline {
    /// Builds an outline, rejecting duplicate ids and dangling or multi-level parents.
    pub fn new(units: Vec<Unit>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for unit in &units {
            if !seen.insert(unit.id.as_str()) {
                return Err(CoreError::InvalidCourseOutline(format!(
                    "duplicate unit id '{}'",
                    unit.id
                )));
            }
            let mut lesson_ids = HashSet::new();
            for lesson in &unit.lessons {
                if !lesson_ids.insert(lesson.id.as_str()) {
                    return Err(CoreError::InvalidCourseOutline(format!(
                        "duplicate lesson id '{}' in unit '{}'",
                        lesson.id, unit.id
                    )));
                }
            }
        }

        for unit in &units {
            let Some(parent_id) = unit.parent_unit.as_deref() else {
                continue;
            };
            let parent = units.iter().find(|u| u.id == parent_id).ok_or_else(|| {
                CoreError::InvalidCourseOutline(format!(
                    "unit '{}' references unknown parent '{}'",
                    unit.id, parent_id
                ))
            })?;
            if parent.id == unit.id || parent.parent_unit.is_some() {
                return Err(CoreError::InvalidCourseOutline(format!(
                    "unit '{}' must be nested directly under a top-level unit",
                    unit.id
                )));
            }
        }

        Ok(Self { units })
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// Lessons of a unit in course order; empty for unknown units.
    pub fn lessons(&self, unit_id: &str) -> &[Lesson] {
        self.unit(unit_id).map(|u| u.lessons.as_slice()).unwrap_or(&[])
    }

    pub fn parent_unit(&self, unit_id: &str) -> Option<&str> {
        self.unit(unit_id).and_then(|u| u.parent_unit.as_deref())
    }

    pub fn track_labels(&self, unit_id: &str) -> &[String] {
        self.unit(unit_id).map(|u| u.labels.as_slice()).unwrap_or(&[])
    }

    /// Units nested directly under `unit_id`, in course order.
    pub fn children<'a>(&'a self, unit_id: &'a str) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units
            .iter()
            .filter(move |u| u.parent_unit.as_deref() == Some(unit_id))
    }
}
