//! crates/coursebuilder_core/src/progress.rs
//!
//! Progress aggregation over a student's completion snapshot and the course
//! outline: per-unit percentages, the overall course percentage and an ordered
//! unit/lesson breakdown.

use crate::course::CourseOutline;
use crate::domain::{LessonKey, LessonStatus, ProgressSnapshot};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One lesson in the detailed breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LessonDetail {
    pub lesson_id: String,
    pub title: String,
    pub completion: LessonStatus,
    /// Only present for lessons that carry an activity.
    pub activity_completion: Option<LessonStatus>,
}

/// A unit embedded in another unit, reported inside its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EmbeddedUnit {
    pub unit_id: String,
    pub title: String,
    pub labels: Vec<String>,
    pub completion: u8,
}

/// One top-level unit in the detailed breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UnitDetail {
    pub unit_id: String,
    pub title: String,
    pub labels: Vec<String>,
    pub completion: u8,
    pub lessons: Vec<LessonDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assessments: Vec<EmbeddedUnit>,
}

/// Percent complete per unit, as reported by the completion tracker.
pub fn unit_completion(snapshot: &ProgressSnapshot) -> BTreeMap<String, u8> {
    snapshot.unit_completion.clone()
}

/// Mean of the unit percentages, floored.
pub fn overall_progress(unit_completion: &BTreeMap<String, u8>) -> CoreResult<u8> {
    if unit_completion.is_empty() {
        return Err(CoreError::NoUnitsForAverage);
    }
    let total: u64 = unit_completion.values().map(|&p| u64::from(p.min(100))).sum();
    let mean = total / unit_completion.len() as u64;
    Ok(mean as u8)
}

/// Ordered breakdown of units and their lessons.
///
/// Units nested under another unit never appear at the top level; with
/// `include_assessments` they are listed under their parent instead. Units the
/// snapshot has no entry for are left out.
pub fn detailed_progress(
    outline: &CourseOutline,
    snapshot: &ProgressSnapshot,
    include_assessments: bool,
) -> Vec<UnitDetail> {
    outline
        .units()
        .iter()
        .filter(|unit| unit.parent_unit.is_none())
        .filter_map(|unit| {
            let completion = *snapshot.unit_completion.get(&unit.id)?;

            let lessons = unit
                .lessons
                .iter()
                .map(|lesson| LessonDetail {
                    lesson_id: lesson.id.clone(),
                    title: lesson.title.clone(),
                    completion: snapshot.lesson_status(&unit.id, &lesson.id),
                    activity_completion: if lesson.has_activity {
                        Some(
                            snapshot
                                .activity_status(&unit.id, &lesson.id)
                                .unwrap_or_default(),
                        )
                    } else {
                        None
                    },
                })
                .collect();

            let assessments = if include_assessments {
                outline
                    .children(&unit.id)
                    .filter_map(|child| {
                        snapshot
                            .unit_completion
                            .get(&child.id)
                            .map(|&completion| EmbeddedUnit {
                                unit_id: child.id.clone(),
                                title: child.title.clone(),
                                labels: child.labels.clone(),
                                completion,
                            })
                    })
                    .collect()
            } else {
                Vec::new()
            };

            Some(UnitDetail {
                unit_id: unit.id.clone(),
                title: unit.title.clone(),
                labels: outline.track_labels(&unit.id).to_vec(),
                completion,
                lessons,
                assessments,
            })
        })
        .collect()
}

/// Derives unit percentages from recorded lesson states.
///
/// A unit with lessons scores the share of lesson weight earned (in-progress
/// lessons count half). A unit without lessons is all or nothing depending on
/// whether it was marked complete.
pub fn compute_unit_percentages(
    outline: &CourseOutline,
    lessons: &BTreeMap<LessonKey, LessonStatus>,
    completed_units: &BTreeSet<String>,
) -> BTreeMap<String, u8> {
    outline
        .units()
        .iter()
        .map(|unit| {
            let percent = if unit.lessons.is_empty() {
                if completed_units.contains(&unit.id) {
                    100
                } else {
                    0
                }
            } else {
                let earned: u32 = unit
                    .lessons
                    .iter()
                    .map(|lesson| {
                        lessons
                            .get(&LessonKey::new(unit.id.as_str(), lesson.id.as_str()))
                            .copied()
                            .unwrap_or_default()
                            .weight()
                    })
                    .sum();
                let possible = 2 * unit.lessons.len() as u32;
                (earned * 100 / possible) as u8
            };
            (unit.id.clone(), percent)
        })
        .collect()
}

/// Builds a snapshot from raw tracker state; entries for units no longer in the
/// outline are dropped.
pub fn build_snapshot(
    outline: &CourseOutline,
    lessons: BTreeMap<LessonKey, LessonStatus>,
    activities: BTreeMap<LessonKey, LessonStatus>,
    completed_units: &BTreeSet<String>,
) -> ProgressSnapshot {
    let unit_completion = compute_unit_percentages(outline, &lessons, completed_units);
    let known = |key: &LessonKey| outline.unit(&key.unit_id).is_some();
    ProgressSnapshot {
        unit_completion,
        lessons: lessons.into_iter().filter(|(k, _)| known(k)).collect(),
        activities: activities.into_iter().filter(|(k, _)| known(k)).collect(),
    }
}
