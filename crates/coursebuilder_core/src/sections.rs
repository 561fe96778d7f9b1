//! crates/coursebuilder_core/src/sections.rs
//!
//! Validation and bookkeeping for teacher-owned course sections.

use crate::course::CourseOutline;
use crate::domain::{CourseSection, ProgressSnapshot, SectionStudent, StudentRecord};
use crate::error::{CoreError, CoreResult};
use crate::progress;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

const MAX_NAME_LEN: usize = 200;

/// Interprets the textual active flag sections were historically stored with.
pub fn parse_active_flag(raw: &str) -> bool {
    matches!(raw, "True" | "true")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActiveFlag {
    Bool(bool),
    Text(String),
}

fn deserialize_active_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ActiveFlag>::deserialize(deserializer)?.map(|flag| match flag {
        ActiveFlag::Bool(b) => b,
        ActiveFlag::Text(s) => parse_active_flag(&s),
    }))
}

/// Payload for creating a section.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SectionDraft {
    pub section_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_active_flag")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<bool>))]
    pub is_active: Option<bool>,
    pub year: Option<i32>,
}

/// Partial update of a section; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_active_flag")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<bool>))]
    pub is_active: Option<bool>,
    pub year: Option<i32>,
}

fn validate_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidSection("name is required".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::InvalidSection(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn validate_section_id(id: &str) -> CoreResult<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(CoreError::InvalidSection(format!(
            "'{}' is not a usable section id",
            id
        )));
    }
    Ok(id.to_string())
}

impl SectionDraft {
    pub fn into_section(self) -> CoreResult<CourseSection> {
        let name = validate_name(&self.name)?;
        let section_id = self.section_id.as_deref().map(validate_section_id).transpose()?;
        let mut section = CourseSection::new(section_id, name);
        section.description = self.description.filter(|d| !d.trim().is_empty());
        section.is_active = self.is_active.unwrap_or(true);
        section.year = self.year;
        Ok(section)
    }
}

impl SectionUpdate {
    pub fn apply(self, section: &mut CourseSection) -> CoreResult<()> {
        if let Some(name) = self.name {
            section.name = validate_name(&name)?;
        }
        if let Some(description) = self.description {
            section.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(is_active) = self.is_active {
            section.is_active = is_active;
        }
        if let Some(year) = self.year {
            section.year = Some(year);
        }
        Ok(())
    }
}

/// Adds `section` to a teacher's sections, refusing to overwrite an existing id.
pub fn insert_section(
    sections: &mut BTreeMap<String, CourseSection>,
    section: CourseSection,
) -> CoreResult<()> {
    if sections.contains_key(&section.section_id) {
        return Err(CoreError::DuplicateSection(section.section_id));
    }
    sections.insert(section.section_id.clone(), section);
    Ok(())
}

/// Roster entry for a student, with completion numbers computed from `snapshot`.
pub fn summarize_student(
    student: &StudentRecord,
    outline: &CourseOutline,
    snapshot: &ProgressSnapshot,
) -> SectionStudent {
    let unit_completion = progress::unit_completion(snapshot);
    // NoUnitsForAverage is the only failure; a roster shows it as "no figure".
    let course_completion = progress::overall_progress(&unit_completion).ok();
    SectionStudent {
        user_id: student.user_id.clone(),
        email: student.email.clone(),
        name: student.name.clone(),
        detailed_course_completion: progress::detailed_progress(outline, snapshot, false),
        unit_completion,
        course_completion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_flag_accepts_both_capitalisations() {
        assert!(parse_active_flag("True"));
        assert!(parse_active_flag("true"));
        assert!(!parse_active_flag("TRUE"));
        assert!(!parse_active_flag("yes"));
        assert!(!parse_active_flag(""));
    }

    #[test]
    fn draft_accepts_textual_flags() {
        let draft: SectionDraft =
            serde_json::from_str(r#"{"name":"Period 1","is_active":"false"}"#).unwrap();
        assert_eq!(draft.is_active, Some(false));
        let draft: SectionDraft = serde_json::from_str(r#"{"name":"Period 1","is_active":true}"#).unwrap();
        assert_eq!(draft.is_active, Some(true));
        let draft: SectionDraft = serde_json::from_str(r#"{"name":"Period 1"}"#).unwrap();
        assert_eq!(draft.is_active, None);
    }

    #[test]
    fn draft_defaults_to_active_with_generated_id() {
        let section = SectionDraft {
            name: "  Algebra  ".into(),
            ..Default::default()
        }
        .into_section()
        .unwrap();
        assert_eq!(section.name, "Algebra");
        assert!(section.is_active);
        assert!(!section.section_id.is_empty());
    }

    #[test]
    fn draft_requires_a_name() {
        let err = SectionDraft::default().into_section().unwrap_err();
        assert!(matches!(err, CoreError::InvalidSection(_)));
    }

    #[test]
    fn draft_rejects_path_like_ids() {
        let err = SectionDraft {
            section_id: Some("a/b".into()),
            name: "x".into(),
            ..Default::default()
        }
        .into_section()
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSection(_)));
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let mut sections = BTreeMap::new();
        let first = CourseSection::new(Some("p1".into()), "Period 1");
        let second = CourseSection::new(Some("p1".into()), "Period 1 again");
        insert_section(&mut sections, first).unwrap();
        let err = insert_section(&mut sections, second).unwrap_err();
        assert_eq!(err, CoreError::DuplicateSection("p1".into()));
        assert_eq!(sections["p1"].name, "Period 1");
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut section = CourseSection::new(Some("p1".into()), "Period 1");
        section.year = Some(2014);
        SectionUpdate {
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&mut section)
        .unwrap();
        assert!(!section.is_active);
        assert_eq!(section.name, "Period 1");
        assert_eq!(section.year, Some(2014));
    }

    #[test]
    fn summary_has_no_average_without_units() {
        let student = StudentRecord::new("u1", "ada@example.com", None);
        let summary = summarize_student(&student, &CourseOutline::default(), &ProgressSnapshot::default());
        assert_eq!(summary.course_completion, None);
        assert!(summary.detailed_course_completion.is_empty());
        assert_eq!(summary.email, "ada@example.com");
    }
}
