//! crates/coursebuilder_core/src/scoring.rs
//!
//! Assessment scoring: keeps the latest answer and the best score per
//! assessment type, and blends mid- and postcourse scores into the overall
//! course score.

use crate::domain::StudentRecord;
use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Metric under which the blended course score is stored.
pub const OVERALL_SCORE_METRIC: &str = "overall_score";

/// Overall score at or above which the course is passed.
pub const PASSING_SCORE: i32 = 70;

/// Weights, in percent, of the mid- and postcourse scores in the overall score.
const MIDCOURSE_WEIGHT: i64 = 30;
const POSTCOURSE_WEIGHT: i64 = 70;

/// A named category of graded activity, or an outcome label derived from one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssessmentType {
    Midcourse,
    Postcourse,
    PostcoursePass,
    PostcourseFail,
    Custom(String),
}

impl AssessmentType {
    pub fn as_str(&self) -> &str {
        match self {
            AssessmentType::Midcourse => "midcourse",
            AssessmentType::Postcourse => "postcourse",
            AssessmentType::PostcoursePass => "postcourse_pass",
            AssessmentType::PostcourseFail => "postcourse_fail",
            AssessmentType::Custom(name) => name,
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(CoreError::MissingPrerequisiteData(
                "assessment type is required".to_string(),
            ));
        }
        Ok(match name {
            "midcourse" => AssessmentType::Midcourse,
            "postcourse" => AssessmentType::Postcourse,
            "postcourse_pass" => AssessmentType::PostcoursePass,
            "postcourse_fail" => AssessmentType::PostcourseFail,
            other => AssessmentType::Custom(other.to_string()),
        })
    }
}

/// A committed submission: the label to report and the record as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub outcome: AssessmentType,
    pub student: StudentRecord,
}

/// Parses a score submitted as text, rounding to the nearest integer.
pub fn parse_score(raw: &str) -> CoreResult<i32> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CoreError::InvalidScoreValue(format!("'{}' is not a number", raw)))?;
    if !value.is_finite() {
        return Err(CoreError::InvalidScoreValue(format!("'{}' is not finite", raw)));
    }
    let rounded = value.round();
    if rounded < 0.0 {
        return Err(CoreError::InvalidScoreValue(format!("{} is negative", raw)));
    }
    if rounded > f64::from(i32::MAX) {
        return Err(CoreError::InvalidScoreValue(format!("{} is out of range", raw)));
    }
    Ok(rounded as i32)
}

/// `floor(0.30 * midcourse + 0.70 * postcourse)`, computed exactly.
pub fn overall_score(midcourse: i32, postcourse: i32) -> i32 {
    let weighted = MIDCOURSE_WEIGHT * i64::from(midcourse) + POSTCOURSE_WEIGHT * i64::from(postcourse);
    (weighted.div_euclid(100)) as i32
}

/// Outcome label for a blended overall score.
pub fn classify(overall: i32) -> AssessmentType {
    if overall >= PASSING_SCORE {
        AssessmentType::PostcoursePass
    } else {
        AssessmentType::PostcourseFail
    }
}

/// Records a submission on `record` and returns the label the caller should
/// report back. The caller commits `record`.
///
/// The answer is always replaced by the latest submission while the score only
/// moves upwards. For `postcourse` the overall score is recomputed and the
/// returned label becomes `postcourse_pass` or `postcourse_fail`.
// TODO: confirm with course owners whether "latest answer, best score" is the intended pairing.
pub fn store_assessment(
    record: &mut StudentRecord,
    assessment_type: &AssessmentType,
    new_score: i32,
    new_answer: String,
) -> CoreResult<AssessmentType> {
    if new_score < 0 {
        return Err(CoreError::InvalidScoreValue(format!(
            "{} is negative",
            new_score
        )));
    }

    let key = assessment_type.as_str();
    record.set_assessment_answer(key, new_answer);

    let previous = record.assessment_score(key);
    if previous.map_or(true, |p| new_score > p) {
        record.set_assessment_score(key, new_score);
    }

    if *assessment_type != AssessmentType::Postcourse {
        return Ok(assessment_type.clone());
    }

    let midcourse = record
        .assessment_score(AssessmentType::Midcourse.as_str())
        .unwrap_or(0);
    let postcourse = previous.map_or(new_score, |p| p.max(new_score));
    let overall = overall_score(midcourse, postcourse);
    record.set_metric(OVERALL_SCORE_METRIC, f64::from(overall));

    Ok(classify(overall))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentRecord {
        StudentRecord::new("u1", "ada@example.com", Some("Ada".to_string()))
    }

    #[test]
    fn keeps_best_score_and_latest_answer() {
        let mut rec = student();
        let t = AssessmentType::Midcourse;

        store_assessment(&mut rec, &t, 60, "first".into()).unwrap();
        store_assessment(&mut rec, &t, 80, "second".into()).unwrap();
        store_assessment(&mut rec, &t, 40, "third".into()).unwrap();

        assert_eq!(rec.assessment_score("midcourse"), Some(80));
        assert_eq!(rec.assessment_answer("midcourse"), Some("third"));
    }

    #[test]
    fn stored_score_is_max_for_any_order() {
        for previous in [0, 35, 70, 100] {
            for new in [0, 35, 70, 100] {
                let mut rec = student();
                let t = AssessmentType::Custom("quiz".into());
                store_assessment(&mut rec, &t, previous, "a".into()).unwrap();
                store_assessment(&mut rec, &t, new, "b".into()).unwrap();
                assert_eq!(rec.assessment_score("quiz"), Some(previous.max(new)));
                assert_eq!(rec.assessment_answer("quiz"), Some("b"));
            }
        }
    }

    #[test]
    fn resubmitting_is_idempotent() {
        let mut once = student();
        let mut twice = student();
        let t = AssessmentType::Postcourse;
        store_assessment(&mut once, &t, 75, "x".into()).unwrap();
        store_assessment(&mut twice, &t, 75, "x".into()).unwrap();
        store_assessment(&mut twice, &t, 75, "x".into()).unwrap();
        assert_eq!(once.assessments, twice.assessments);
        assert_eq!(once.metrics, twice.metrics);
    }

    #[test]
    fn non_final_types_are_returned_unchanged() {
        let mut rec = student();
        let t = AssessmentType::Custom("pre".into());
        let out = store_assessment(&mut rec, &t, 10, "a".into()).unwrap();
        assert_eq!(out, t);
        assert_eq!(rec.metric(OVERALL_SCORE_METRIC), None);
    }

    #[test]
    fn blends_mid_and_post_scores() {
        let mut rec = student();
        store_assessment(&mut rec, &AssessmentType::Midcourse, 80, "m".into()).unwrap();
        let out = store_assessment(&mut rec, &AssessmentType::Postcourse, 60, "p".into()).unwrap();
        assert_eq!(out, AssessmentType::PostcourseFail);
        assert_eq!(rec.metric(OVERALL_SCORE_METRIC), Some(66.0));
    }

    #[test]
    fn missing_midcourse_counts_as_zero() {
        let mut rec = student();
        let out = store_assessment(&mut rec, &AssessmentType::Postcourse, 90, "p".into()).unwrap();
        assert_eq!(out, AssessmentType::PostcourseFail);
        assert_eq!(rec.metric(OVERALL_SCORE_METRIC), Some(63.0));
    }

    #[test]
    fn overall_uses_best_postcourse_attempt() {
        let mut rec = student();
        store_assessment(&mut rec, &AssessmentType::Midcourse, 100, "m".into()).unwrap();
        store_assessment(&mut rec, &AssessmentType::Postcourse, 90, "p1".into()).unwrap();
        let out = store_assessment(&mut rec, &AssessmentType::Postcourse, 10, "p2".into()).unwrap();
        // 30 + 63
        assert_eq!(rec.metric(OVERALL_SCORE_METRIC), Some(93.0));
        assert_eq!(out, AssessmentType::PostcoursePass);
        assert_eq!(rec.assessment_answer("postcourse"), Some("p2"));
    }

    #[test]
    fn pass_boundary_is_seventy() {
        assert_eq!(classify(70), AssessmentType::PostcoursePass);
        assert_eq!(classify(69), AssessmentType::PostcourseFail);
    }

    #[test]
    fn overall_score_truncates_the_sum() {
        assert_eq!(overall_score(80, 60), 66);
        assert_eq!(overall_score(0, 90), 63);
        // 0.3 + 0.7 = 1.0, not 0 + 0
        assert_eq!(overall_score(1, 1), 1);
        // 2.1 + 0 -> 2
        assert_eq!(overall_score(7, 0), 2);
        assert_eq!(overall_score(100, 100), 100);
    }

    #[test]
    fn overall_score_is_monotonic() {
        for mid in (0..=100).step_by(7) {
            for post in (0..100).step_by(3) {
                let base = overall_score(mid, post);
                assert!(overall_score(mid + 1, post) >= base);
                assert!(overall_score(mid, post + 1) >= base);
            }
        }
    }

    #[test]
    fn negative_scores_are_rejected_without_mutation() {
        let mut rec = student();
        let err = store_assessment(&mut rec, &AssessmentType::Midcourse, -1, "a".into()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidScoreValue(_)));
        assert!(rec.assessments.is_empty());
    }

    #[test]
    fn parses_submitted_scores() {
        assert_eq!(parse_score("89.5").unwrap(), 90);
        assert_eq!(parse_score(" 42 ").unwrap(), 42);
        assert_eq!(parse_score("-0.2").unwrap(), 0);
        assert!(parse_score("abc").is_err());
        assert!(parse_score("-3").is_err());
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("inf").is_err());
    }

    #[test]
    fn assessment_type_labels_round_trip() {
        for label in ["midcourse", "postcourse", "postcourse_pass", "postcourse_fail", "pre"] {
            let parsed: AssessmentType = label.parse().unwrap();
            assert_eq!(parsed.to_string(), label);
        }
        assert!("  ".parse::<AssessmentType>().is_err());
    }
}
