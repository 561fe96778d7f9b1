//! crates/coursebuilder_core/src/analytics.rs
//!
//! Per-question activity results and their aggregation across a section, as
//! shown in the teacher's activity score table.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
}

/// One student's answer to one question of a lesson activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionResult {
    /// Position of the question within the activity.
    pub sequence: u32,
    pub kind: QuestionKind,
    /// Number of choices offered; 1 for short-answer questions.
    pub choice_count: u32,
    /// Zero-based indices of the selected choices.
    #[serde(default)]
    pub selected: Vec<u32>,
    #[serde(default)]
    pub score: f64,
}

impl QuestionResult {
    pub fn validate(&self) -> CoreResult<()> {
        if self.choice_count == 0 {
            return Err(CoreError::InvalidQuestionResult(format!(
                "question {} offers no choices",
                self.sequence
            )));
        }
        if let Some(bad) = self.selected.iter().find(|&&c| c >= self.choice_count) {
            return Err(CoreError::InvalidQuestionResult(format!(
                "question {} has no choice {}",
                self.sequence, bad
            )));
        }
        if !self.score.is_finite() || self.score < 0.0 {
            return Err(CoreError::InvalidQuestionResult(format!(
                "question {} has score {}",
                self.sequence, self.score
            )));
        }
        Ok(())
    }
}

/// Checks a lesson's submission: every result valid, no sequence repeated.
pub fn validate_results(results: &[QuestionResult]) -> CoreResult<()> {
    let mut seen = std::collections::HashSet::new();
    for result in results {
        result.validate()?;
        if !seen.insert(result.sequence) {
            return Err(CoreError::InvalidQuestionResult(format!(
                "question {} appears twice",
                result.sequence
            )));
        }
    }
    Ok(())
}

/// Section-wide counts for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionTally {
    pub sequence: u32,
    pub kind: QuestionKind,
    /// How many students picked each choice. Empty for short answers.
    pub choice_counts: Vec<u32>,
    /// Sum of short-answer scores. Zero for multiple choice.
    pub score_total: f64,
    /// Students who answered this question.
    pub responses: u32,
}

/// Aggregates every student's results for one lesson, ordered by question.
///
/// The first result seen for a question fixes its kind; later results of a
/// different kind are ignored.
pub fn tally_lesson_scores<'a>(
    submissions: impl IntoIterator<Item = &'a [QuestionResult]>,
) -> Vec<QuestionTally> {
    let mut tallies: BTreeMap<u32, QuestionTally> = BTreeMap::new();

    for results in submissions {
        for result in results {
            let tally = tallies.entry(result.sequence).or_insert_with(|| QuestionTally {
                sequence: result.sequence,
                kind: result.kind,
                choice_counts: Vec::new(),
                score_total: 0.0,
                responses: 0,
            });
            if tally.kind != result.kind {
                continue;
            }
            tally.responses += 1;
            match result.kind {
                QuestionKind::ShortAnswer => tally.score_total += result.score,
                QuestionKind::MultipleChoice => {
                    let width = result.choice_count as usize;
                    if tally.choice_counts.len() < width {
                        tally.choice_counts.resize(width, 0);
                    }
                    for &choice in &result.selected {
                        if let Some(count) = tally.choice_counts.get_mut(choice as usize) {
                            *count += 1;
                        }
                    }
                }
            }
        }
    }

    tallies.into_values().collect()
}
