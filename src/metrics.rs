//! Aggregate LLM-Match metrics over a score file.

use crate::dataset::Dataset;
use crate::results::ScoreRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Lowest and highest mark the judge is asked to give.
const MIN_MARK: u32 = 1;
const MAX_MARK: u32 = 5;

/// Map a mark to 0..=100. Zero (missing prediction) counts as the lowest mark.
pub fn normalized(score: u32) -> f64 {
    let clamped = score.clamp(MIN_MARK, MAX_MARK);
    100.0 * f64::from(clamped - MIN_MARK) / f64::from(MAX_MARK - MIN_MARK)
}

/// Summary statistics for one set of scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmMatchSummary {
    /// Scored questions.
    pub count: usize,
    /// Questions scored 0 because no prediction was available.
    pub missing: usize,
    /// Mean raw mark.
    pub mean_mark: f64,
    /// Mean normalized score, 0 to 100.
    pub llm_match: f64,
}

impl LlmMatchSummary {
    pub fn from_scores<'a>(scores: impl IntoIterator<Item = &'a ScoreRecord>) -> Self {
        let mut summary = Self::default();
        let mut mark_total = 0.0;
        let mut normalized_total = 0.0;

        for record in scores {
            summary.count += 1;
            if record.score == 0 {
                summary.missing += 1;
            }
            mark_total += f64::from(record.score);
            normalized_total += normalized(record.score);
        }

        if summary.count > 0 {
            summary.mean_mark = mark_total / summary.count as f64;
            summary.llm_match = normalized_total / summary.count as f64;
        }
        summary
    }

    /// Print summary to stdout.
    pub fn print(&self, title: &str) {
        println!("\n========== {} ==========", title);
        println!("Scored questions:    {}", self.count);
        println!("Missing predictions: {}", self.missing);
        println!("Mean mark:           {:.2}/{}", self.mean_mark, MAX_MARK);
        println!("LLM-Match:           {:.1}", self.llm_match);
        println!("========================================\n");
    }
}

/// Per-category summaries, using the dataset's `category` field.
///
/// Scores whose question has no category are grouped under `"uncategorized"`.
pub fn by_category(dataset: &Dataset, scores: &[ScoreRecord]) -> BTreeMap<String, LlmMatchSummary> {
    let mut groups: BTreeMap<String, Vec<&ScoreRecord>> = BTreeMap::new();
    for record in scores {
        let category = dataset
            .get(&record.question_id)
            .and_then(|q| q.category.clone())
            .unwrap_or_else(|| "uncategorized".to_string());
        groups.entry(category).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(category, records)| (category, LlmMatchSummary::from_scores(records)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{QuestionId, sample_record};

    fn score(id: &str, score: u32) -> ScoreRecord {
        ScoreRecord {
            question_id: QuestionId::new(id),
            score,
        }
    }

    #[test]
    fn test_normalized() {
        assert_eq!(normalized(5), 100.0);
        assert_eq!(normalized(1), 0.0);
        assert_eq!(normalized(3), 50.0);
        assert_eq!(normalized(0), 0.0);
    }

    #[test]
    fn test_summary() {
        let scores = vec![score("a", 5), score("b", 3), score("c", 0), score("d", 1)];
        let summary = LlmMatchSummary::from_scores(&scores);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.mean_mark, 2.25);
        assert_eq!(summary.llm_match, 37.5);
    }

    #[test]
    fn test_empty_summary() {
        let scores: Vec<ScoreRecord> = Vec::new();
        let summary = LlmMatchSummary::from_scores(&scores);
        assert_eq!(summary, LlmMatchSummary::default());
    }

    #[test]
    fn test_by_category() {
        let mut a = sample_record("a");
        a.category = Some("object recognition".to_string());
        let mut b = sample_record("b");
        b.category = Some("spatial understanding".to_string());
        let c = sample_record("c");
        let dataset = Dataset::from_records("gt", vec![a, b, c]).unwrap();

        let groups = by_category(&dataset, &[score("a", 5), score("b", 1), score("c", 3)]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["object recognition"].llm_match, 100.0);
        assert_eq!(groups["spatial understanding"].llm_match, 0.0);
        assert_eq!(groups["uncategorized"].count, 1);
    }
}
