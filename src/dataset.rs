//! Dataset loading for EQA benchmarks.
//!
//! A dataset is a JSON array of question records:
//! ```json
//! [
//!   {
//!     "question_id": "f2e82760-5c3c-41b1-88b6-85921b9e7b32",
//!     "question": "What color is the rug?",
//!     "answer": "tan with pink and blue",
//!     "episode_history": "hm3d-v0/000-hm3d-BFRyYbPCCPE"
//!   }
//! ]
//! ```

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Opaque question identifier.
///
/// Datasets use either strings or integers. The JSON type is kept, so a
/// result file is written back with the same ids it was read with, and
/// `3` and `"3"` are distinct questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Int(i64),
    Text(String),
}

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// A single benchmark question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique identifier for this question.
    pub question_id: QuestionId,
    /// The question to answer.
    pub question: String,
    /// Ground truth answer (required for scoring).
    #[serde(default)]
    pub answer: Option<String>,
    /// Additional acceptable answers, if the benchmark provides them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_answers: Option<Vec<String>>,
    /// Episode directory, relative to the frames root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_history: Option<String>,
    /// Question category (e.g. "object recognition").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// An immutable, id-unique sequence of questions.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Dataset name (file stem).
    pub name: String,
    items: Vec<QuestionRecord>,
}

impl Dataset {
    /// Build a dataset from records, rejecting duplicate ids.
    pub fn from_records(name: &str, items: Vec<QuestionRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.question_id) {
                return Err(EvalError::DatasetFormat {
                    path: name.into(),
                    reason: format!("duplicate question_id '{}'", item.question_id),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            items,
        })
    }

    /// Load from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::DatasetFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let items: Vec<QuestionRecord> =
            serde_json::from_str(&content).map_err(|e| EvalError::DatasetFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");

        Self::from_records(name, items).map_err(|e| match e {
            EvalError::DatasetFormat { reason, .. } => EvalError::DatasetFormat {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Number of questions in the dataset.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QuestionRecord] {
        &self.items
    }

    /// Look up a question by id.
    pub fn get(&self, id: &QuestionId) -> Option<&QuestionRecord> {
        self.items.iter().find(|item| &item.question_id == id)
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str) -> QuestionRecord {
    QuestionRecord {
        question_id: QuestionId::new(id),
        question: format!("What is in room {}?", id),
        answer: Some("a sofa".to_string()),
        extra_answers: None,
        episode_history: Some(format!("episode-{}", id)),
        category: None,
    }
}
