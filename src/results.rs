//! Persistence layer for resumable result files.
//!
//! A result file is a pretty-printed JSON array of records keyed by
//! `question_id`. The same file is both the output of a run and the input of
//! the next one: ids already present are skipped on resume.

use crate::dataset::QuestionId;
use crate::error::{EvalError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A record that can live in a [`ResultStore`].
pub trait StoredResult: Serialize + DeserializeOwned {
    fn question_id(&self) -> &QuestionId;
}

/// Generated answer for one question. `None` marks a tolerated failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub answer: Option<String>,
}

impl StoredResult for AnswerRecord {
    fn question_id(&self) -> &QuestionId {
        &self.question_id
    }
}

/// LLM-Match score for one question. Zero marks a missing prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub question_id: QuestionId,
    pub score: u32,
}

impl StoredResult for ScoreRecord {
    fn question_id(&self) -> &QuestionId {
        &self.question_id
    }
}

/// Append-only, completion-ordered results backed by a JSON file.
#[derive(Debug)]
pub struct ResultStore<R> {
    path: PathBuf,
    records: Vec<R>,
    completed: HashSet<QuestionId>,
}

impl<R: StoredResult> ResultStore<R> {
    /// Open the store at `path`, loading prior results if the file exists.
    ///
    /// A missing file yields an empty store. Unparseable content is an error:
    /// resuming on top of it would overwrite whatever was there.
    pub fn load(path: &Path) -> Result<Self> {
        let records: Vec<R> = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
            serde_json::from_str(&content).map_err(|e| EvalError::ResultStoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            Vec::new()
        };

        let completed = records.iter().map(|r| r.question_id().clone()).collect();
        if !records.is_empty() {
            info!(path = %path.display(), count = records.len(), "found existing results");
        }

        Ok(Self {
            path: path.to_path_buf(),
            records,
            completed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a result for `id` was already recorded.
    pub fn is_completed(&self, id: &QuestionId) -> bool {
        self.completed.contains(id)
    }

    /// Append a record and rewrite the whole file.
    pub fn append_and_persist(&mut self, record: R) -> Result<()> {
        self.completed.insert(record.question_id().clone());
        self.records.push(record);
        self.persist()
    }

    /// Serialize every record to the backing file, replacing it.
    ///
    /// The data goes to a sibling `.tmp` file that is then renamed over the
    /// backing file, so a killed write never leaves a truncated store.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
            }
        }

        let data = serde_json::to_string_pretty(&self.records)
            .map_err(|e| EvalError::Serialization(e.to_string()))?;
        let tmp = self.temp_path();
        fs::write(&tmp, data).map_err(|e| EvalError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| EvalError::io(&self.path, e))?;

        debug!(path = %self.path.display(), count = self.records.len(), "persisted results");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("results"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// `<output_dir>/<dataset_stem>-<model>.json`
pub fn output_path(output_dir: &Path, dataset: &Path, model: &str) -> PathBuf {
    let stem = dataset
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    output_dir.join(format!("{}-{}.json", stem, model))
}

/// `<predictions_dir>/<predictions_stem>-metrics.json`
pub fn metrics_path(predictions: &Path) -> PathBuf {
    let stem = predictions
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("predictions");
    predictions.with_file_name(format!("{}-metrics.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn answer(id: &str, text: &str) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(id),
            answer: Some(text.to_string()),
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store: ResultStore<AnswerRecord> =
            ResultStore::load(&dir.path().join("results.json")).unwrap();
        assert!(store.is_empty());
        assert!(!store.is_completed(&QuestionId::new("a")));
    }

    #[test]
    fn test_append_persists_every_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("results.json");

        let mut store = ResultStore::load(&path).unwrap();
        store.append_and_persist(answer("a", "blue")).unwrap();
        store.append_and_persist(answer("b", "red")).unwrap();

        let reloaded: ResultStore<AnswerRecord> = ResultStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records()[0], answer("a", "blue"));
        assert!(reloaded.is_completed(&QuestionId::new("b")));
    }

    #[test]
    fn test_null_answer_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let mut store = ResultStore::load(&path).unwrap();
        store
            .append_and_persist(AnswerRecord {
                question_id: QuestionId::new("x"),
                answer: None,
            })
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"answer\": null"));

        let reloaded: ResultStore<AnswerRecord> = ResultStore::load(&path).unwrap();
        assert_eq!(reloaded.records()[0].answer, None);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "[{\"question_id\": \"a\", \"answer\": ").unwrap();

        let result: Result<ResultStore<AnswerRecord>> = ResultStore::load(&path);
        assert!(matches!(result, Err(EvalError::ResultStoreCorrupt { .. })));
    }

    #[test]
    fn test_score_records_accept_integer_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, r#"[{"question_id": 3, "score": 5}]"#).unwrap();

        let store: ResultStore<ScoreRecord> = ResultStore::load(&path).unwrap();
        assert!(store.is_completed(&QuestionId::Int(3)));
        assert!(!store.is_completed(&QuestionId::new("3")));
        assert_eq!(store.records()[0].score, 5);
    }

    #[test]
    fn test_integer_ids_survive_resume() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, r#"[{"question_id": 3, "answer": "x"}]"#).unwrap();

        let mut store: ResultStore<AnswerRecord> = ResultStore::load(&path).unwrap();
        store
            .append_and_persist(AnswerRecord {
                question_id: QuestionId::Int(4),
                answer: Some("y".to_string()),
            })
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["question_id"], 3);
        assert_eq!(written[1]["question_id"], 4);
    }

    #[test]
    fn test_persist_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "[]").unwrap();
        // A temp file left behind by a killed run is overwritten, not read.
        fs::write(dir.path().join("results.json.tmp"), "[{\"quest").unwrap();

        let mut store = ResultStore::load(&path).unwrap();
        store.append_and_persist(answer("a", "blue")).unwrap();

        assert!(!dir.path().join("results.json.tmp").exists());
        let reloaded: ResultStore<AnswerRecord> = ResultStore::load(&path).unwrap();
        assert_eq!(reloaded.records(), &[answer("a", "blue")]);
    }

    #[test]
    fn test_output_path() {
        let path = output_path(
            Path::new("data/results"),
            Path::new("data/hm3d-v0.json"),
            "llava-video",
        );
        assert_eq!(path, PathBuf::from("data/results/hm3d-v0-llava-video.json"));
    }

    #[test]
    fn test_metrics_path() {
        let path = metrics_path(Path::new("data/results/hm3d-v0-llava-video.json"));
        assert_eq!(
            path,
            PathBuf::from("data/results/hm3d-v0-llava-video-metrics.json")
        );
    }
}
