//! The two pipelines as [`EvalTask`]s.

use crate::adapter::{LlmMatch, TextGenerator, VideoLanguageModel, VideoQa};
use crate::dataset::{Dataset, QuestionId, QuestionRecord};
use crate::error::{EvalError, Result};
use crate::extract::parse_answer;
use crate::frames::FrameSequence;
use crate::results::{AnswerRecord, ScoreRecord};
use crate::runner::EvalTask;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Answers each question from a sample of its episode's frames.
pub struct AnswerTask<M> {
    qa: VideoQa<M>,
    frames_root: PathBuf,
    num_frames: usize,
}

impl<M: VideoLanguageModel> AnswerTask<M> {
    /// Every question must name its episode.
    pub fn new(
        qa: VideoQa<M>,
        frames_root: impl Into<PathBuf>,
        num_frames: usize,
        dataset: &Dataset,
        dataset_path: &Path,
    ) -> Result<Self> {
        if let Some(record) = dataset.items().iter().find(|r| r.episode_history.is_none()) {
            return Err(EvalError::DatasetFormat {
                path: dataset_path.to_path_buf(),
                reason: format!("question '{}' has no episode_history", record.question_id),
            });
        }

        Ok(Self {
            qa,
            frames_root: frames_root.into(),
            num_frames,
        })
    }

    fn frame_paths(&self, record: &QuestionRecord) -> Result<Vec<PathBuf>> {
        let episode = record
            .episode_history
            .as_deref()
            .ok_or_else(|| EvalError::EpisodeNotFound(self.frames_root.clone()))?;
        FrameSequence::load(&self.frames_root, episode)?.sample(self.num_frames)
    }
}

impl<M: VideoLanguageModel> EvalTask for AnswerTask<M> {
    type Output = AnswerRecord;

    async fn process(&self, record: &QuestionRecord) -> Result<AnswerRecord> {
        let paths = self.frame_paths(record)?;
        let raw = self.qa.ask(&paths, &record.question).await?;
        debug!(question_id = %record.question_id, raw = %raw, "model output");

        Ok(AnswerRecord {
            question_id: record.question_id.clone(),
            answer: Some(parse_answer(&raw)),
        })
    }

    fn fallback(&self, record: &QuestionRecord) -> AnswerRecord {
        AnswerRecord {
            question_id: record.question_id.clone(),
            answer: None,
        }
    }
}

/// Scores each question's prediction against its ground-truth answer.
pub struct ScoreTask<G> {
    judge: LlmMatch<G>,
    predictions: HashMap<QuestionId, Option<String>>,
}

impl<G: TextGenerator> ScoreTask<G> {
    /// Every question must carry a ground-truth answer. Questions absent
    /// from `predictions` are scored as missing predictions.
    pub fn new(
        judge: LlmMatch<G>,
        dataset: &Dataset,
        dataset_path: &Path,
        predictions: impl IntoIterator<Item = AnswerRecord>,
    ) -> Result<Self> {
        if let Some(record) = dataset.items().iter().find(|r| r.answer.is_none()) {
            return Err(EvalError::DatasetFormat {
                path: dataset_path.to_path_buf(),
                reason: format!("question '{}' has no answer", record.question_id),
            });
        }

        Ok(Self {
            judge,
            predictions: predictions
                .into_iter()
                .map(|p| (p.question_id, p.answer))
                .collect(),
        })
    }
}

impl<G: TextGenerator> EvalTask for ScoreTask<G> {
    type Output = ScoreRecord;

    async fn process(&self, record: &QuestionRecord) -> Result<ScoreRecord> {
        let prediction = self
            .predictions
            .get(&record.question_id)
            .and_then(|p| p.as_deref());

        let score = self
            .judge
            .score(
                &record.question,
                record.answer.as_deref().unwrap_or_default(),
                prediction,
                record.extra_answers.as_deref(),
            )
            .await?;

        Ok(ScoreRecord {
            question_id: record.question_id.clone(),
            score,
        })
    }

    fn fallback(&self, record: &QuestionRecord) -> ScoreRecord {
        ScoreRecord {
            question_id: record.question_id.clone(),
            score: 0,
        }
    }
}
