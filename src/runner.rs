//! Resumable batch driver.
//!
//! Walks a dataset in order, skips questions that already have a result,
//! and appends one result per processed question, rewriting the result file
//! after every append so an interrupted run loses at most the question in
//! flight.

use crate::dataset::{Dataset, QuestionRecord};
use crate::error::Result;
use crate::results::{ResultStore, StoredResult};
use serde::Serialize;
use tracing::{error, info, warn};

/// Number of questions a dry run processes (skipped ones not counted).
pub const DRY_RUN_LIMIT: usize = 5;

/// Per-question work done by a pipeline.
pub trait EvalTask {
    type Output: StoredResult;

    /// Produce the result for one question.
    async fn process(&self, record: &QuestionRecord) -> Result<Self::Output>;

    /// Result recorded when `process` fails and the run is tolerant.
    fn fallback(&self, record: &QuestionRecord) -> Self::Output;
}

/// Configuration for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Record tolerable failures as sentinel results instead of aborting.
    pub force: bool,
    /// Stop after [`DRY_RUN_LIMIT`] processed questions.
    pub dry_run: bool,
}

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Questions in the dataset.
    pub total: usize,
    /// Questions that already had a result.
    pub skipped: usize,
    /// Questions processed in this run, including tolerated failures.
    pub processed: usize,
    /// Tolerated failures recorded as sentinels.
    pub failed: usize,
}

/// What happened to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Answered,
    Failed,
}

/// Batch runner.
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run `task` over every question of `dataset` not yet in `store`.
    ///
    /// An intolerable failure aborts the run with that error; everything
    /// appended before it is already on disk.
    pub async fn run<T: EvalTask>(
        &self,
        dataset: &Dataset,
        store: &mut ResultStore<T::Output>,
        task: &T,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            total: dataset.len(),
            ..Default::default()
        };

        info!(
            dataset = %dataset.name,
            questions = dataset.len(),
            existing = store.len(),
            "starting run"
        );

        for (idx, record) in dataset.items().iter().enumerate() {
            if self.config.dry_run && summary.processed >= DRY_RUN_LIMIT {
                info!(limit = DRY_RUN_LIMIT, "dry run limit reached");
                break;
            }

            let position = (idx + 1, dataset.len());
            match self.step(record, position, store, task).await? {
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Answered => summary.processed += 1,
                Outcome::Failed => {
                    summary.processed += 1;
                    summary.failed += 1;
                }
            }
        }

        store.persist()?;
        info!(
            path = %store.path().display(),
            results = store.len(),
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "run finished"
        );

        Ok(summary)
    }

    async fn step<T: EvalTask>(
        &self,
        record: &QuestionRecord,
        (current, total): (usize, usize),
        store: &mut ResultStore<T::Output>,
        task: &T,
    ) -> Result<Outcome> {
        if store.is_completed(&record.question_id) {
            return Ok(Outcome::Skipped);
        }

        info!("[{}/{}] {}", current, total, record.question_id);

        match task.process(record).await {
            Ok(output) => {
                store.append_and_persist(output)?;
                Ok(Outcome::Answered)
            }
            Err(e) if self.config.force && e.is_tolerable() => {
                warn!(question_id = %record.question_id, error = ?e, "recording failure");
                store.append_and_persist(task.fallback(record))?;
                Ok(Outcome::Failed)
            }
            Err(e) => {
                error!(question_id = %record.question_id, error = ?e, "aborting run");
                Err(e)
            }
        }
    }
}
