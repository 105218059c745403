//! EQA Eval - resumable answer generation and LLM-Match scoring for embodied
//! question answering benchmarks.
//!
//! # Overview
//!
//! Two pipelines share one shape: load a dataset of questions, skip the ones
//! that already have a result, ask a model about each remaining question,
//! extract a clean value from its free-form output and append it to a result
//! file that is rewritten after every question.
//!
//! 1. **Answering**: a vision-language model sees evenly spaced frames of the
//!    question's episode and answers after an `A:` marker.
//! 2. **Scoring**: a judge model compares the prediction with the ground truth
//!    and gives a mark after `Your mark:`.
//!
//! # Quick Start
//!
//! ```no_run
//! use eqa_eval::{
//!     adapter::{JudgeBackend, LlmMatch},
//!     config::Config,
//!     dataset::Dataset,
//!     results::{AnswerRecord, ResultStore, ScoreRecord},
//!     runner::{RunConfig, Runner},
//!     tasks::ScoreTask,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate_judge()?;
//!
//!     let dataset_path = Path::new("data/hm3d-v0.json");
//!     let dataset = Dataset::load_json(dataset_path)?;
//!     let predictions: ResultStore<AnswerRecord> =
//!         ResultStore::load(Path::new("data/results/hm3d-v0-gpt-4o.json"))?;
//!
//!     let judge = LlmMatch::new(
//!         JudgeBackend::from_config(&config),
//!         config.judge.max_tokens,
//!         config.judge.temperature,
//!     );
//!     let task = ScoreTask::new(judge, &dataset, dataset_path, predictions.into_records())?;
//!
//!     let mut scores: ResultStore<ScoreRecord> =
//!         ResultStore::load(Path::new("data/results/hm3d-v0-gpt-4o-metrics.json"))?;
//!     Runner::new(RunConfig::default())
//!         .run(&dataset, &mut scores, &task)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Dataset**: immutable, id-unique question records
//! - **ResultStore**: append-only results, persisted after every append
//! - **VideoQa / LlmMatch**: inference adapters over pluggable models
//! - **extract**: marker-based answer and mark extraction
//! - **Runner**: the resumable batch driver

pub mod adapter;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod frames;
pub mod llm;
pub mod metrics;
pub mod results;
pub mod runner;
pub mod tasks;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{Dataset, QuestionId, QuestionRecord};
pub use error::{EvalError, Result};
pub use llm::LlmClient;
pub use results::{AnswerRecord, ResultStore, ScoreRecord};
pub use runner::{RunConfig, RunSummary, Runner};
