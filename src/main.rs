//! EQA Eval CLI
//!
//! Answer benchmark questions from episode frames and score the answers
//! with an LLM judge.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eqa_eval::{
    adapter::{ChatVisionModel, JudgeBackend, LlmMatch, VideoQa},
    config::Config,
    dataset::Dataset,
    llm::LlmClient,
    metrics::{LlmMatchSummary, by_category},
    results::{AnswerRecord, ResultStore, ScoreRecord, metrics_path, output_path},
    runner::{RunConfig, RunSummary, Runner},
    tasks::{AnswerTask, ScoreTask},
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// EQA Eval - answer and score embodied question answering benchmarks
#[derive(Parser)]
#[command(name = "eqa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer every question from frames of its episode
    Answer {
        /// Path to EQA dataset
        #[arg(long, default_value = "data/hm3d-v0.json")]
        dataset: PathBuf,

        /// Model name (also names the output file)
        #[arg(long, default_value = "llava-video")]
        model: String,

        /// Path to episode histories
        #[arg(long, default_value = "data/frames")]
        frames_directory: PathBuf,

        /// Number of frames per question
        #[arg(long, default_value_t = 15)]
        num_frames: usize,

        /// Longest side of the first frame after rescaling
        #[arg(long, default_value_t = 512)]
        image_size: u32,

        /// Output directory
        #[arg(long, default_value = "data/results")]
        output_directory: PathBuf,

        /// Continue running on model errors
        #[arg(long)]
        force: bool,

        /// Only process the first 5 questions
        #[arg(long)]
        dry_run: bool,
    },

    /// Score predictions against ground truth with an LLM judge
    Judge {
        /// Path to EQA dataset (with ground-truth answers)
        #[arg(long, default_value = "data/hm3d-v0.json")]
        dataset: PathBuf,

        /// Predictions file written by `answer`
        #[arg(long)]
        predictions: PathBuf,

        /// Scores file (defaults to <predictions>-metrics.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Continue running on judge call errors
        #[arg(long)]
        force: bool,

        /// Only score the first 5 questions
        #[arg(long)]
        dry_run: bool,
    },

    /// Score a single prediction
    Match {
        #[arg(long)]
        question: String,

        /// Ground-truth answer
        #[arg(long)]
        answer: String,

        #[arg(long)]
        prediction: String,

        /// Additional acceptable answers (repeatable)
        #[arg(long = "extra-answer")]
        extra_answers: Vec<String>,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "eqa_eval=info,eqa=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Answer {
            dataset,
            model,
            frames_directory,
            num_frames,
            image_size,
            output_directory,
            force,
            dry_run,
        } => {
            let options = AnswerOptions {
                dataset,
                model,
                frames_directory,
                num_frames,
                image_size,
                output_directory,
                run: RunConfig { force, dry_run },
            };
            cmd_answer(config, options).await
        }
        Commands::Judge {
            dataset,
            predictions,
            output,
            force,
            dry_run,
        } => cmd_judge(config, dataset, predictions, output, RunConfig { force, dry_run }).await,
        Commands::Match {
            question,
            answer,
            prediction,
            extra_answers,
        } => cmd_match(config, question, answer, prediction, extra_answers).await,
        Commands::Test => cmd_test(config).await,
    }
}

struct AnswerOptions {
    dataset: PathBuf,
    model: String,
    frames_directory: PathBuf,
    num_frames: usize,
    image_size: u32,
    output_directory: PathBuf,
    run: RunConfig,
}

async fn cmd_answer(config: Config, options: AnswerOptions) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let dataset = Dataset::load_json(&options.dataset).context("Failed to load dataset")?;
    println!("found {} questions", dataset.len());

    std::fs::create_dir_all(&options.output_directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            options.output_directory.display()
        )
    })?;
    let output = output_path(&options.output_directory, &options.dataset, &options.model);

    let mut store: ResultStore<AnswerRecord> =
        ResultStore::load(&output).context("Failed to load existing results")?;
    println!("found {} existing results", store.len());
    println!("Using model: {}", config.llm.model);

    let model = ChatVisionModel::new(LlmClient::new(config.llm));
    let task = AnswerTask::new(
        VideoQa::new(model, options.image_size),
        &options.frames_directory,
        options.num_frames,
        &dataset,
        &options.dataset,
    )?;

    let start = Instant::now();
    let summary = Runner::new(options.run)
        .run(&dataset, &mut store, &task)
        .await
        .context("Answering aborted")?;

    print_run(&summary, store.len(), store.path(), start);
    Ok(())
}

async fn cmd_judge(
    config: Config,
    dataset_path: PathBuf,
    predictions_path: PathBuf,
    output: Option<PathBuf>,
    run: RunConfig,
) -> Result<()> {
    config.validate_judge().context("Invalid configuration")?;

    if !predictions_path.is_file() {
        anyhow::bail!("Predictions not found at '{}'", predictions_path.display());
    }

    let dataset = Dataset::load_json(&dataset_path).context("Failed to load dataset")?;
    let predictions: ResultStore<AnswerRecord> =
        ResultStore::load(&predictions_path).context("Failed to load predictions")?;
    println!(
        "found {} questions and {} predictions",
        dataset.len(),
        predictions.len()
    );

    let output = output.unwrap_or_else(|| metrics_path(&predictions_path));
    let mut store: ResultStore<ScoreRecord> =
        ResultStore::load(&output).context("Failed to load existing scores")?;

    println!("Using judge: {}", config.judge.model);
    let judge = LlmMatch::new(
        JudgeBackend::from_config(&config),
        config.judge.max_tokens,
        config.judge.temperature,
    );
    let task = ScoreTask::new(judge, &dataset, &dataset_path, predictions.into_records())?;

    let start = Instant::now();
    let summary = Runner::new(run)
        .run(&dataset, &mut store, &task)
        .await
        .context("Scoring aborted")?;
    print_run(&summary, store.len(), store.path(), start);

    LlmMatchSummary::from_scores(store.records()).print("LLM-Match");
    let categories = by_category(&dataset, store.records());
    if categories.len() > 1 {
        for (category, summary) in &categories {
            println!("  {:<28} {:>6.1}  (n={})", category, summary.llm_match, summary.count);
        }
    }

    Ok(())
}

async fn cmd_match(
    config: Config,
    question: String,
    answer: String,
    prediction: String,
    extra_answers: Vec<String>,
) -> Result<()> {
    config.validate_judge().context("Invalid configuration")?;

    let judge = LlmMatch::new(
        JudgeBackend::from_config(&config),
        config.judge.max_tokens,
        config.judge.temperature,
    );
    let extra = (!extra_answers.is_empty()).then_some(extra_answers.as_slice());
    let score = judge
        .score(&question, &answer, Some(&prediction), extra)
        .await
        .context("Judge call failed")?;

    println!("{}", "*".repeat(40));
    println!("example question:    {}", question);
    println!("ground-truth answer: {}", answer);
    println!("predicted answer:    {}", prediction);
    println!("llm-match score:     {}", score);
    println!("{}", "*".repeat(40));

    Ok(())
}

async fn cmd_test(config: Config) -> Result<()> {
    println!("Testing LLM connection...\n");

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    println!("  Judge:     {} ({:?})", config.judge.model, config.judge.backend);
    println!(
        "  API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => println!("Connection successful!"),
        Err(e) => println!("Connection failed: {}", e),
    }

    Ok(())
}

fn print_run(summary: &RunSummary, stored: usize, path: &Path, start: Instant) {
    println!();
    println!("Questions:  {}", summary.total);
    println!("Skipped:    {}", summary.skipped);
    println!("Processed:  {}", summary.processed);
    if summary.failed > 0 {
        println!("Failed:     {}", summary.failed);
    }
    println!("Elapsed:    {:.2?}", start.elapsed());
    println!("saving {} results to {}", stored, path.display());
}
