use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use corrector::CorrectionJob;
use corrector::evaluators::FormulaEvaluator;
use corrector::outcome::OutcomeResponse;
use corrector::parsers::{JsonSubmissionParser, JsonTemplateParser};
use corrector::statistics::{self, Statistics};
use corrector::stores::{FileAttemptStore, MemoryAttemptStore};
use corrector::traits::attempt_store::AttemptStore;
use corrector::traits::parser::Parser as _;
use corrector::types::ExerciseTemplate;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use util::assignment_config::AssignmentConfig;
use util::{config, paths};

#[derive(Parser, Debug)]
#[command(version, about = "Corrects spreadsheet exercise submissions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct one submission, or a JSON array of submissions
    Correct {
        /// Assignment codename below STORAGE_ROOT
        #[arg(long)]
        assignment: String,
        /// Submission rows (JSON)
        submission: PathBuf,
        /// Template rows (JSON). Defaults to {STORAGE_ROOT}/{assignment}/template.json
        #[arg(long)]
        template: Option<PathBuf>,
        /// Grade against an in-memory store; nothing is written
        #[arg(long)]
        dry_run: bool,
    },
    /// Print attempt statistics of an assignment
    Stats {
        /// Assignment codename below STORAGE_ROOT
        #[arg(long)]
        assignment: String,
    },
}

/// Result line of one submission in a batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SubmissionReport {
    Corrected(OutcomeResponse),
    Failed {
        success: bool,
        student_id: Option<String>,
        category: corrector::error::ErrorCategory,
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging(&config::log_file(), &config::log_level());
    let args = Args::parse();

    match args.command {
        Command::Correct {
            assignment,
            submission,
            template,
            dry_run,
        } => {
            let reports = run_correct(&assignment, &submission, template.as_deref(), dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Stats { assignment } => {
            let stats = run_stats(&assignment).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    // stdout carries the JSON report
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(console_layer).init();
    } else {
        registry.init();
    }

    guard
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_assignment(
    codename: &str,
    template: Option<&Path>,
) -> Result<(AssignmentConfig, ExerciseTemplate)> {
    let config = AssignmentConfig::get_assignment_config(codename)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("loading config of assignment {codename}"))?;

    let template_path = template
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::template_path(codename));
    let template = JsonTemplateParser
        .parse(&read_json(&template_path)?, &config)
        .with_context(|| format!("parsing template {}", template_path.display()))?;

    Ok((config, template))
}

async fn run_correct(
    codename: &str,
    submission_path: &Path,
    template: Option<&Path>,
    dry_run: bool,
) -> Result<Vec<SubmissionReport>> {
    let (config, template) = load_assignment(codename, template)?;

    let raw = read_json(submission_path)?;
    let documents = match raw {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        _ => bail!("{} must hold an object or an array", submission_path.display()),
    };

    let store: Arc<dyn AttemptStore> = if dry_run {
        info!(assignment = codename, "Dry run, using in-memory attempt store");
        Arc::new(MemoryAttemptStore::new())
    } else {
        Arc::new(FileAttemptStore::for_assignment(codename))
    };
    let mut job = CorrectionJob::new(template, config.clone(), store, FormulaEvaluator::new());

    let mut reports = Vec::with_capacity(documents.len());
    for document in &documents {
        let student_id = document
            .get("student_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        let result = match JsonSubmissionParser.parse(document, &config) {
            Ok(submission) => job.correct(&submission).await,
            Err(e) => Err(e),
        };

        reports.push(match result {
            Ok(outcome) => SubmissionReport::Corrected(outcome.into()),
            Err(e) => {
                error!(student_id = ?student_id, error = %e, "Submission could not be corrected");
                SubmissionReport::Failed {
                    success: false,
                    student_id,
                    category: e.category(),
                    message: e.to_string(),
                }
            }
        });
    }
    Ok(reports)
}

async fn run_stats(codename: &str) -> Result<Statistics> {
    let (_, template) = load_assignment(codename, None)?;
    let store = FileAttemptStore::for_assignment(codename);
    let stats = statistics::collect(&store, template.exercise_count(), template.max_attempts)
        .await
        .with_context(|| format!("collecting statistics of {codename}"))?;
    Ok(stats)
}
