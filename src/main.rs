//! Subtrans command-line front-end
//!
//! Collects SRT files, starts one translation job per file and shows their
//! progress. Existing output files are resolved interactively or by policy.

use anyhow::Result;
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrans::cli::{
    collect_inputs, interrupt_action, parse_decision, Args, Commands, ConflictPolicy, InterruptAction, JobOverrides,
};
use subtrans::config::Config;
use subtrans::inference::InferenceClientFactory;
use subtrans::pipeline::{
    ChannelConflictResolver, ChannelObserver, ConflictDecision, ConflictRequest, ConflictResolver,
    JobEvent, JobReport, JobRunner, RunOutcome, TranslationJob,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Models => {
            if let Some(endpoint) = args.endpoint {
                config.inference.endpoint = endpoint;
            }
            let client = InferenceClientFactory::create_client(config.inference.clone())?;
            let models = client.list_models().await;
            if models.is_empty() {
                println!("No models reported by {}", config.inference.endpoint);
            } else {
                for model in models {
                    println!("{}", model);
                }
            }
        }
        Commands::InitConfig { path } => {
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::Translate { inputs, source, target, model, concurrency, max_in_flight, no_context, on_conflict } => {
            JobOverrides {
                endpoint: args.endpoint,
                source,
                target,
                model,
                concurrency,
                max_in_flight,
                no_context,
            }
            .apply(&mut config)?;

            translate_files(config, &inputs, on_conflict).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None if Path::new("subtrans.toml").exists() => {
            info!("Found subtrans.toml in current directory, loading...");
            Config::from_file("subtrans.toml")?
        }
        None => Config::default(),
    };
    Ok(config)
}

async fn translate_files(config: Config, inputs: &[PathBuf], policy: ConflictPolicy) -> Result<()> {
    let files = collect_inputs(inputs);
    if files.is_empty() {
        anyhow::bail!("No SRT files found in the given inputs");
    }

    let jobs = files
        .iter()
        .map(|file| TranslationJob::from_config(file, &config.job))
        .collect::<subtrans::error::Result<Vec<_>>>()?;

    let client = InferenceClientFactory::create_client(config.inference.clone())?;

    let (conflicts, mut conflict_requests) = match policy.decision() {
        Some(decision) => (Arc::new(decision) as Arc<dyn ConflictResolver>, None),
        None => {
            let (resolver, requests) = ChannelConflictResolver::new(jobs.len());
            (Arc::new(resolver) as Arc<dyn ConflictResolver>, Some(requests))
        }
    };

    let (observer, mut events) = ChannelObserver::new();
    let runner = Arc::new(JobRunner::new(
        client,
        config.inference.context_lines,
        config.job.max_in_flight,
        conflicts,
        Arc::new(observer),
    ));

    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template("{prefix:30!} [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bars: HashMap<_, _> = jobs
        .iter()
        .map(|job| {
            let bar = multi.add(ProgressBar::new(0));
            bar.set_style(style.clone());
            bar.set_prefix(file_label(&job.file_path));
            (job.id, bar)
        })
        .collect();

    info!(
        "Translating {} file(s) to {} with {} (batch size {})",
        jobs.len(),
        config.job.target_language,
        config.job.model,
        config.job.concurrency
    );
    runner.start_all(jobs);

    let interrupt = Arc::clone(&runner);
    tokio::spawn(async move {
        let mut interrupts = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupts += 1;
            match interrupt_action(interrupts) {
                InterruptAction::CancelJobs => {
                    warn!("Interrupted, cancelling after the current batch (Ctrl-C again to quit)");
                    interrupt.cancel_all();
                }
                InterruptAction::Exit => {
                    warn!("Interrupted again, exiting");
                    std::process::exit(130);
                }
            }
        }
    });

    let mut reports = Vec::new();
    loop {
        tokio::select! {
            Some(request) = next_conflict(&mut conflict_requests) => {
                let decision = ask_conflict(&multi, &request).await;
                request.respond(decision);
            }
            event = events.recv() => match event {
                Some(JobEvent::Progress { job_id, current, total, .. }) => {
                    if let Some(bar) = bars.get(&job_id) {
                        bar.set_length(total as u64);
                        bar.set_position(current as u64);
                    }
                }
                Some(JobEvent::FileComplete(report)) => {
                    if let Some(bar) = bars.get(&report.job_id) {
                        bar.finish_with_message(status_label(&report));
                    }
                    multi.println(report.message()).ok();
                    reports.push(report);
                }
                Some(JobEvent::AllComplete) | None => break,
            },
        }
    }

    runner.wait().await;
    print_summary(&reports);

    if reports.iter().any(|report| report.outcome.is_err()) {
        anyhow::bail!("Some files could not be translated");
    }
    Ok(())
}

async fn next_conflict(requests: &mut Option<mpsc::Receiver<ConflictRequest>>) -> Option<ConflictRequest> {
    match requests {
        Some(requests) => requests.recv().await,
        None => std::future::pending().await,
    }
}

/// Prompt on the terminal without blocking the runtime
async fn ask_conflict(multi: &MultiProgress, request: &ConflictRequest) -> ConflictDecision {
    let multi = multi.clone();
    let path = request.path.clone();

    tokio::task::spawn_blocking(move || multi.suspend(|| prompt_conflict(&path)))
        .await
        .unwrap_or(ConflictDecision::Skip)
}

fn prompt_conflict(path: &Path) -> ConflictDecision {
    let stdin = std::io::stdin();
    loop {
        eprint!(
            "File {} already exists. [o]verwrite / [r]ename / [s]kip (default skip): ",
            path.display()
        );
        std::io::stderr().flush().ok();

        let mut answer = String::new();
        match stdin.read_line(&mut answer) {
            Ok(0) | Err(_) => return ConflictDecision::Skip,
            Ok(_) => {
                if let Some(decision) = parse_decision(&answer) {
                    return decision;
                }
            }
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn status_label(report: &JobReport) -> &'static str {
    match &report.outcome {
        Ok(RunOutcome::Completed { .. }) => "done",
        Ok(RunOutcome::Skipped { .. }) => "skipped",
        Ok(RunOutcome::Cancelled { .. }) => "cancelled",
        Err(_) => "failed",
    }
}

fn print_summary(reports: &[JobReport]) {
    println!();
    println!("{:<40} {:<10} {:>10} {:>8}", "File", "Status", "Translated", "Failed");
    println!("{}", "-".repeat(71));

    for report in reports {
        let (translated, failed) = match &report.outcome {
            Ok(outcome) => {
                let stats = outcome.stats();
                (format!("{}/{}", stats.translated, stats.total), stats.failed.len().to_string())
            }
            Err(_) => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<40} {:<10} {:>10} {:>8}",
            file_label(&report.source),
            status_label(report),
            translated,
            failed
        );
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard flushes the file on exit
    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}", log_level, log_dir.join("subtrans.log").display());

    Ok(guard)
}
