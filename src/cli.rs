use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{Config, TargetLanguage};
use crate::error::Result;
use crate::pipeline::ConflictDecision;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Inference server base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate SRT files (directories are searched for *.srt)
    Translate {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Source language, or "auto"
        #[arg(short, long)]
        source: Option<String>,

        /// Target language (zh_tw, en, jp)
        #[arg(short, long)]
        target: Option<String>,

        /// Model name on the inference server
        #[arg(short, long)]
        model: Option<String>,

        /// Lines translated concurrently per file
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Cap on in-flight requests across all files (0 = none)
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// Translate each line without surrounding lines
        #[arg(long)]
        no_context: bool,

        /// What to do when the output file exists
        #[arg(long, value_enum, default_value = "ask")]
        on_conflict: ConflictPolicy,
    },

    /// List models offered by the inference server
    Models,

    /// Write a configuration file with default values
    InitConfig {
        /// Destination
        #[arg(default_value = "subtrans.toml")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    /// Prompt on the terminal
    Ask,
    Overwrite,
    Rename,
    Skip,
}

impl ConflictPolicy {
    /// Fixed decision, or `None` when the user is asked
    pub fn decision(&self) -> Option<ConflictDecision> {
        match self {
            ConflictPolicy::Ask => None,
            ConflictPolicy::Overwrite => Some(ConflictDecision::Overwrite),
            ConflictPolicy::Rename => Some(ConflictDecision::Rename),
            ConflictPolicy::Skip => Some(ConflictDecision::Skip),
        }
    }
}

/// Command-line values that override the configuration file
#[derive(Debug, Default)]
pub struct JobOverrides {
    pub endpoint: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    pub max_in_flight: Option<usize>,
    pub no_context: bool,
}

impl JobOverrides {
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(endpoint) = self.endpoint {
            config.inference.endpoint = endpoint;
        }
        if let Some(source) = self.source {
            config.job.source_language = source;
        }
        if let Some(target) = self.target {
            config.job.target_language = TargetLanguage::from_label(&target)?;
        }
        if let Some(model) = self.model {
            config.job.model = model;
        }
        if let Some(concurrency) = self.concurrency {
            config.job.concurrency = concurrency;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.job.max_in_flight = max_in_flight;
        }
        if self.no_context {
            config.inference.context_lines = 0;
        }
        config.validate()
    }
}

/// Expand directories to the SRT files below them, keeping argument order
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_srt(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else if is_srt(path) {
            files.push(path.clone());
        } else {
            warn!("{} is not an SRT file, skipping", path.display());
        }
    }

    files
}

fn is_srt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("srt"))
        .unwrap_or(false)
}

/// Parse a terminal answer to the overwrite prompt
pub fn parse_decision(answer: &str) -> Option<ConflictDecision> {
    match answer.trim().to_lowercase().as_str() {
        "o" | "overwrite" | "y" | "yes" => Some(ConflictDecision::Overwrite),
        "r" | "rename" | "n" | "no" => Some(ConflictDecision::Rename),
        "s" | "skip" | "" => Some(ConflictDecision::Skip),
        _ => None,
    }
}

/// Response to the n-th Ctrl-C of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Stop every job after its current batch
    CancelJobs,
    /// Quit without waiting for in-flight requests
    Exit,
}

pub fn interrupt_action(count: usize) -> InterruptAction {
    if count <= 1 {
        InterruptAction::CancelJobs
    } else {
        InterruptAction::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_collect_inputs_filters_and_walks() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("season").create_dir_all().unwrap();
        dir.child("season/ep2.srt").touch().unwrap();
        dir.child("season/ep1.SRT").touch().unwrap();
        dir.child("season/notes.txt").touch().unwrap();
        dir.child("single.srt").touch().unwrap();

        let inputs = collect_inputs(&[
            dir.child("single.srt").path().to_path_buf(),
            dir.child("season").path().to_path_buf(),
            dir.child("cover.jpg").path().to_path_buf(),
        ]);

        assert_eq!(
            inputs,
            vec![
                dir.child("single.srt").path().to_path_buf(),
                dir.child("season/ep1.SRT").path().to_path_buf(),
                dir.child("season/ep2.srt").path().to_path_buf(),
            ]
        );
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("O\n"), Some(ConflictDecision::Overwrite));
        assert_eq!(parse_decision("rename"), Some(ConflictDecision::Rename));
        assert_eq!(parse_decision(""), Some(ConflictDecision::Skip));
        assert_eq!(parse_decision("maybe"), None);
    }

    #[test]
    fn test_second_interrupt_exits() {
        assert_eq!(interrupt_action(1), InterruptAction::CancelJobs);
        assert_eq!(interrupt_action(2), InterruptAction::Exit);
        assert_eq!(interrupt_action(5), InterruptAction::Exit);
    }

    #[test]
    fn test_overrides_apply_and_validate() {
        let mut config = Config::default();
        JobOverrides {
            target: Some("英文".to_string()),
            concurrency: Some(2),
            no_context: true,
            ..JobOverrides::default()
        }
        .apply(&mut config)
        .unwrap();
        assert_eq!(config.job.target_language, TargetLanguage::English);
        assert_eq!(config.job.concurrency, 2);
        assert_eq!(config.inference.context_lines, 0);

        let mut config = Config::default();
        let result = JobOverrides {
            concurrency: Some(0),
            ..JobOverrides::default()
        }
        .apply(&mut config);
        assert!(result.is_err());

        let mut config = Config::default();
        assert!(JobOverrides {
            target: Some("xx".to_string()),
            ..JobOverrides::default()
        }
        .apply(&mut config)
        .is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "subtrans", "translate", "a.srt", "b.srt", "-t", "en", "-j", "4", "--on-conflict", "rename",
        ])
        .unwrap();
        match args.command {
            Commands::Translate { inputs, target, concurrency, on_conflict, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(target.as_deref(), Some("en"));
                assert_eq!(concurrency, Some(4));
                assert_eq!(on_conflict.decision(), Some(ConflictDecision::Rename));
            }
            _ => panic!("expected translate"),
        }
    }
}
