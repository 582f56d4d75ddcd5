use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::config::{JobConfig, TargetLanguage};
use crate::error::{Result, SubtransError};

/// Cooperative cancellation shared between a job and whoever may stop it
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One input file and the parameters it is translated with
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub id: Uuid,
    pub file_path: PathBuf,
    pub source_language: String,
    pub target_language: TargetLanguage,
    pub model: String,
    /// Batch size, always at least 1
    concurrency: usize,
    cancel: CancellationFlag,
}

impl TranslationJob {
    pub fn new<P: AsRef<Path>>(
        file_path: P,
        source_language: &str,
        target_language: TargetLanguage,
        model: &str,
        concurrency: usize,
    ) -> Result<Self> {
        if concurrency == 0 {
            return Err(SubtransError::Config(format!(
                "concurrency must be at least 1 for {}",
                file_path.as_ref().display()
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            file_path: file_path.as_ref().to_path_buf(),
            source_language: source_language.to_string(),
            target_language,
            model: model.to_string(),
            concurrency,
            cancel: CancellationFlag::new(),
        })
    }

    /// Build a job from configuration; the target label is checked by the config layer
    pub fn from_config<P: AsRef<Path>>(file_path: P, config: &JobConfig) -> Result<Self> {
        Self::new(
            file_path,
            &config.source_language,
            config.target_language,
            &config.model,
            config.concurrency,
        )
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Per-file translation counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub translated: usize,
    /// Subtitle indices whose request failed and kept their source text
    pub failed: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { output_path: PathBuf, stats: RunStats },
    /// The output already existed and the user chose not to touch it
    Skipped { stats: RunStats },
    /// Stopped at a batch boundary; nothing was written
    Cancelled { stats: RunStats, untranslated: Vec<usize> },
}

impl RunOutcome {
    pub fn stats(&self) -> &RunStats {
        match self {
            RunOutcome::Completed { stats, .. }
            | RunOutcome::Skipped { stats }
            | RunOutcome::Cancelled { stats, .. } => stats,
        }
    }
}

/// Final state of one job as delivered to the front-end
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: Uuid,
    pub source: PathBuf,
    pub outcome: std::result::Result<RunOutcome, Arc<SubtransError>>,
}

impl JobReport {
    pub fn message(&self) -> String {
        match &self.outcome {
            Ok(RunOutcome::Completed { output_path, stats }) => {
                let mut message = format!("Translation complete | saved as: {}", output_path.display());
                if !stats.failed.is_empty() {
                    message.push_str(&format!(
                        " ({} of {} lines kept their original text)",
                        stats.failed.len(),
                        stats.total
                    ));
                }
                message
            }
            Ok(RunOutcome::Skipped { .. }) => format!("Skipped file: {}", self.source.display()),
            Ok(RunOutcome::Cancelled { untranslated, .. }) => format!(
                "Cancelled: {} ({} lines not translated)",
                self.source.display(),
                untranslated.len()
            ),
            Err(e) => format!("Failed: {}: {}", self.source.display(), e),
        }
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
