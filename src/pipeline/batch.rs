use std::ops::Range;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{InferenceError, Result};
use crate::inference::{context_window, InferenceClient, TranslationRequest};
use crate::subtitle::{read_subtitles, write_subtitles, SubtitleItem};
use super::conflict::ConflictResolver;
use super::job::{RunOutcome, RunStats, TranslationJob};
use super::output::OutputPathResolver;

type ItemResult = std::result::Result<String, InferenceError>;

enum BatchLoop {
    Finished(RunStats),
    Cancelled { stats: RunStats, untranslated: Vec<usize> },
}

/// Translates a subtitle sequence in fixed-size batches.
///
/// Items of one batch are requested concurrently; the next batch starts only
/// after every item of the current one has resolved.
pub struct BatchTranslator {
    client: Arc<dyn InferenceClient>,
    context_lines: usize,
    limiter: Option<Arc<Semaphore>>,
}

impl BatchTranslator {
    pub fn new(client: Arc<dyn InferenceClient>, context_lines: usize) -> Self {
        Self {
            client,
            context_lines,
            limiter: None,
        }
    }

    /// Share an in-flight request cap with other translators
    pub fn with_limiter(mut self, limiter: Option<Arc<Semaphore>>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Read, translate and write one file
    pub async fn translate_file<F>(
        &self,
        job: &TranslationJob,
        on_progress: F,
        conflicts: &dyn ConflictResolver,
    ) -> Result<RunOutcome>
    where
        F: FnMut(usize, usize) + Send,
    {
        info!("Translating {} to {}", job.file_path.display(), job.target_language);

        let mut items = read_subtitles(&job.file_path).await?;
        let outcome = self.run(job, &mut items, on_progress, conflicts).await;

        if let RunOutcome::Completed { output_path, .. } = &outcome {
            write_subtitles(output_path, &items).await?;
        }

        Ok(outcome)
    }

    /// Translate `items` in place, then pick the output path
    pub async fn run<F>(
        &self,
        job: &TranslationJob,
        items: &mut [SubtitleItem],
        on_progress: F,
        conflicts: &dyn ConflictResolver,
    ) -> RunOutcome
    where
        F: FnMut(usize, usize) + Send,
    {
        let stats = match self.translate_batches(job, items, on_progress).await {
            BatchLoop::Finished(stats) => stats,
            BatchLoop::Cancelled { stats, untranslated } => {
                return RunOutcome::Cancelled { stats, untranslated };
            }
        };

        info!(
            "Finished {}: {}/{} lines translated",
            job.file_path.display(),
            stats.translated,
            stats.total
        );

        match OutputPathResolver::new(conflicts)
            .resolve(&job.file_path, job.target_language)
            .await
        {
            Some(output_path) => RunOutcome::Completed { output_path, stats },
            None => RunOutcome::Skipped { stats },
        }
    }

    /// The cancellation flag is read only before a batch starts. A request
    /// arriving during the last batch therefore still finishes the file.
    async fn translate_batches<F>(
        &self,
        job: &TranslationJob,
        items: &mut [SubtitleItem],
        mut on_progress: F,
    ) -> BatchLoop
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = items.len();
        let batch_size = job.concurrency();
        let mut stats = RunStats {
            total,
            ..RunStats::default()
        };

        let mut start = 0;
        while start < total {
            if job.is_cancel_requested() {
                let untranslated: Vec<usize> = items[start..].iter().map(|item| item.index).collect();
                warn!(
                    "Cancelled {} after {}/{} lines",
                    job.file_path.display(),
                    start,
                    total
                );
                return BatchLoop::Cancelled { stats, untranslated };
            }

            let end = (start + batch_size).min(total);
            debug!("Dispatching lines {}-{} of {}", start + 1, end, total);

            let results = self.dispatch_batch(job, items, start..end).await;
            for (offset, result) in results.into_iter().enumerate() {
                let item = &mut items[start + offset];
                match result {
                    Some(Ok(text)) => {
                        item.text = text;
                        stats.translated += 1;
                    }
                    Some(Err(e)) => {
                        warn!("Line {} kept its original text: {}", item.index, e);
                        stats.failed.push(item.index);
                    }
                    None => {
                        warn!("Line {} kept its original text: request task aborted", item.index);
                        stats.failed.push(item.index);
                    }
                }
            }

            on_progress(end, total);
            start = end;
        }

        BatchLoop::Finished(stats)
    }

    /// Fan out one request per item and wait for all of them.
    ///
    /// Results come back in item order regardless of completion order.
    async fn dispatch_batch(
        &self,
        job: &TranslationJob,
        items: &[SubtitleItem],
        range: Range<usize>,
    ) -> Vec<Option<ItemResult>> {
        let start = range.start;
        let mut results: Vec<Option<ItemResult>> = vec![None; range.len()];
        let mut tasks = JoinSet::new();

        for position in range {
            let request = TranslationRequest {
                text: items[position].text.clone(),
                context: context_window(items, position, self.context_lines),
                source_language: job.source_language.clone(),
                target_language: job.target_language,
                model: job.model.clone(),
            };
            let client = Arc::clone(&self.client);
            let limiter = self.limiter.clone();

            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                (position, client.translate(&request).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => results[position - start] = Some(result),
                Err(e) => warn!("Translation task failed: {}", e),
            }
        }

        results
    }
}
