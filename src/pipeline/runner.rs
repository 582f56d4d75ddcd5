use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::inference::InferenceClient;
use super::batch::BatchTranslator;
use super::conflict::ConflictResolver;
use super::job::{CancellationFlag, JobReport, TranslationJob};

/// Callbacks toward the front-end. All methods may be called from worker tasks.
pub trait JobObserver: Send + Sync {
    fn on_progress(&self, _job: &TranslationJob, _current: usize, _total: usize) {}

    fn on_file_complete(&self, _report: &JobReport) {}

    /// Called once when every job of a `start_all` call has finished
    fn on_all_complete(&self) {}
}

/// Events forwarded by `ChannelObserver`
#[derive(Debug)]
pub enum JobEvent {
    Progress {
        job_id: Uuid,
        file_path: PathBuf,
        current: usize,
        total: usize,
    },
    FileComplete(JobReport),
    AllComplete,
}

/// Forwards observer callbacks into a channel for a UI loop to drain
pub struct ChannelObserver {
    events: mpsc::UnboundedSender<JobEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    fn send(&self, event: JobEvent) {
        // A closed receiver means nobody is watching anymore
        let _ = self.events.send(event);
    }
}

impl JobObserver for ChannelObserver {
    fn on_progress(&self, job: &TranslationJob, current: usize, total: usize) {
        self.send(JobEvent::Progress {
            job_id: job.id,
            file_path: job.file_path.clone(),
            current,
            total,
        });
    }

    fn on_file_complete(&self, report: &JobReport) {
        self.send(JobEvent::FileComplete(report.clone()));
    }

    fn on_all_complete(&self) {
        self.send(JobEvent::AllComplete);
    }
}

/// Runs one task per file and tracks when they are all done
pub struct JobRunner {
    translator: Arc<BatchTranslator>,
    conflicts: Arc<dyn ConflictResolver>,
    observer: Arc<dyn JobObserver>,
    active: Arc<Mutex<HashMap<Uuid, CancellationFlag>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobRunner {
    /// `max_in_flight` of 0 leaves each file bounded only by its own batch size
    pub fn new(
        client: Arc<dyn InferenceClient>,
        context_lines: usize,
        max_in_flight: usize,
        conflicts: Arc<dyn ConflictResolver>,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        let limiter = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        let translator = BatchTranslator::new(client, context_lines).with_limiter(limiter);

        Self {
            translator: Arc::new(translator),
            conflicts,
            observer,
            active: Arc::new(Mutex::new(HashMap::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Start every job concurrently. Must be called from within a tokio runtime.
    pub fn start_all(&self, jobs: Vec<TranslationJob>) {
        let total = jobs.len();
        info!("Starting {} translation job(s)", total);

        if total == 0 {
            self.observer.on_all_complete();
            return;
        }

        let finished = Arc::new(AtomicUsize::new(0));
        let mut handles = self.handles.lock();

        for job in jobs {
            self.active.lock().insert(job.id, job.cancellation());

            let translator = Arc::clone(&self.translator);
            let conflicts = Arc::clone(&self.conflicts);
            let observer = Arc::clone(&self.observer);
            let active = Arc::clone(&self.active);
            let finished = Arc::clone(&finished);

            handles.push(tokio::spawn(async move {
                let progress_observer = Arc::clone(&observer);
                let progress_job = job.clone();
                let outcome = translator
                    .translate_file(
                        &job,
                        move |current, total| progress_observer.on_progress(&progress_job, current, total),
                        conflicts.as_ref(),
                    )
                    .await;

                if let Err(e) = &outcome {
                    warn!("Job for {} failed: {}", job.file_path.display(), e);
                }

                active.lock().remove(&job.id);
                let report = JobReport {
                    job_id: job.id,
                    source: job.file_path.clone(),
                    outcome: outcome.map_err(Arc::new),
                };
                info!("{}", report);
                observer.on_file_complete(&report);

                if finished.fetch_add(1, Ordering::SeqCst) + 1 == total {
                    info!("All {} translation job(s) finished", total);
                    observer.on_all_complete();
                }
            }));
        }
    }

    /// Request cancellation of one job; false when it is no longer running
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.active.lock().get(&job_id) {
            Some(flag) => {
                info!("Cancellation requested for job {}", job_id);
                flag.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let active = self.active.lock();
        info!("Cancellation requested for {} active job(s)", active.len());
        for flag in active.values() {
            flag.cancel();
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.active.lock().len()
    }

    /// Wait for every started job to finish
    pub async fn wait(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Translation task panicked: {}", e);
            }
        }
    }
}
