// Batched translation pipeline
//
// - job: per-file parameters, cancellation flag and outcomes
// - batch: fan-out/fan-in over fixed-size batches of one file
// - output: destination path next to the source, with conflict handling
// - conflict: overwrite/rename/skip decisions and the channel hand-off to the UI
// - runner: one task per file, completion tracking and cancellation

pub mod batch;
pub mod conflict;
pub mod job;
pub mod output;
pub mod runner;

pub use batch::BatchTranslator;
pub use conflict::{ChannelConflictResolver, ConflictDecision, ConflictRequest, ConflictResolver};
pub use job::{CancellationFlag, JobReport, RunOutcome, RunStats, TranslationJob};
pub use output::OutputPathResolver;
pub use runner::{ChannelObserver, JobEvent, JobObserver, JobRunner};
