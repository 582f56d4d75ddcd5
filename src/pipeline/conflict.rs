use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// What to do when the output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    Overwrite,
    Rename,
    Skip,
}

/// Asked once per colliding output path
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn decide(&self, path: &Path) -> ConflictDecision;
}

/// A fixed policy answers every conflict the same way
#[async_trait]
impl ConflictResolver for ConflictDecision {
    async fn decide(&self, _path: &Path) -> ConflictDecision {
        *self
    }
}

/// A pending question from a job to whoever owns user interaction
#[derive(Debug)]
pub struct ConflictRequest {
    pub path: PathBuf,
    reply: oneshot::Sender<ConflictDecision>,
}

impl ConflictRequest {
    /// Send the decision back to the job that asked
    pub fn respond(self, decision: ConflictDecision) {
        if self.reply.send(decision).is_err() {
            warn!("Job waiting on {} went away before the decision arrived", self.path.display());
        }
    }
}

/// Hands conflicts to another task over a channel and waits for its answer.
///
/// The receiving side services requests on its own schedule. If it goes away,
/// the conflict resolves to `Skip` so nothing is overwritten unasked.
#[derive(Debug, Clone)]
pub struct ChannelConflictResolver {
    requests: mpsc::Sender<ConflictRequest>,
}

impl ChannelConflictResolver {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConflictRequest>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl ConflictResolver for ChannelConflictResolver {
    async fn decide(&self, path: &Path) -> ConflictDecision {
        let (reply, answer) = oneshot::channel();
        let request = ConflictRequest {
            path: path.to_path_buf(),
            reply,
        };

        if self.requests.send(request).await.is_err() {
            warn!("No conflict handler is listening, skipping {}", path.display());
            return ConflictDecision::Skip;
        }

        answer.await.unwrap_or_else(|_| {
            warn!("Conflict handler dropped the request for {}, skipping", path.display());
            ConflictDecision::Skip
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_policy() {
        assert_eq!(ConflictDecision::Rename.decide(Path::new("a.srt")).await, ConflictDecision::Rename);
    }

    #[tokio::test]
    async fn test_channel_round_trip_reaches_the_asking_job() {
        let (resolver, mut requests) = ChannelConflictResolver::new(4);

        let handler = tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                let decision = if request.path.ends_with("a.srt") {
                    ConflictDecision::Overwrite
                } else {
                    ConflictDecision::Rename
                };
                request.respond(decision);
            }
        });

        let first = resolver.clone();
        let (a, b) = tokio::join!(
            first.decide(Path::new("/tmp/a.srt")),
            resolver.decide(Path::new("/tmp/b.srt")),
        );
        assert_eq!(a, ConflictDecision::Overwrite);
        assert_eq!(b, ConflictDecision::Rename);

        drop(first);
        drop(resolver);
        handler.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_channel_skips() {
        let (resolver, requests) = ChannelConflictResolver::new(1);
        drop(requests);
        assert_eq!(resolver.decide(Path::new("x.srt")).await, ConflictDecision::Skip);
    }

    #[tokio::test]
    async fn test_dropped_request_skips() {
        let (resolver, mut requests) = ChannelConflictResolver::new(1);
        tokio::spawn(async move {
            let request = requests.recv().await;
            drop(request);
        });
        assert_eq!(resolver.decide(Path::new("x.srt")).await, ConflictDecision::Skip);
    }
}
