use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::TargetLanguage;
use super::conflict::{ConflictDecision, ConflictResolver};

/// Picks where a translated file is written, next to its source.
///
/// `movie.srt` translated to Traditional Chinese becomes `movie.zh_tw.srt`.
pub struct OutputPathResolver<'a> {
    conflicts: &'a dyn ConflictResolver,
}

impl<'a> OutputPathResolver<'a> {
    pub fn new(conflicts: &'a dyn ConflictResolver) -> Self {
        Self { conflicts }
    }

    /// Destination path, or `None` when the user chose to skip the file
    pub async fn resolve(&self, source: &Path, target: TargetLanguage) -> Option<PathBuf> {
        let candidate = candidate_path(source, target, None);
        if !candidate.exists() {
            return Some(candidate);
        }

        match self.conflicts.decide(&candidate).await {
            ConflictDecision::Overwrite => {
                info!("Overwriting existing file: {}", candidate.display());
                Some(candidate)
            }
            ConflictDecision::Rename => {
                let renamed = (1usize..)
                    .map(|counter| candidate_path(source, target, Some(counter)))
                    .find(|path| !path.exists())?;
                info!("{} exists, writing to {}", candidate.display(), renamed.display());
                Some(renamed)
            }
            ConflictDecision::Skip => {
                info!("Skipping existing file: {}", candidate.display());
                None
            }
        }
    }
}

/// `<dir>/<stem>.<code>[_<counter>]<.ext>`
pub fn candidate_path(source: &Path, target: TargetLanguage, counter: Option<usize>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let counter = counter.map(|n| format!("_{}", n)).unwrap_or_default();

    let file_name = format!("{}.{}{}{}", stem, target.code(), counter, extension);
    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_candidate_path() {
        let source = Path::new("/videos/movie.srt");
        assert_eq!(
            candidate_path(source, TargetLanguage::TraditionalChinese, None),
            PathBuf::from("/videos/movie.zh_tw.srt")
        );
        assert_eq!(
            candidate_path(source, TargetLanguage::English, Some(3)),
            PathBuf::from("/videos/movie.en_3.srt")
        );
        assert_eq!(
            candidate_path(Path::new("noext"), TargetLanguage::Japanese, None),
            PathBuf::from("noext.jp")
        );
    }

    #[tokio::test]
    async fn test_free_path_is_returned_without_asking() {
        let dir = assert_fs::TempDir::new().unwrap();
        let source = dir.child("movie.srt");
        source.touch().unwrap();

        // Skip would yield None if it were consulted
        let policy = ConflictDecision::Skip;
        let resolved = OutputPathResolver::new(&policy)
            .resolve(source.path(), TargetLanguage::TraditionalChinese)
            .await;
        assert_eq!(resolved, Some(dir.child("movie.zh_tw.srt").path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_overwrite_returns_same_path() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("movie.zh_tw.srt").touch().unwrap();

        let policy = ConflictDecision::Overwrite;
        let resolved = OutputPathResolver::new(&policy)
            .resolve(dir.child("movie.srt").path(), TargetLanguage::TraditionalChinese)
            .await;
        assert_eq!(resolved, Some(dir.child("movie.zh_tw.srt").path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_rename_picks_lowest_free_counter() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("movie.zh_tw.srt").touch().unwrap();
        dir.child("movie.zh_tw_1.srt").touch().unwrap();
        dir.child("movie.zh_tw_3.srt").touch().unwrap();

        let policy = ConflictDecision::Rename;
        let resolved = OutputPathResolver::new(&policy)
            .resolve(dir.child("movie.srt").path(), TargetLanguage::TraditionalChinese)
            .await;
        assert_eq!(resolved, Some(dir.child("movie.zh_tw_2.srt").path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_skip_returns_none() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("movie.en.srt").touch().unwrap();

        let policy = ConflictDecision::Skip;
        let resolved = OutputPathResolver::new(&policy)
            .resolve(dir.child("movie.srt").path(), TargetLanguage::English)
            .await;
        assert_eq!(resolved, None);
    }
}
