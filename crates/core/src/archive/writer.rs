//! Async front end for [`ArchiveBuilder`].

use std::path::PathBuf;
use tokio::task::spawn_blocking;

use super::{ArchiveBuilder, ArchiveError, ArchiveSummary};

/// Owns an [`ArchiveBuilder`] and runs each of its operations through
/// `spawn_blocking`, keeping disk and compression work off the async workers.
pub struct ArchiveWriter {
    builder: Option<ArchiveBuilder>,
}

impl ArchiveWriter {
    /// Create the archive file at `path`, creating parent directories.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        let builder = run_blocking(move || ArchiveBuilder::create(path)).await?;
        Ok(Self {
            builder: Some(builder),
        })
    }

    /// Append the entry for `member_id`.
    pub async fn add_entry(
        &mut self,
        member_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ArchiveError> {
        let mut builder = self.builder.take().ok_or(ArchiveError::Closed)?;
        let member_id = member_id.into();
        let content = content.into();

        let (builder, result) = run_blocking(move || {
            let result = builder.add_entry(&member_id, &content);
            Ok((builder, result))
        })
        .await?;

        self.builder = Some(builder);
        result
    }

    /// Write the central directory and close the file.
    pub async fn finish(mut self) -> Result<ArchiveSummary, ArchiveError> {
        let builder = self.builder.take().ok_or(ArchiveError::Closed)?;
        run_blocking(move || builder.finish()).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ArchiveError>
where
    F: FnOnce() -> Result<T, ArchiveError> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| ArchiveError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_entries_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job").join("transcripts.zip");

        let mut writer = ArchiveWriter::create(&path).await.unwrap();
        writer.add_entry("vid1", "first").await.unwrap();
        writer.add_entry("vid2", "second").await.unwrap();
        let summary = writer.finish().await.unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.path, path);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            fixtures::read_archive(&bytes),
            vec![
                ("vid1.txt".to_string(), "first".to_string()),
                ("vid2.txt".to_string(), "second".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_keeps_writer_usable() {
        let temp = TempDir::new().unwrap();
        let mut writer = ArchiveWriter::create(temp.path().join("dup.zip"))
            .await
            .unwrap();

        writer.add_entry("a", "one").await.unwrap();
        let err = writer.add_entry("a", "two").await.unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { .. }));

        writer.add_entry("b", "three").await.unwrap();
        assert_eq!(writer.finish().await.unwrap().entries, 2);
    }

    #[tokio::test]
    async fn test_create_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let result = ArchiveWriter::create(blocker.join("out.zip")).await;
        assert!(matches!(
            result,
            Err(ArchiveError::DirectoryCreationFailed { .. })
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_runtime_keeps_running_during_writes() {
        let temp = TempDir::new().unwrap();

        // On a single-threaded runtime this task only gets polled when the
        // writer parks on the blocking pool.
        let ticker = tokio::spawn(async {});

        let mut writer = ArchiveWriter::create(temp.path().join("a.zip"))
            .await
            .unwrap();
        for i in 0..3 {
            writer
                .add_entry(format!("m{i}"), "x".repeat(64 * 1024))
                .await
                .unwrap();
        }
        writer.finish().await.unwrap();

        assert!(ticker.is_finished());
    }
}
