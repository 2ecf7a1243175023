//! Incremental ZIP writer.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ArchiveError;

/// MIME type of finished archives.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Extension given to every entry.
const ENTRY_EXTENSION: &str = "txt";

/// Summary of a finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Location of the archive on disk.
    pub path: PathBuf,
    /// Number of entries written.
    pub entries: usize,
    /// Final size in bytes.
    pub size_bytes: u64,
}

/// Entry name for a member: the ID with path-unsafe characters replaced,
/// plus a fixed extension.
pub fn entry_name(member_id: &str) -> String {
    let stem: String = member_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.{ENTRY_EXTENSION}")
}

/// Writes named text entries into a single ZIP file.
pub struct ArchiveBuilder {
    path: PathBuf,
    writer: ZipWriter<File>,
    names: HashSet<String>,
}

impl ArchiveBuilder {
    /// Create the archive file at `path`, creating parent directories.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                ArchiveError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        let file = File::create(&path)?;
        debug!(path = %path.display(), "Created archive");

        Ok(Self {
            path,
            writer: ZipWriter::new(file),
            names: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    /// Append the entry for `member_id`.
    ///
    /// Two members mapping to the same entry name is an error; the earlier
    /// entry is never overwritten.
    pub fn add_entry(&mut self, member_id: &str, content: &str) -> Result<(), ArchiveError> {
        let name = entry_name(member_id);
        if self.names.contains(&name) {
            return Err(ArchiveError::DuplicateEntry { name });
        }

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name.as_str(), options)?;
        self.writer.write_all(content.as_bytes())?;
        self.names.insert(name);
        Ok(())
    }

    /// Write the central directory and close the file.
    pub fn finish(mut self) -> Result<ArchiveSummary, ArchiveError> {
        let mut file = self.writer.finish()?;
        file.flush()?;
        let size_bytes = file.metadata()?.len();

        Ok(ArchiveSummary {
            path: self.path,
            entries: self.names.len(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_entries(path: &Path) -> Vec<(String, String)> {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (entry.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("dQw4w9WgXcQ"), "dQw4w9WgXcQ.txt");
        assert_eq!(entry_name("a-b_c"), "a-b_c.txt");
        assert_eq!(entry_name("../etc/passwd"), ".._etc_passwd.txt");
    }

    #[test]
    fn test_entries_written_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job").join("transcripts.zip");

        let mut builder = ArchiveBuilder::create(&path).unwrap();
        builder.add_entry("vid1", "first transcript").unwrap();
        builder.add_entry("vid2", "[No transcript available]").unwrap();
        assert_eq!(builder.entry_count(), 2);

        let summary = builder.finish().unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.path, path);
        assert!(summary.size_bytes > 0);

        let entries = read_entries(&path);
        assert_eq!(
            entries,
            vec![
                ("vid1.txt".to_string(), "first transcript".to_string()),
                (
                    "vid2.txt".to_string(),
                    "[No transcript available]".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.zip");

        let summary = ArchiveBuilder::create(&path).unwrap().finish().unwrap();
        assert_eq!(summary.entries, 0);
        assert!(read_entries(&path).is_empty());
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let temp = TempDir::new().unwrap();
        let mut builder = ArchiveBuilder::create(temp.path().join("dup.zip")).unwrap();

        builder.add_entry("a/b", "one").unwrap();
        let err = builder.add_entry("a?b", "two").unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { ref name } if name == "a_b.txt"));
        assert_eq!(builder.entry_count(), 1);
    }

    #[test]
    fn test_create_fails_when_parent_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = ArchiveBuilder::create(blocker.join("out.zip"));
        assert!(matches!(
            result,
            Err(ArchiveError::DirectoryCreationFailed { .. })
        ));
    }
}
