//! Mock implementations of the external-facing traits.
//!
//! Lets jobs run end to end without yt-dlp or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use transcriptor_core::testing::{MockFetcher, MockResolver};
//!
//! let resolver = MockResolver::with_members(["a", "b", "c"]);
//! let fetcher = MockFetcher::new();
//! fetcher.fail_on("b", "HTTP 429").await;
//!
//! let registry = JobRegistry::new(Arc::new(resolver), Arc::new(fetcher), dir);
//! ```

mod mock_fetcher;
mod mock_resolver;

pub use mock_fetcher::MockFetcher;
pub use mock_resolver::MockResolver;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::{Cursor, Read};

    /// Member IDs `item-1` through `item-n`.
    pub fn member_ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("item-{i}")).collect()
    }

    /// A playlist URL for the given list ID.
    pub fn playlist_url(list_id: &str) -> String {
        format!("https://www.youtube.com/playlist?list={list_id}")
    }

    /// Entry names and contents of a ZIP archive, in archive order.
    ///
    /// Panics on malformed input; only meant for assertions.
    pub fn read_archive(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).expect("archive should be a valid zip");
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).expect("entry should be readable");
                let mut content = String::new();
                entry
                    .read_to_string(&mut content)
                    .expect("entry should be utf-8");
                (entry.name().to_string(), content)
            })
            .collect()
    }
}
