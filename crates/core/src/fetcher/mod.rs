//! Per-item transcript fetching.
//!
//! A `Fetcher` never fails: every outcome, including errors, is a
//! [`FetchOutcome`] value so that one bad item cannot abort a batch.

mod traits;
mod youtube;

pub use traits::{FetchOutcome, Fetcher, ERROR_PREFIX, UNAVAILABLE_SENTINEL};
pub use youtube::YouTubeTranscriptFetcher;
