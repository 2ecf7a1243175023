pub mod archive;
pub mod config;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod resolver;
pub mod testing;

pub use archive::{ArchiveBuilder, ArchiveError, ArchiveSummary, ArchiveWriter};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use fetcher::{FetchOutcome, Fetcher, YouTubeTranscriptFetcher};
pub use job::{
    ArchiveArtifact, EventKind, EventStream, JobError, JobId, JobRegistry, JobSnapshot, JobState,
    ProgressEvent,
};
pub use resolver::{FallbackResolver, PlaylistPageResolver, ResolveError, Resolver, YtDlpResolver};
