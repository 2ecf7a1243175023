use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API from a browser. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Where finished archives are written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base directory; each job gets its own subdirectory.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
        }
    }
}

fn default_archive_dir() -> PathBuf {
    std::env::temp_dir().join("transcriptor")
}

/// Job execution limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Maximum number of jobs running at once. Extra jobs wait in `pending`.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

/// Playlist resolution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Path to the yt-dlp executable used by the primary strategy.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Timeout for a single yt-dlp invocation in seconds (default: 60)
    #[serde(default = "default_resolver_timeout")]
    pub timeout_secs: u64,
    /// Timeout for the playlist page request of the fallback strategy (default: 30)
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_resolver_timeout(),
            page_timeout_secs: default_page_timeout(),
        }
    }
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_resolver_timeout() -> u64 {
    60
}

fn default_page_timeout() -> u64 {
    30
}

/// Transcript fetching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Preferred caption languages, most preferred first.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_fetcher_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            timeout_secs: default_fetcher_timeout(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_fetcher_timeout() -> u64 {
    30
}
