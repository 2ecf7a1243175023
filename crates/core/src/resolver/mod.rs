//! Playlist resolution.
//!
//! A `Resolver` turns a source URL into the ordered member IDs of the
//! collection behind it. Two strategies ship with the crate:
//!
//! - [`YtDlpResolver`]: asks the `yt-dlp` binary for a flat playlist listing
//! - [`PlaylistPageResolver`]: scrapes video IDs from the playlist page HTML
//!
//! [`FallbackResolver`] chains a primary and a secondary strategy. It never
//! fails: when neither strategy yields members the result is an empty list.
//!
//! # Example
//!
//! ```ignore
//! use transcriptor_core::resolver::{FallbackResolver, PlaylistPageResolver, YtDlpResolver};
//!
//! let resolver = FallbackResolver::new(
//!     Arc::new(YtDlpResolver::new(config.resolver.clone())),
//!     Arc::new(PlaylistPageResolver::new(&config.resolver)?),
//! );
//! let ids = resolver.resolve("https://www.youtube.com/playlist?list=PL123").await?;
//! ```

mod fallback;
mod page;
mod traits;
mod ytdlp;

pub use fallback::{dedup_members, FallbackResolver};
pub use page::PlaylistPageResolver;
pub use traits::{ResolveError, Resolver};
pub use ytdlp::YtDlpResolver;
