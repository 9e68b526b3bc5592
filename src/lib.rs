//! tvmaze_resolver - Match local TV episode files to the TVMaze catalog
//!
//! This library takes what is known about a local video file (season and
//! episode numbers, its filename, the show it belongs to) and resolves it to
//! at most one episode of the TVMaze catalog. Specials get a synthesized
//! number and a placement among the regular episodes. Around the resolver it
//! provides series identification, series and season metadata mapping, and a
//! TTL cache for episode lists.

mod cache;
mod config;
mod file_resolver;
mod matcher;
mod metadata;
mod metadata_retrieval;
mod resolver;
mod text;

use std::sync::Arc;
use thiserror::Error;

// Re-export error types
pub use file_resolver::FileResolverError;
pub use metadata_retrieval::MetadataRetrievalError;
pub use resolver::ResolveError;

pub use cache::{Clock, EpisodeListCache, SystemClock};
pub use config::{DEFAULT_ABSOLUTE_TTL, DEFAULT_BASE_URL, DEFAULT_SLIDING_TTL, ResolverConfig};
pub use file_resolver::{VideoFile, is_video_file, parse_episode_numbers, scan_for_videos};
pub use matcher::{
    Ambiguity, CandidateSummary, ID_TAG_PREFIX, LocalEpisodeSignal, MatchOutcome, SeasonPosition,
    compute_position, identify, match_episode, special_ordinal,
};
pub use metadata::{
    IMDB_PROVIDER, ItemKind, MetadataService, PersonInfo, ProviderIds, SeasonMetadata,
    SeriesInfo, SeriesMetadata, SeriesSearchResult, SeriesStatus, TVDB_PROVIDER, TVMAZE_PROVIDER,
    TVRAGE_PROVIDER, external_url, parse_series_name, tvmaze_id,
};
pub use metadata_retrieval::{
    CachedCatalog, CastMember, Catalog, EpisodeId, EpisodeKind, ExternalIds, ImageLinks, Network,
    RemoteEpisode, RemoteSeason, RemoteShow, RetryPolicy, ShowId, ShowSearchResult, TvMazeClient,
};
pub use resolver::{EpisodeMetadata, EpisodeResolver, Resolution, describe_episode};
pub use text::{normalize, parse_date, strip_markup};

/// Top-level error type for tvmaze_resolver operations
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Error during file resolution
    #[error("File resolution error: {0}")]
    FileResolver(#[from] FileResolverError),

    /// Error during metadata retrieval
    #[error("Metadata retrieval error: {0}")]
    MetadataRetrieval(#[from] MetadataRetrievalError),

    /// Error during episode resolution
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),
}

/// Builds a metadata service talking to the TVMaze API
///
/// The service owns a fresh episode list cache using the system clock and
/// the lifetimes from `config`.
///
/// # Examples
///
/// ```no_run
/// use tvmaze_resolver::{LocalEpisodeSignal, ResolverConfig, tvmaze_service};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), tvmaze_resolver::ResolverError> {
/// let service = tvmaze_service(&ResolverConfig::default())?;
/// let signal = LocalEpisodeSignal::new(169, "Breaking Bad S01E01.mkv")
///     .with_numbers(Some(1), Some(1));
///
/// let resolution = service
///     .episode_metadata(&signal, &CancellationToken::new())
///     .await?;
/// if let Some(episode) = resolution.metadata() {
///     println!("{}", episode.name);
/// }
/// # Ok(())
/// # }
/// ```
pub fn tvmaze_service(
    config: &ResolverConfig,
) -> Result<MetadataService<TvMazeClient>, ResolverError> {
    let client = TvMazeClient::with_config(config)?;
    let cache = EpisodeListCache::new(
        Arc::new(SystemClock),
        config.absolute_ttl,
        config.sliding_ttl,
    );

    Ok(MetadataService::new(Arc::new(CachedCatalog::new(
        client, cache,
    ))))
}
