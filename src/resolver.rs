//! Episode resolver
//!
//! Resolves a local episode file against the catalog: obtains the show's
//! episode list through the cache, runs the matching cascade and maps the
//! matched record into the metadata a host stores for the file.

use crate::matcher::{
    Ambiguity, LocalEpisodeSignal, MatchOutcome, SeasonPosition, compute_position, match_episode,
    special_ordinal,
};
use crate::metadata_retrieval::{
    CachedCatalog, Catalog, EpisodeId, EpisodeKind, MetadataRetrievalError, RemoteEpisode,
};
use crate::text::{parse_date, strip_markup};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Errors that abort an episode resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The catalog could not deliver the episode list
    #[error("Catalog error: {0}")]
    Catalog(#[from] MetadataRetrievalError),

    /// The caller cancelled the resolution
    #[error("Episode resolution was cancelled")]
    Cancelled,
}

/// Metadata of a resolved episode, ready to be stored by the host
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeMetadata {
    /// Catalog id of the matched episode
    pub tvmaze_id: EpisodeId,
    pub name: String,
    /// Season number; 0 for specials, unset for unknown episode kinds
    pub season_number: Option<u32>,
    /// Episode number; the special ordinal for specials
    pub episode_number: Option<u32>,
    /// Air date, if the catalog's date could be parsed
    pub premiere_date: Option<NaiveDate>,
    pub runtime: Option<Duration>,
    /// Summary with inline markup stripped
    pub overview: Option<String>,
    /// Placement of significant specials among the regular episodes
    pub position: SeasonPosition,
    pub kind: EpisodeKind,
}

/// Outcome of resolving a local episode
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one episode matched
    Matched(EpisodeMetadata),
    /// Nothing matched, or the file lacks the show id
    NoMatch,
    /// Several episodes matched; the file needs a more specific name
    Ambiguous(Ambiguity),
}

impl Resolution {
    /// Returns the resolved metadata, if any
    pub fn metadata(&self) -> Option<&EpisodeMetadata> {
        match self {
            Resolution::Matched(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// Resolves local episode files against a cached catalog
///
/// All collaborators are handed in at construction; the resolver keeps no
/// state of its own besides what the cached catalog holds.
pub struct EpisodeResolver<C>
where
    C: Catalog,
{
    catalog: Arc<CachedCatalog<C>>,
}

impl<C> EpisodeResolver<C>
where
    C: Catalog,
{
    /// Creates a resolver working on the given cached catalog
    pub fn new(catalog: Arc<CachedCatalog<C>>) -> Self {
        Self { catalog }
    }

    /// Resolves one local episode
    ///
    /// Performs at most one catalog request (none on a cache hit). The
    /// request is abandoned as soon as `cancel` fires, in which case nothing
    /// is cached and `ResolveError::Cancelled` is returned. Catalog errors are
    /// passed through so the caller can retry later.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let signal = LocalEpisodeSignal::new(169, "/tv/Breaking Bad/Pilot.mkv")
    ///     .with_numbers(Some(1), Some(1));
    /// match resolver.resolve(&signal, &CancellationToken::new()).await? {
    ///     Resolution::Matched(episode) => println!("{}", episode.name),
    ///     Resolution::NoMatch => println!("no match"),
    ///     Resolution::Ambiguous(ambiguity) => println!("{ambiguity}"),
    /// }
    /// ```
    pub async fn resolve(
        &self,
        signal: &LocalEpisodeSignal,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let Some(show_id) = signal.series_id else {
            debug!(path = %signal.path.display(), "No TVMaze show id, skipping resolution");
            return Ok(Resolution::NoMatch);
        };

        debug!(
            show_id,
            season = ?signal.season_number,
            episode = ?signal.episode_number,
            path = %signal.path.display(),
            "Resolving episode"
        );

        let episodes = cancellable(cancel, self.catalog.episode_list(show_id)).await?;

        let resolution = match match_episode(&episodes, signal) {
            MatchOutcome::Unique(episode) => {
                Resolution::Matched(describe_episode(&episodes, &episode))
            }
            MatchOutcome::NoMatch => Resolution::NoMatch,
            MatchOutcome::Ambiguous(ambiguity) => Resolution::Ambiguous(ambiguity),
        };

        Ok(resolution)
    }
}

/// Awaits a catalog request unless `cancel` fires first
///
/// On cancellation the request future is dropped before completion.
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    request: F,
) -> Result<T, ResolveError>
where
    F: Future<Output = Result<T, MetadataRetrievalError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ResolveError::Cancelled),
        result = request => Ok(result?),
    }
}

/// Maps a matched catalog record into host metadata
///
/// `all` is the full catalog-ordered episode list the record was picked
/// from; specials are numbered and placed relative to it.
pub fn describe_episode(all: &[RemoteEpisode], episode: &RemoteEpisode) -> EpisodeMetadata {
    let (season_number, episode_number) = match &episode.kind {
        EpisodeKind::Regular => (episode.season_number, episode.episode_number),
        EpisodeKind::SignificantSpecial | EpisodeKind::InsignificantSpecial => {
            (Some(0), Some(special_ordinal(all, episode)))
        }
        EpisodeKind::Unknown(tag) => {
            warn!(id = episode.id, kind = %tag, "Found unknown episode type");
            (None, None)
        }
    };

    let position = match episode.kind {
        EpisodeKind::SignificantSpecial => compute_position(all, episode),
        _ => SeasonPosition::default(),
    };

    EpisodeMetadata {
        tvmaze_id: episode.id,
        name: episode.name.clone(),
        season_number,
        episode_number,
        premiere_date: episode.air_date.as_deref().and_then(parse_date),
        runtime: episode
            .runtime
            .map(|minutes| Duration::from_secs(u64::from(minutes) * 60)),
        overview: episode.summary.as_deref().map(strip_markup),
        position,
        kind: episode.kind.clone(),
    }
}
