//! Data structures and traits for TV catalog metadata retrieval.
//!
//! This module provides structures to represent shows, seasons, episodes and
//! cast as the remote catalog reports them, as well as the trait a catalog
//! client implements so the resolver can be driven by any source.

mod cached;
mod retry;
mod tvmaze;
mod tvmaze_types;

pub use cached::CachedCatalog;
pub use retry::RetryPolicy;
pub use tvmaze::TvMazeClient;

use async_trait::async_trait;
use thiserror::Error;

/// Numeric TVMaze show id
pub type ShowId = u32;

/// Numeric TVMaze episode id
pub type EpisodeId = u32;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the catalog failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the catalog's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The requested series was not found
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// The catalog kept rejecting requests after all retry attempts
    #[error("Rate limited by the catalog after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },
}

/// Classification of a catalog episode record.
///
/// The set is closed on purpose: supporting a new catalog type means adding a
/// variant and handling it everywhere the compiler points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeKind {
    /// A normal episode with catalog-assigned season and episode numbers
    Regular,
    /// A special that belongs to the story and gets an in-season position
    SignificantSpecial,
    /// A special outside the story (recaps, behind the scenes, ...)
    InsignificantSpecial,
    /// A type tag this crate does not know about
    Unknown(String),
}

impl EpisodeKind {
    /// Maps the catalog's `type` tag to a kind
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("regular") => EpisodeKind::Regular,
            Some("significant_special") => EpisodeKind::SignificantSpecial,
            Some("insignificant_special") => EpisodeKind::InsignificantSpecial,
            Some(other) => EpisodeKind::Unknown(other.to_string()),
            None => EpisodeKind::Unknown(String::new()),
        }
    }

    /// Returns true for both special variants
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            EpisodeKind::SignificantSpecial | EpisodeKind::InsignificantSpecial
        )
    }
}

/// A single episode record as reported by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEpisode {
    /// Catalog id of the episode
    pub id: EpisodeId,
    /// Season the catalog lists the episode under
    pub season_number: Option<u32>,
    /// Episode number within the season (usually absent for specials)
    pub episode_number: Option<u32>,
    /// The episode title
    pub name: String,
    /// Air date exactly as the catalog formats it (normally `YYYY-MM-DD`)
    pub air_date: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    /// Summary, possibly containing inline HTML
    pub summary: Option<String>,
    /// Regular episode or one of the special kinds
    pub kind: EpisodeKind,
}

/// Poster/still links in the two sizes the catalog provides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLinks {
    pub medium: Option<String>,
    pub original: Option<String>,
}

/// Cross references to other databases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalIds {
    pub imdb: Option<String>,
    pub tvrage: Option<u32>,
    pub thetvdb: Option<u32>,
}

/// Broadcasting network of a show.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub name: String,
    /// ISO country code, when the network is tied to a country
    pub country_code: Option<String>,
}

/// Main information about a show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteShow {
    pub id: ShowId,
    pub name: String,
    pub genres: Vec<String>,
    /// `Running`, `Ended`, `To Be Determined`, ...
    pub status: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    /// Premiere date as formatted by the catalog
    pub premiered: Option<String>,
    /// Catalog page of the show
    pub url: Option<String>,
    pub summary: Option<String>,
    pub rating: Option<f64>,
    pub network: Option<Network>,
    pub image: Option<ImageLinks>,
    pub externals: ExternalIds,
}

/// A show returned by a name search together with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowSearchResult {
    pub score: f64,
    pub show: RemoteShow,
}

/// A season record of a show.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSeason {
    pub id: u32,
    pub number: Option<u32>,
    pub name: Option<String>,
    pub premiere_date: Option<String>,
}

/// One credited actor and the character they play.
#[derive(Debug, Clone, PartialEq)]
pub struct CastMember {
    pub person_id: u32,
    pub person_name: String,
    pub person_image: Option<ImageLinks>,
    pub character_name: String,
}

/// Trait for catalog clients that can fetch TV metadata.
///
/// Implementors retrieve records from a remote show database. Lookups that
/// simply find nothing return `Ok(None)`; only transport and format problems
/// are errors. Implementations own any retry policy; callers never retry.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches every episode of a show, specials included, in catalog order.
    ///
    /// The order is the series' air order and is relied upon for positional
    /// inference of specials.
    async fn show_episodes(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteEpisode>, MetadataRetrievalError>;

    /// Searches shows by name, ranked by the catalog's relevance.
    async fn search_shows(&self, name: &str)
    -> Result<Vec<ShowSearchResult>, MetadataRetrievalError>;

    /// Fetches a show's main information by catalog id.
    async fn show(&self, show_id: ShowId) -> Result<Option<RemoteShow>, MetadataRetrievalError>;

    /// Looks a show up by its IMDb id.
    async fn lookup_by_imdb(&self, imdb_id: &str)
    -> Result<Option<RemoteShow>, MetadataRetrievalError>;

    /// Looks a show up by its TVRage id.
    async fn lookup_by_tvrage(
        &self,
        tvrage_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError>;

    /// Looks a show up by its TheTVDB id.
    async fn lookup_by_thetvdb(
        &self,
        thetvdb_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError>;

    /// Fetches the season list of a show.
    async fn show_seasons(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteSeason>, MetadataRetrievalError>;

    /// Fetches the main cast of a show.
    async fn show_cast(&self, show_id: ShowId) -> Result<Vec<CastMember>, MetadataRetrievalError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_kind_from_tag() {
        assert_eq!(EpisodeKind::from_tag(Some("regular")), EpisodeKind::Regular);
        assert_eq!(
            EpisodeKind::from_tag(Some("significant_special")),
            EpisodeKind::SignificantSpecial
        );
        assert_eq!(
            EpisodeKind::from_tag(Some("insignificant_special")),
            EpisodeKind::InsignificantSpecial
        );
        assert_eq!(
            EpisodeKind::from_tag(Some("bonus")),
            EpisodeKind::Unknown("bonus".to_string())
        );
        assert_eq!(
            EpisodeKind::from_tag(None),
            EpisodeKind::Unknown(String::new())
        );
    }

    #[test]
    fn test_error_messages() {
        let messages: Vec<String> = [
            MetadataRetrievalError::RequestError("HTTP 503 Service Unavailable".to_string()),
            MetadataRetrievalError::ParseError("expected value".to_string()),
            MetadataRetrievalError::SeriesNotFound("169".to_string()),
            MetadataRetrievalError::RateLimited { attempts: 5 },
        ]
        .iter()
        .map(|error| match error {
            MetadataRetrievalError::RequestError(_)
            | MetadataRetrievalError::ParseError(_)
            | MetadataRetrievalError::SeriesNotFound(_)
            | MetadataRetrievalError::RateLimited { .. } => error.to_string(),
        })
        .collect();

        assert_eq!(
            messages,
            vec![
                "Request failed: HTTP 503 Service Unavailable",
                "Failed to parse API response: expected value",
                "Series not found: 169",
                "Rate limited by the catalog after 5 attempt(s)",
            ]
        );
    }

    #[test]
    fn test_is_special() {
        assert!(EpisodeKind::SignificantSpecial.is_special());
        assert!(EpisodeKind::InsignificantSpecial.is_special());
        assert!(!EpisodeKind::Regular.is_special());
        assert!(!EpisodeKind::Unknown("x".to_string()).is_special());
    }
}
