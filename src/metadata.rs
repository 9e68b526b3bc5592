//! Host-facing metadata providers
//!
//! This module maps catalog records into the shapes a media library stores
//! for series, seasons and episodes. Items are linked to the catalog through
//! a map of provider ids (`TvMaze`, `Imdb`, `TvRage`, `Tvdb`).

use crate::matcher::{LocalEpisodeSignal, identify};
use crate::metadata_retrieval::{CachedCatalog, Catalog, RemoteShow, ShowId, ShowSearchResult};
use crate::resolver::{EpisodeResolver, ResolveError, Resolution, cancellable};
use crate::text::{parse_date, strip_markup};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Provider id key of TVMaze ids
pub const TVMAZE_PROVIDER: &str = "TvMaze";
/// Provider id key of IMDb ids
pub const IMDB_PROVIDER: &str = "Imdb";
/// Provider id key of TVRage ids
pub const TVRAGE_PROVIDER: &str = "TvRage";
/// Provider id key of TheTVDB ids
pub const TVDB_PROVIDER: &str = "Tvdb";

/// External ids of a library item, keyed by provider
pub type ProviderIds = HashMap<String, String>;

static TRAILING_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.*?)\s*\((?P<year>[0-9]{4})\)\s*$").expect("static regex is valid")
});

/// Reads the TVMaze id from a provider id map
///
/// Missing, empty and non-numeric ids all yield `None`.
pub fn tvmaze_id(provider_ids: &ProviderIds) -> Option<ShowId> {
    numeric_id(provider_ids, TVMAZE_PROVIDER)
}

fn numeric_id(provider_ids: &ProviderIds, provider: &str) -> Option<u32> {
    let value = provider_ids.get(provider)?.trim();
    if value.is_empty() {
        return None;
    }

    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(provider, value, "Ignoring invalid provider id");
            None
        }
    }
}

/// Splits a folder-style series name like `Doctor Who (2005)` into name and year
pub fn parse_series_name(name: &str) -> (String, Option<i32>) {
    let name = name.trim();
    match TRAILING_YEAR.captures(name) {
        Some(captures) => (
            captures["name"].to_string(),
            captures["year"].parse().ok(),
        ),
        None => (name.to_string(), None),
    }
}

/// The kinds of library items that link to catalog pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Series,
    Season,
    Episode,
}

/// Builds the catalog web page URL of an item
pub fn external_url(kind: ItemKind, tvmaze_id: &str) -> String {
    match kind {
        ItemKind::Series => format!("https://www.tvmaze.com/shows/{tvmaze_id}"),
        ItemKind::Season => format!("https://www.tvmaze.com/seasons/{tvmaze_id}/season"),
        ItemKind::Episode => format!("https://www.tvmaze.com/episodes/{tvmaze_id}"),
    }
}

/// What the library knows about a series folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesInfo {
    /// Name as found locally, possibly with a trailing `(year)`
    pub name: String,
    /// Premiere year, if known
    pub year: Option<i32>,
    pub provider_ids: ProviderIds,
}

/// Airing status of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStatus {
    Continuing,
    Ended,
}

/// A cast member as stored with the series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInfo {
    pub tvmaze_id: u32,
    pub name: String,
    /// Character played
    pub role: String,
    pub image_url: Option<String>,
}

/// Series metadata, ready to be stored by the host
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMetadata {
    pub name: String,
    pub genres: Vec<String>,
    /// Network name, with its country code when known
    pub studios: Vec<String>,
    pub premiere_date: Option<NaiveDate>,
    pub production_year: Option<i32>,
    pub community_rating: Option<f32>,
    pub runtime: Option<Duration>,
    pub status: Option<SeriesStatus>,
    pub overview: Option<String>,
    pub home_page_url: Option<String>,
    pub provider_ids: ProviderIds,
    pub people: Vec<PersonInfo>,
}

/// A candidate series offered to the user when identifying manually
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSearchResult {
    pub name: String,
    pub premiere_date: Option<NaiveDate>,
    pub production_year: Option<i32>,
    pub image_url: Option<String>,
    pub provider_ids: ProviderIds,
}

/// Season metadata, ready to be stored by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonMetadata {
    pub tvmaze_id: u32,
    pub name: Option<String>,
    pub season_number: u32,
    pub premiere_date: Option<NaiveDate>,
    pub production_year: Option<i32>,
}

/// Metadata provider for series, seasons and episodes backed by a catalog
pub struct MetadataService<C>
where
    C: Catalog,
{
    catalog: Arc<CachedCatalog<C>>,
    resolver: EpisodeResolver<C>,
}

impl<C> MetadataService<C>
where
    C: Catalog,
{
    /// Creates a service sharing the given cached catalog with its resolver
    pub fn new(catalog: Arc<CachedCatalog<C>>) -> Self {
        let resolver = EpisodeResolver::new(Arc::clone(&catalog));
        Self { catalog, resolver }
    }

    /// Resolves a local episode file, see [`EpisodeResolver::resolve`]
    pub async fn episode_metadata(
        &self,
        signal: &LocalEpisodeSignal,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(signal, cancel).await
    }

    /// Finds a series in the catalog and maps its metadata and cast
    ///
    /// The show is looked up by TVMaze id first, then by IMDb, TVRage and
    /// TheTVDB id, and finally by searching for the parsed local name.
    /// Returns `None` when every lookup comes up empty.
    pub async fn series_metadata(
        &self,
        info: &SeriesInfo,
        cancel: &CancellationToken,
    ) -> Result<Option<SeriesMetadata>, ResolveError> {
        debug!(series = %info.name, "Fetching series metadata");

        let Some(show) = self.find_show(info, cancel).await? else {
            debug!(series = %info.name, "No TVMaze result found");
            return Ok(None);
        };

        let cast = cancellable(cancel, self.catalog.show_cast(show.id)).await?;
        let people = cast
            .into_iter()
            .map(|member| PersonInfo {
                tvmaze_id: member.person_id,
                name: member.person_name,
                role: member.character_name,
                image_url: member
                    .person_image
                    .and_then(|image| image.original.or(image.medium)),
            })
            .collect();

        let premiere_date = show.premiered.as_deref().and_then(parse_date);

        Ok(Some(SeriesMetadata {
            name: show.name.clone(),
            genres: show.genres.clone(),
            studios: studios(&show),
            premiere_date,
            production_year: premiere_date.map(|date| date.year()),
            community_rating: show.rating.map(|rating| rating as f32),
            runtime: show
                .runtime
                .map(|minutes| Duration::from_secs(u64::from(minutes) * 60)),
            status: series_status(show.status.as_deref()),
            overview: show.summary.as_deref().map(strip_markup),
            home_page_url: show.url.clone(),
            provider_ids: show_provider_ids(&show),
            people,
        }))
    }

    /// Searches the catalog by name and maps every hit
    pub async fn series_search_results(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SeriesSearchResult>, ResolveError> {
        let results = cancellable(cancel, self.catalog.search_shows(name.trim())).await?;
        debug!(query = name, count = results.len(), "Series search results");

        Ok(results
            .into_iter()
            .map(|ShowSearchResult { show, .. }| {
                let premiere_date = show.premiered.as_deref().and_then(parse_date);
                SeriesSearchResult {
                    name: show.name.clone(),
                    premiere_date,
                    production_year: premiere_date.map(|date| date.year()),
                    image_url: show.image.as_ref().and_then(|image| image.original.clone()),
                    provider_ids: show_provider_ids(&show),
                }
            })
            .collect())
    }

    /// Maps one season of a series
    ///
    /// Needs the series' TVMaze id and a season number; returns `None`
    /// without them or when the catalog has no such season.
    pub async fn season_metadata(
        &self,
        series_provider_ids: &ProviderIds,
        season_number: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Option<SeasonMetadata>, ResolveError> {
        let (Some(show_id), Some(season_number)) = (tvmaze_id(series_provider_ids), season_number)
        else {
            return Ok(None);
        };

        let seasons = cancellable(cancel, self.catalog.show_seasons(show_id)).await?;

        Ok(seasons
            .into_iter()
            .find(|season| season.number == Some(season_number))
            .map(|season| {
                let premiere_date = season.premiere_date.as_deref().and_then(parse_date);
                SeasonMetadata {
                    tvmaze_id: season.id,
                    name: season.name,
                    season_number,
                    premiere_date,
                    production_year: premiere_date.map(|date| date.year()),
                }
            }))
    }

    async fn find_show(
        &self,
        info: &SeriesInfo,
        cancel: &CancellationToken,
    ) -> Result<Option<RemoteShow>, ResolveError> {
        let ids = &info.provider_ids;

        if let Some(id) = tvmaze_id(ids) {
            if let Some(show) = cancellable(cancel, self.catalog.show(id)).await? {
                return Ok(Some(show));
            }
        }

        if let Some(imdb_id) = ids.get(IMDB_PROVIDER).filter(|id| !id.is_empty()) {
            if let Some(show) = cancellable(cancel, self.catalog.lookup_by_imdb(imdb_id)).await? {
                return Ok(Some(show));
            }
        }

        if let Some(id) = numeric_id(ids, TVRAGE_PROVIDER) {
            if let Some(show) = cancellable(cancel, self.catalog.lookup_by_tvrage(id)).await? {
                return Ok(Some(show));
            }
        }

        if let Some(id) = numeric_id(ids, TVDB_PROVIDER) {
            if let Some(show) = cancellable(cancel, self.catalog.lookup_by_thetvdb(id)).await? {
                return Ok(Some(show));
            }
        }

        let (name, parsed_year) = parse_series_name(&info.name);
        debug!(series = %name, year = ?parsed_year, "No TVMaze id, searching by parsed name");

        let results = cancellable(cancel, self.catalog.search_shows(&name)).await?;
        Ok(identify(&results, &name, parsed_year.or(info.year)).map(|result| result.show.clone()))
    }
}

fn studios(show: &RemoteShow) -> Vec<String> {
    let Some(network) = show.network.as_ref().filter(|n| !n.name.trim().is_empty()) else {
        return Vec::new();
    };

    match network.country_code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => vec![format!("{} ({})", network.name, code)],
        None => vec![network.name.clone()],
    }
}

fn series_status(status: Option<&str>) -> Option<SeriesStatus> {
    match status {
        Some(s) if s.eq_ignore_ascii_case("running") => Some(SeriesStatus::Continuing),
        Some(s) if s.eq_ignore_ascii_case("ended") => Some(SeriesStatus::Ended),
        _ => None,
    }
}

fn show_provider_ids(show: &RemoteShow) -> ProviderIds {
    let mut ids = ProviderIds::new();
    ids.insert(TVMAZE_PROVIDER.to_string(), show.id.to_string());

    if let Some(imdb) = show.externals.imdb.as_ref().filter(|id| !id.is_empty()) {
        ids.insert(IMDB_PROVIDER.to_string(), imdb.clone());
    }
    if let Some(tvrage) = show.externals.tvrage {
        ids.insert(TVRAGE_PROVIDER.to_string(), tvrage.to_string());
    }
    if let Some(thetvdb) = show.externals.thetvdb {
        ids.insert(TVDB_PROVIDER.to_string(), thetvdb.to_string());
    }

    ids
}
