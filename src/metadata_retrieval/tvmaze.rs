//! TVMaze catalog client implementation.

use super::retry::RetryPolicy;
use super::tvmaze_types::{
    TvMazeCastMember, TvMazeEpisode, TvMazeSearchResult, TvMazeSeason, TvMazeShow,
};
use super::{
    CastMember, Catalog, MetadataRetrievalError, RemoteEpisode, RemoteSeason, RemoteShow, ShowId,
    ShowSearchResult,
};
use crate::config::ResolverConfig;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Catalog client for the TVMaze API.
///
/// This client fetches show, season, episode and cast information from
/// https://api.tvmaze.com. The API needs no authentication but rate limits
/// clients, which the configured `RetryPolicy` absorbs.
pub struct TvMazeClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TvMazeClient {
    /// Creates a new TVMaze client with the default configuration.
    pub fn new() -> Result<Self, MetadataRetrievalError> {
        Self::with_config(&ResolverConfig::default())
    }

    /// Creates a TVMaze client using the base URL, user agent and retry
    /// policy of the given configuration.
    pub fn with_config(config: &ResolverConfig) -> Result<Self, MetadataRetrievalError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
        })
    }

    /// Performs a GET request and parses the JSON body.
    ///
    /// Returns `Ok(None)` when the catalog answers 404. Rate-limited requests
    /// are repeated according to the retry policy.
    async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, MetadataRetrievalError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut backoff = self.retry.to_backoff();
        let mut attempt = 1;

        loop {
            debug!(url = %url, attempt, "Requesting TVMaze");

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = self
                    .retry
                    .allows_retry_after(attempt)
                    .then(|| backoff.next_backoff())
                    .flatten();
                let Some(delay) = delay else {
                    return Err(MetadataRetrievalError::RateLimited { attempts: attempt });
                };
                warn!(url = %url, attempt, ?delay, "Rate limited by TVMaze, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            // Ensure request was successful
            if !status.is_success() {
                return Err(MetadataRetrievalError::RequestError(format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )));
            }

            let body = response
                .json()
                .await
                .map_err(|e| MetadataRetrievalError::ParseError(e.to_string()))?;

            return Ok(Some(body));
        }
    }

    async fn lookup(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        let show: Option<TvMazeShow> = self.get_json("/lookup/shows", &[(key, value)]).await?;
        Ok(show.map(Into::into))
    }
}

#[async_trait]
impl Catalog for TvMazeClient {
    async fn show_episodes(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteEpisode>, MetadataRetrievalError> {
        let episodes: Vec<TvMazeEpisode> = self
            .get_json(&format!("/shows/{show_id}/episodes"), &[("specials", "1")])
            .await?
            .ok_or_else(|| MetadataRetrievalError::SeriesNotFound(show_id.to_string()))?;

        debug!(show_id, count = episodes.len(), "Fetched episode list");
        Ok(episodes.into_iter().map(Into::into).collect())
    }

    async fn search_shows(
        &self,
        name: &str,
    ) -> Result<Vec<ShowSearchResult>, MetadataRetrievalError> {
        let results: Vec<TvMazeSearchResult> = self
            .get_json("/search/shows", &[("q", name)])
            .await?
            .unwrap_or_default();

        debug!(query = name, count = results.len(), "Searched shows");
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn show(&self, show_id: ShowId) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        let show: Option<TvMazeShow> = self.get_json(&format!("/shows/{show_id}"), &[]).await?;
        Ok(show.map(Into::into))
    }

    async fn lookup_by_imdb(
        &self,
        imdb_id: &str,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.lookup("imdb", imdb_id).await
    }

    async fn lookup_by_tvrage(
        &self,
        tvrage_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.lookup("tvrage", &tvrage_id.to_string()).await
    }

    async fn lookup_by_thetvdb(
        &self,
        thetvdb_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.lookup("thetvdb", &thetvdb_id.to_string()).await
    }

    async fn show_seasons(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteSeason>, MetadataRetrievalError> {
        let seasons: Vec<TvMazeSeason> = self
            .get_json(&format!("/shows/{show_id}/seasons"), &[])
            .await?
            .unwrap_or_default();
        Ok(seasons.into_iter().map(Into::into).collect())
    }

    async fn show_cast(&self, show_id: ShowId) -> Result<Vec<CastMember>, MetadataRetrievalError> {
        let cast: Vec<TvMazeCastMember> = self
            .get_json(&format!("/shows/{show_id}/cast"), &[])
            .await?
            .unwrap_or_default();
        Ok(cast.into_iter().map(Into::into).collect())
    }
}
