//! Cached catalog implementation
//!
//! This module provides a caching wrapper for catalog clients that serves
//! episode lists from an in-memory `EpisodeListCache`. All other requests
//! are passed straight through.

use super::{
    CastMember, Catalog, MetadataRetrievalError, RemoteEpisode, RemoteSeason, RemoteShow, ShowId,
    ShowSearchResult,
};
use crate::cache::EpisodeListCache;
use async_trait::async_trait;
use std::sync::Arc;

/// A caching wrapper for catalog clients
///
/// Resolving many files of the same show repeatedly needs the show's full
/// episode list. This wrapper makes those lookups cheap for as long as the
/// cache keeps the list alive.
pub struct CachedCatalog<C>
where
    C: Catalog,
{
    /// The underlying catalog client
    catalog: C,
    /// Cache for full episode lists
    cache: EpisodeListCache,
}

impl<C> CachedCatalog<C>
where
    C: Catalog,
{
    /// Creates a new cached catalog wrapping the given client
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let tvmaze = TvMazeClient::new()?;
    /// let cached = CachedCatalog::new(tvmaze, EpisodeListCache::default());
    /// ```
    pub fn new(catalog: C, cache: EpisodeListCache) -> Self {
        Self { catalog, cache }
    }

    /// Returns the shared, cached episode list of a show
    pub async fn episode_list(
        &self,
        show_id: ShowId,
    ) -> Result<Arc<[RemoteEpisode]>, MetadataRetrievalError> {
        self.cache
            .get_episodes(show_id, |id| self.catalog.show_episodes(id))
            .await
    }

    /// Gives access to the episode list cache
    pub fn cache(&self) -> &EpisodeListCache {
        &self.cache
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &C {
        &self.catalog
    }
}

#[async_trait]
impl<C> Catalog for CachedCatalog<C>
where
    C: Catalog,
{
    async fn show_episodes(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteEpisode>, MetadataRetrievalError> {
        Ok(self.episode_list(show_id).await?.to_vec())
    }

    async fn search_shows(
        &self,
        name: &str,
    ) -> Result<Vec<ShowSearchResult>, MetadataRetrievalError> {
        self.catalog.search_shows(name).await
    }

    async fn show(&self, show_id: ShowId) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.catalog.show(show_id).await
    }

    async fn lookup_by_imdb(
        &self,
        imdb_id: &str,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.catalog.lookup_by_imdb(imdb_id).await
    }

    async fn lookup_by_tvrage(
        &self,
        tvrage_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.catalog.lookup_by_tvrage(tvrage_id).await
    }

    async fn lookup_by_thetvdb(
        &self,
        thetvdb_id: u32,
    ) -> Result<Option<RemoteShow>, MetadataRetrievalError> {
        self.catalog.lookup_by_thetvdb(thetvdb_id).await
    }

    async fn show_seasons(
        &self,
        show_id: ShowId,
    ) -> Result<Vec<RemoteSeason>, MetadataRetrievalError> {
        self.catalog.show_seasons(show_id).await
    }

    async fn show_cast(&self, show_id: ShowId) -> Result<Vec<CastMember>, MetadataRetrievalError> {
        self.catalog.show_cast(show_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::testing::{FakeCatalog, regular};

    #[tokio::test]
    async fn test_episode_lists_are_fetched_once() {
        let catalog = FakeCatalog::with_episodes(7, vec![regular(1, 1, 1, "Pilot")]);
        let cached = CachedCatalog::new(catalog, EpisodeListCache::default());

        let first = cached.episode_list(7).await.unwrap();
        let second = cached.show_episodes(7).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second[0].name, "Pilot");
        assert_eq!(cached.catalog.episode_fetches(), 1);
    }

    #[tokio::test]
    async fn test_missing_show_is_not_cached() {
        let cached = CachedCatalog::new(FakeCatalog::default(), EpisodeListCache::default());

        assert!(matches!(
            cached.episode_list(7).await,
            Err(MetadataRetrievalError::SeriesNotFound(_))
        ));
        assert!(!cached.cache().is_cached(7));
    }
}
