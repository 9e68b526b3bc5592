//! Episode list cache
//!
//! This module keeps the full episode list of recently resolved shows in
//! memory, so that resolving every file of a season costs one catalog
//! request instead of one per file. Entries expire on an absolute lifetime
//! measured from creation or a sliding lifetime measured from the last read,
//! whichever comes first. Expired entries are dropped lazily on access.

use crate::config::{DEFAULT_ABSOLUTE_TTL, DEFAULT_SLIDING_TTL};
use crate::metadata_retrieval::{RemoteEpisode, ShowId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of the current time for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// One cached episode list and its bookkeeping timestamps
#[derive(Debug)]
struct CachedEpisodeList {
    episodes: Arc<[RemoteEpisode]>,
    created: Instant,
    last_access: Instant,
}

impl CachedEpisodeList {
    fn is_expired(&self, now: Instant, absolute_ttl: Duration, sliding_ttl: Duration) -> bool {
        now.duration_since(self.created) >= absolute_ttl
            || now.duration_since(self.last_access) >= sliding_ttl
    }
}

/// Time-bounded memoization of "all episodes of a show" lookups
///
/// At most one entry exists per show id. The lock is only held for map
/// operations, never while a fetch is in flight, so two cold requests for the
/// same show may both fetch. The later one simply replaces the earlier entry.
pub struct EpisodeListCache {
    entries: Mutex<HashMap<ShowId, CachedEpisodeList>>,
    clock: Arc<dyn Clock>,
    absolute_ttl: Duration,
    sliding_ttl: Duration,
}

impl Default for EpisodeListCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_ABSOLUTE_TTL, DEFAULT_SLIDING_TTL)
    }
}

impl EpisodeListCache {
    /// Creates an empty cache using the given clock and lifetimes
    pub fn new(clock: Arc<dyn Clock>, absolute_ttl: Duration, sliding_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            absolute_ttl,
            sliding_ttl,
        }
    }

    /// Returns the episode list of a show, fetching it on a miss
    ///
    /// A live entry is returned as the very same shared list and its sliding
    /// lifetime is refreshed; `fetch` is not called. On a miss or after expiry
    /// `fetch(show_id)` is awaited and its result cached, and expired entries
    /// of other shows are dropped along the way. Fetch errors are
    /// returned unchanged and nothing is cached for them. Dropping the
    /// returned future before the fetch completes caches nothing either.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let episodes = cache
    ///     .get_episodes(169, |id| catalog.show_episodes(id))
    ///     .await?;
    /// ```
    pub async fn get_episodes<F, Fut, E>(
        &self,
        show_id: ShowId,
        fetch: F,
    ) -> Result<Arc<[RemoteEpisode]>, E>
    where
        F: FnOnce(ShowId) -> Fut,
        Fut: Future<Output = Result<Vec<RemoteEpisode>, E>>,
    {
        if let Some(episodes) = self.lookup(show_id) {
            debug!(show_id, "Episode list cache hit");
            return Ok(episodes);
        }

        debug!(show_id, "Episode list cache miss");
        let episodes: Arc<[RemoteEpisode]> = fetch(show_id).await?.into();

        let now = self.clock.now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now, self.absolute_ttl, self.sliding_ttl));
        entries.insert(
            show_id,
            CachedEpisodeList {
                episodes: Arc::clone(&episodes),
                created: now,
                last_access: now,
            },
        );

        Ok(episodes)
    }

    /// Returns true if a live entry exists for the show, without touching it
    pub fn is_cached(&self, show_id: ShowId) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(&show_id)
            .is_some_and(|entry| !entry.is_expired(now, self.absolute_ttl, self.sliding_ttl))
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Looks up a live entry, refreshing its last access or evicting it
    fn lookup(&self, show_id: ShowId) -> Option<Arc<[RemoteEpisode]>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = entries
            .get(&show_id)?
            .is_expired(now, self.absolute_ttl, self.sliding_ttl);

        if expired {
            debug!(show_id, "Evicting expired episode list");
            entries.remove(&show_id);
            return None;
        }

        let entry = entries.get_mut(&show_id)?;
        entry.last_access = now;
        Some(Arc::clone(&entry.episodes))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    /// Clock that only moves when told to
    pub(crate) struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.now.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }
}
