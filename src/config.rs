//! Resolver configuration
//!
//! All knobs live in one plain struct that is handed to the components that
//! need it. Nothing reads environment or global state on its own.

use crate::metadata_retrieval::RetryPolicy;
use std::time::Duration;

/// Public TVMaze API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

/// Episode lists are refetched at the latest this long after being cached
pub const DEFAULT_ABSOLUTE_TTL: Duration = Duration::from_secs(15 * 60);

/// Episode lists are dropped when not read for this long
pub const DEFAULT_SLIDING_TTL: Duration = Duration::from_secs(2 * 60);

/// Configuration for the catalog client and the episode list cache
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Base URL of the TVMaze API
    pub base_url: String,
    /// User agent sent with every catalog request
    pub user_agent: String,
    /// Absolute lifetime of a cached episode list, measured from creation
    pub absolute_ttl: Duration,
    /// Sliding lifetime of a cached episode list, measured from last access
    pub sliding_ttl: Duration,
    /// Retry behavior for rate-limited catalog requests
    pub retry: RetryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            absolute_ttl: DEFAULT_ABSOLUTE_TTL,
            sliding_ttl: DEFAULT_SLIDING_TTL,
            retry: RetryPolicy::default(),
        }
    }
}
