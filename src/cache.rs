//! In-memory cache for fetched community pages.
//!
//! Entries are keyed by the full [`FeedQuery`] and expire after a fixed
//! staleness threshold. The retrieval pipeline never touches the cache; callers
//! consult it around a fetch.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::feed::{FeedQuery, Post};

/// Whether an entry of the given age is past the threshold.
#[must_use]
pub fn is_stale(age: Duration, ttl: Duration) -> bool {
    age >= ttl
}

#[derive(Debug, Clone)]
struct CachedFeed {
    posts: Vec<Post>,
    fetched_at: Instant,
}

/// Keyed store of recent feed results with a staleness threshold.
pub struct FeedCache {
    entries: RwLock<HashMap<FeedQuery, CachedFeed>>,
    ttl: Duration,
}

impl FeedCache {
    /// Create a cache whose entries go stale after `ttl`. A zero TTL disables it.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh posts for `query`, if any.
    #[must_use]
    pub fn get(&self, query: &FeedQuery) -> Option<Vec<Post>> {
        self.get_at(query, Instant::now())
    }

    fn get_at(&self, query: &FeedQuery, now: Instant) -> Option<Vec<Post>> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&cache_key(query))
            .filter(|entry| !is_stale(now.saturating_duration_since(entry.fetched_at), self.ttl))
            .map(|entry| entry.posts.clone())
    }

    /// Store posts for `query`. Empty results are not cached.
    pub fn insert(&self, query: &FeedQuery, posts: &[Post]) {
        self.insert_at(query, posts, Instant::now());
    }

    fn insert_at(&self, query: &FeedQuery, posts: &[Post], now: Instant) {
        if !self.is_enabled() || posts.is_empty() {
            return;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| !is_stale(now.saturating_duration_since(entry.fetched_at), self.ttl));
        entries.insert(
            cache_key(query),
            CachedFeed {
                posts: posts.to_vec(),
                fetched_at: now,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300)) // 5 minute TTL
    }
}

/// Community names are case-insensitive upstream.
fn cache_key(query: &FeedQuery) -> FeedQuery {
    FeedQuery {
        community: query.community.to_ascii_lowercase(),
        ..query.clone()
    }
}
