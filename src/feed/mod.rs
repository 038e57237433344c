//! Post retrieval pipeline.
//!
//! Posts are fetched from a community's structured listing first and, when that
//! fails for any reason, extracted from the rendered community page instead.
//! Both paths produce the same [`Post`] shape.

mod chain;
pub mod extract;
mod listing;
mod post;
mod rendered;
pub mod selectors;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use chain::FallbackChain;
pub use listing::{ListingChild, ListingPost, ListingResponse, ListingSource};
pub use post::{resolve_link, Post, DEFAULT_TITLE, UNTITLED_EXTRACTED};
pub use rendered::{PageRenderer, RenderedPageSource};

/// Failure to produce posts from a retrieval strategy.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("feed request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid listing response: {0}")]
    InvalidListing(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
}

/// Upstream ranking keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    Best,
    Hot,
    New,
    Top,
    Rising,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::Best,
        SortMode::Hot,
        SortMode::New,
        SortMode::Top,
        SortMode::Rising,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Best => "best",
            SortMode::Hot => "hot",
            SortMode::New => "new",
            SortMode::Top => "top",
            SortMode::Rising => "rising",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort '{0}', expected one of best, hot, new, top, rising")]
pub struct UnknownSort(pub String);

impl FromStr for SortMode {
    type Err = UnknownSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == lowered)
            .ok_or_else(|| UnknownSort(s.to_string()))
    }
}

/// Everything needed to fetch one page of a community listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedQuery {
    /// Community name without the `r/` marker.
    pub community: String,
    pub sort: SortMode,
    /// Page size, always at least 1.
    pub limit: u32,
    /// Opaque pagination cursor from a previous listing.
    pub after: Option<String>,
}

impl FeedQuery {
    #[must_use]
    pub fn new(community: &str, sort: SortMode, limit: u32, after: Option<String>) -> Self {
        Self {
            community: normalize_community(community),
            sort,
            limit: limit.max(1),
            after: after.filter(|a| !a.is_empty()),
        }
    }

    /// Path of the community page for this sort, e.g. `/r/startups/hot`.
    #[must_use]
    pub fn page_path(&self) -> String {
        format!("/r/{}/{}", self.community, self.sort)
    }
}

/// Strip surrounding whitespace, slashes and a leading `r/` marker.
#[must_use]
pub fn normalize_community(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    let stripped = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("R/"))
        .unwrap_or(trimmed);
    stripped.trim_matches('/').to_string()
}

/// A strategy that can turn a [`FeedQuery`] into posts.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch one page of posts.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalError`] when this strategy cannot produce results.
    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<Post>, RetrievalError>;
}
