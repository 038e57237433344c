use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info};

use super::{FeedQuery, Post, PostSource, RetrievalError};
use crate::constants::BROWSER_USER_AGENT;

/// Top-level listing document returned by `/r/{community}/{sort}.json`.
#[derive(Debug, Deserialize)]
pub struct ListingResponse {
    pub data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    pub children: Option<Vec<ListingChild>>,
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingChild {
    pub data: ListingPost,
}

/// The subset of a listing entry that maps onto a [`Post`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPost {
    pub title: Option<String>,
    pub url: Option<String>,
    pub permalink: Option<String>,
    pub author: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_utc: Option<f64>,
    pub thumbnail: Option<String>,
    pub selftext: Option<String>,
}

/// Primary strategy: the community's structured JSON listing.
pub struct ListingSource {
    client: reqwest::Client,
    origin: String,
}

impl ListingSource {
    #[must_use]
    pub fn new(client: reqwest::Client, origin: impl Into<String>) -> Self {
        Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn listing_url(&self, query: &FeedQuery) -> String {
        format!("{}{}.json", self.origin, query.page_path())
    }
}

#[async_trait]
impl PostSource for ListingSource {
    fn name(&self) -> &'static str {
        "listing"
    }

    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<Post>, RetrievalError> {
        let url = self.listing_url(query);
        let limit = query.limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("limit", &limit)];
        if let Some(after) = query.after.as_deref() {
            params.push(("after", after));
        }

        info!(url = %url, limit = query.limit, after = ?query.after, "Fetching community listing");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let listing: ListingResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidListing(format!("undecodable body: {e}")))?;

        let data = listing
            .data
            .ok_or_else(|| RetrievalError::InvalidListing("missing 'data' object".to_string()))?;
        let children = data.children.ok_or_else(|| {
            RetrievalError::InvalidListing("missing 'data.children' collection".to_string())
        })?;

        let posts: Vec<Post> = children
            .iter()
            .map(|child| Post::from_listing(&child.data, &self.origin))
            .collect();

        debug!(count = posts.len(), next = ?data.after, "Listing parsed");
        Ok(posts)
    }
}
