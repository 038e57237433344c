use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::extract::ExtractedPost;
use super::listing::ListingPost;
use crate::constants::UNKNOWN_AUTHOR;

/// Title used when a listing entry has no title.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Title used when a rendered post had a link but no recoverable title.
pub const UNTITLED_EXTRACTED: &str = "Untitled Post";

/// Canonical post record produced by every retrieval strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    /// Absolute URL. A rendered post that exposed no link of its own points at
    /// the community page it was extracted from.
    pub link: String,
    pub author: String,
    pub score: i64,
    pub comments: i64,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Post {
    /// Normalize a structured listing entry.
    ///
    /// Pure: the same entry and origin always yield the same record.
    #[must_use]
    pub fn from_listing(raw: &ListingPost, origin: &str) -> Self {
        let link = match raw.url.as_deref().map(str::trim) {
            Some(url) if url.starts_with("http") => url.to_string(),
            _ => resolve_link(origin, raw.permalink.as_deref().unwrap_or_default()),
        };

        Self {
            title: non_empty(raw.title.as_deref()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            link,
            author: non_empty(raw.author.as_deref())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            score: raw.score.unwrap_or(0),
            comments: raw.num_comments.unwrap_or(0),
            timestamp: epoch_to_iso(raw.created_utc.unwrap_or(0.0)),
            thumbnail: raw.thumbnail.as_deref().and_then(thumbnail_url),
            body: non_empty(raw.selftext.as_deref()),
        }
    }

    /// Normalize a post extracted from a rendered page.
    ///
    /// Score and comment counts are not exposed reliably by the markup and are
    /// left at zero; the timestamp is the extraction time.
    #[must_use]
    pub fn from_extracted(
        raw: &ExtractedPost,
        origin: &str,
        page_url: &str,
        extracted_at: DateTime<Utc>,
    ) -> Self {
        let link = if raw.link.trim().is_empty() {
            page_url.to_string()
        } else {
            resolve_link(origin, raw.link.trim())
        };

        Self {
            title: non_empty(Some(&raw.title)).unwrap_or_else(|| UNTITLED_EXTRACTED.to_string()),
            link,
            author: non_empty(Some(&raw.author)).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            score: 0,
            comments: 0,
            timestamp: extracted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            thumbnail: None,
            body: raw.body.as_deref().and_then(|b| non_empty(Some(b))),
        }
    }

    /// Whether the record carries a usable title or link.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() || !self.link.trim().is_empty()
    }
}

/// Resolve a possibly-relative link against the community origin.
#[must_use]
pub fn resolve_link(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match Url::parse(origin).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            href.trim_start_matches('/')
        ),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Listing thumbnails use keywords such as `self`, `default`, `nsfw` or
/// `spoiler` in place of an image URL.
fn thumbnail_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        None
    }
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_to_iso(epoch_secs: f64) -> String {
    let millis = (epoch_secs * 1000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
