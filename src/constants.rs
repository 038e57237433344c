//! Shared constants used across the application.

/// User agent string sent by both retrieval strategies.
///
/// The community feed rejects requests without a browser-like identity, and the
/// rendered-page fallback should look like a normal desktop browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default origin for community pages and post permalinks.
pub const REDDIT_ORIGIN: &str = "https://www.reddit.com";

/// Author value used when the real author cannot be recovered.
pub const UNKNOWN_AUTHOR: &str = "Unknown";
