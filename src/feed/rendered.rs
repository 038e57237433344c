use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::extract::{extract_posts, ExtractionPath};
use super::{FeedQuery, Post, PostSource, RetrievalError};

/// Produces the final DOM of a page after client-side rendering.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return the serialized rendered document.
    ///
    /// Implementations own any browser resources they acquire and must release
    /// them before returning, on success and on failure.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalError`] if the page cannot be rendered.
    async fn render(&self, url: &str) -> Result<String, RetrievalError>;
}

/// Fallback strategy: render the community page and extract posts from the DOM.
pub struct RenderedPageSource<R> {
    renderer: R,
    origin: String,
}

impl<R: PageRenderer> RenderedPageSource<R> {
    #[must_use]
    pub fn new(renderer: R, origin: impl Into<String>) -> Self {
        Self {
            renderer,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn page_url(&self, query: &FeedQuery) -> String {
        match query.after.as_deref() {
            Some(after) => format!(
                "{}{}?after={}",
                self.origin,
                query.page_path(),
                url::form_urlencoded::byte_serialize(after.as_bytes()).collect::<String>()
            ),
            None => format!("{}{}", self.origin, query.page_path()),
        }
    }
}

#[async_trait]
impl<R: PageRenderer> PostSource for RenderedPageSource<R> {
    fn name(&self) -> &'static str {
        "rendered-page"
    }

    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<Post>, RetrievalError> {
        let url = self.page_url(query);
        info!(url = %url, "Rendering community page");

        let html = self.renderer.render(&url).await?;
        debug!(bytes = html.len(), "Rendered page received");

        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let extraction = extract_posts(&html, limit);
        let extracted_at = Utc::now();
        let page_link = format!("{}{}", self.origin, query.page_path());

        let posts: Vec<Post> = extraction
            .posts
            .iter()
            .map(|raw| Post::from_extracted(raw, &self.origin, &page_link, extracted_at))
            .filter(Post::is_usable)
            .collect();

        match extraction.path {
            ExtractionPath::Containers { selector, matched } => {
                debug!(selector, matched, extracted = posts.len(), "Extracted posts from containers");
            }
            ExtractionPath::CommentAnchors { matched } => {
                debug!(matched, extracted = posts.len(), "Extracted posts from comment links");
            }
            ExtractionPath::Nothing => {
                info!(url = %url, "Rendered page contained no recognizable posts");
            }
        }

        Ok(posts)
    }
}
