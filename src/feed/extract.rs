//! Heuristic post extraction from a rendered community page.
//!
//! Extraction runs against the final DOM serialized by the browser. It is pure
//! and synchronous so every markup variant can be covered by fixture tests.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::selectors::{AUTHORS, BODIES, COMMENT_LINKS, CONTAINERS, LINKS, TITLES};

/// Container text shorter than this is not trusted as a title.
pub const MIN_FALLBACK_TITLE_CHARS: usize = 10;

/// Container text used as a title is cut to this many characters.
pub const MAX_FALLBACK_TITLE_CHARS: usize = 100;

/// Raw fields recovered for one post, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPost {
    pub title: String,
    /// `href` as written in the page; may be relative.
    pub link: String,
    /// Empty when no author selector matched.
    pub author: String,
    pub body: Option<String>,
}

/// Which path produced the extracted posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionPath {
    /// A container selector matched; `matched` counts all of its matches.
    Containers {
        selector: &'static str,
        matched: usize,
    },
    /// No container matched; posts were built from comment-thread anchors.
    CommentAnchors { matched: usize },
    /// Neither containers nor comment-thread anchors were found.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub path: ExtractionPath,
    pub posts: Vec<ExtractedPost>,
}

/// Extract up to `limit` posts from rendered page HTML.
///
/// Containers come from the first container selector with any match. Only if
/// none matches does the comment-anchor path run. Candidates without a title
/// and without a link are dropped.
#[must_use]
pub fn extract_posts(html: &str, limit: usize) -> Extraction {
    let document = Html::parse_document(html);

    if let Some((selector, containers)) = CONTAINERS.first_non_empty(&document) {
        debug!(selector, matched = containers.len(), "Using container selector");
        let posts = containers
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(index, container)| {
                let candidate = extract_from_container(*container);
                if candidate.title.is_empty() && candidate.link.is_empty() {
                    debug!(index, "Skipping container without title or link");
                    None
                } else {
                    Some(candidate)
                }
            })
            .collect();

        return Extraction {
            path: ExtractionPath::Containers {
                selector,
                matched: containers.len(),
            },
            posts,
        };
    }

    let anchors: Vec<ElementRef<'_>> = document.select(&COMMENT_LINKS).collect();
    if anchors.is_empty() {
        debug!("No post containers or comment links found");
        return Extraction {
            path: ExtractionPath::Nothing,
            posts: Vec::new(),
        };
    }

    debug!(
        matched = anchors.len(),
        "No container selector matched, extracting from comment links"
    );
    let posts = anchors
        .iter()
        .take(limit)
        .filter_map(|anchor| {
            let title = text_content(*anchor);
            let link = anchor.value().attr("href").unwrap_or_default().trim();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            Some(ExtractedPost {
                title,
                link: link.to_string(),
                author: String::new(),
                body: None,
            })
        })
        .collect();

    Extraction {
        path: ExtractionPath::CommentAnchors {
            matched: anchors.len(),
        },
        posts,
    }
}

/// Run the per-field cascades inside one container.
#[must_use]
pub fn extract_from_container(container: ElementRef<'_>) -> ExtractedPost {
    let title = TITLES
        .first_match(container, non_empty_text)
        .map(|(_, title)| title)
        .or_else(|| fallback_title(container))
        .unwrap_or_default();

    let link = LINKS
        .first_match(container, |el| {
            el.value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string)
        })
        .map(|(_, href)| href)
        .unwrap_or_default();

    let author = AUTHORS
        .first_match(container, |el| {
            let text = text_content(el);
            let name = text.strip_prefix("u/").unwrap_or(&text).trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .map(|(_, author)| author)
        .unwrap_or_default();

    let body = BODIES
        .first_match(container, non_empty_text)
        .map(|(_, body)| body);

    ExtractedPost {
        title,
        link,
        author,
        body,
    }
}

/// The container's own text, whitespace-collapsed and truncated, when it is
/// long enough to be more than an icon label.
fn fallback_title(container: ElementRef<'_>) -> Option<String> {
    let collapsed = container
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if collapsed.chars().count() > MIN_FALLBACK_TITLE_CHARS {
        Some(collapsed.chars().take(MAX_FALLBACK_TITLE_CHARS).collect())
    } else {
        None
    }
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    let text = text_content(element);
    (!text.is_empty()).then_some(text)
}
