//! Ordered CSS selector cascades for rendered community pages.
//!
//! The host site has shipped several markup generations (old, redesign,
//! web-components) and rendered pages can be any of them. Each cascade lists
//! the selectors to try in priority order; evaluation stops at the first one
//! whose match satisfies the caller's extractor.
//!
//! When extraction starts failing, capture a rendered page, add the new
//! selector at the right position, and add a fixture test in `extract`.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// An ordered list of selectors evaluated with short-circuiting.
pub struct SelectorCascade {
    name: &'static str,
    entries: Vec<(&'static str, Selector)>,
}

impl SelectorCascade {
    /// Build a cascade from CSS selector strings.
    ///
    /// # Panics
    ///
    /// Panics if any selector is not valid CSS. All cascades are built from
    /// literals and covered by tests.
    #[must_use]
    pub fn new(name: &'static str, selectors: &[&'static str]) -> Self {
        let entries = selectors
            .iter()
            .map(|css| {
                let parsed = Selector::parse(css)
                    .unwrap_or_else(|e| panic!("invalid {name} selector {css:?}: {e:?}"));
                (*css, parsed)
            })
            .collect();
        Self { name, entries }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Selector strings in evaluation order.
    pub fn selectors(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(css, _)| *css)
    }

    /// First selector with at least one match anywhere in the document,
    /// together with all of its matches in document order.
    #[must_use]
    pub fn first_non_empty<'a>(
        &self,
        document: &'a Html,
    ) -> Option<(&'static str, Vec<ElementRef<'a>>)> {
        self.entries.iter().find_map(|(css, selector)| {
            let matches: Vec<ElementRef<'a>> = document.select(selector).collect();
            (!matches.is_empty()).then_some((*css, matches))
        })
    }

    /// Evaluate the cascade inside `scope`.
    ///
    /// For each selector in order, only the first descendant match is
    /// considered; if `extract` rejects it the next selector is tried.
    pub fn first_match<'a, T>(
        &self,
        scope: ElementRef<'a>,
        extract: impl Fn(ElementRef<'a>) -> Option<T>,
    ) -> Option<(&'static str, T)> {
        self.entries.iter().find_map(|(css, selector)| {
            scope
                .select(selector)
                .next()
                .and_then(&extract)
                .map(|value| (*css, value))
        })
    }
}

/// Post containers, oldest and most specific markup first.
pub static CONTAINERS: Lazy<SelectorCascade> = Lazy::new(|| {
    SelectorCascade::new(
        "container",
        &[
            "article",
            r#"[data-testid="post-container"]"#,
            r#"div[data-click-id="body"]"#,
            ".Post",
            r#"[data-adclicklocation="title"]"#,
            ".thing",
            ".link",
            r#"[data-type="link"]"#,
            "shreddit-post",
        ],
    )
});

/// Anchors pointing at a comment thread, used when no container matches.
pub static COMMENT_LINKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/comments/"]"#).expect("comment link selector is valid")
});

pub static TITLES: Lazy<SelectorCascade> = Lazy::new(|| {
    SelectorCascade::new(
        "title",
        &[
            "h3",
            r#"[data-testid="post-title"]"#,
            r#"a[data-click-id="body"] h3"#,
            ".title a",
            r#"[data-adclicklocation="title"]"#,
            "h1",
            "h2",
            "h4",
            "h5",
            "h6",
            ".title",
            r#"[slot="title"]"#,
        ],
    )
});

pub static LINKS: Lazy<SelectorCascade> = Lazy::new(|| {
    SelectorCascade::new(
        "link",
        &[
            r#"a[data-click-id="body"]"#,
            r#"a[href*="/comments/"]"#,
            r#"[data-testid="post-title"] a"#,
            ".title a",
            r#"a[href*="/r/"]"#,
        ],
    )
});

pub static AUTHORS: Lazy<SelectorCascade> = Lazy::new(|| {
    SelectorCascade::new(
        "author",
        &[
            r#"[data-testid="post-author-link"]"#,
            r#"a[href*="/user/"]"#,
            r#"a[href*="/u/"]"#,
            ".author",
        ],
    )
});

pub static BODIES: Lazy<SelectorCascade> = Lazy::new(|| {
    SelectorCascade::new(
        "body",
        &[
            r#"[data-testid="post-text-container"]"#,
            ".usertext-body",
            r#"[data-click-id="text"]"#,
            ".md",
            ".expando .usertext-body",
            r#"div[data-test-id="post-content"]"#,
        ],
    )
});
