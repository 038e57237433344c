//! Integration tests for the listing -> rendered page fallback.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use subreddit_saas_planner::feed::{
    FallbackChain, FeedQuery, ListingSource, PageRenderer, PostSource, RenderedPageSource,
    RetrievalError, SortMode,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RENDERED_PAGE: &str = r#"
<html><body>
  <shreddit-post>
    <a slot="title" href="/r/startups/comments/p1/need_a_crm/">Need a CRM for a two-person agency</a>
    <a href="/user/agencyowner/">u/agencyowner</a>
    <div slot="text-body"><p>Everything is too expensive.</p></div>
  </shreddit-post>
  <shreddit-post>
    <a slot="title" href="/r/startups/comments/p2/hiring/">How do you hire your first engineer?</a>
  </shreddit-post>
</body></html>
"#;

/// Renderer that serves canned markup and records requested URLs.
#[derive(Clone, Default)]
struct RecordingRenderer {
    html: Option<&'static str>,
    requested: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PageRenderer for RecordingRenderer {
    async fn render(&self, url: &str) -> Result<String, RetrievalError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.html
            .map(str::to_string)
            .ok_or_else(|| RetrievalError::Browser("failed to launch browser".to_string()))
    }
}

fn chain(server: &MockServer, renderer: RecordingRenderer) -> FallbackChain {
    FallbackChain::new(
        Box::new(ListingSource::new(reqwest::Client::new(), server.uri())),
        Box::new(RenderedPageSource::new(renderer, server.uri())),
    )
}

#[tokio::test]
async fn test_listing_failure_falls_back_to_rendered_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/hot.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = RecordingRenderer {
        html: Some(RENDERED_PAGE),
        ..Default::default()
    };
    let requested = renderer.requested.clone();

    let query = FeedQuery::new("startups", SortMode::Hot, 5, None);
    let posts = chain(&server, renderer).fetch(&query).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "Need a CRM for a two-person agency");
    assert_eq!(
        posts[0].link,
        format!("{}/r/startups/comments/p1/need_a_crm/", server.uri())
    );
    assert_eq!(posts[0].score, 0);
    assert_eq!(posts[0].comments, 0);
    assert_eq!(posts[1].title, "How do you hire your first engineer?");

    let requested = requested.lock().unwrap();
    assert_eq!(requested.as_slice(), [format!("{}/r/startups/hot", server.uri())]);
}

#[tokio::test]
async fn test_successful_listing_skips_renderer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/new.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"children":[{"data":{"title":"Only one","permalink":"/r/startups/comments/x/only_one/","author":"a","score":1,"num_comments":2,"created_utc":0}}]}}"#,
        ))
        .mount(&server)
        .await;

    let renderer = RecordingRenderer {
        html: Some(RENDERED_PAGE),
        ..Default::default()
    };
    let requested = renderer.requested.clone();

    let query = FeedQuery::new("startups", SortMode::New, 5, None);
    let posts = chain(&server, renderer).fetch(&query).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Only one");
    assert_eq!(posts[0].timestamp, "1970-01-01T00:00:00.000Z");
    assert!(requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_both_strategies_failing_surfaces_fallback_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/hot.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let query = FeedQuery::new("startups", SortMode::Hot, 5, None);
    let result = chain(&server, RecordingRenderer::default()).fetch(&query).await;

    match result {
        Err(RetrievalError::Browser(message)) => assert!(message.contains("launch")),
        other => panic!("expected browser error, got {other:?}"),
    }
}
