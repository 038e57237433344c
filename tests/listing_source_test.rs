//! Integration tests for the structured listing strategy.

use subreddit_saas_planner::feed::{FeedQuery, ListingSource, PostSource, RetrievalError, SortMode};
use wiremock::matchers::{header_exists, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TWO_POSTS: &str = r#"{
  "kind": "Listing",
  "data": {
    "after": "t3_next",
    "children": [
      {
        "kind": "t3",
        "data": {
          "title": "Is there a tool for tracking client invoices?",
          "url": "https://www.reddit.com/r/startups/comments/abc/is_there_a_tool/",
          "permalink": "/r/startups/comments/abc/is_there_a_tool/",
          "author": "founder42",
          "score": 128,
          "num_comments": 37,
          "created_utc": 1700000000.0,
          "thumbnail": "self",
          "selftext": "Spreadsheets are killing me."
        }
      },
      {
        "kind": "t3",
        "data": {
          "title": "Show HN style: my side project",
          "url": "/r/startups/comments/def/show_my_side_project/",
          "permalink": "/r/startups/comments/def/show_my_side_project/",
          "author": null,
          "score": 3,
          "num_comments": 0,
          "created_utc": 1700003600,
          "thumbnail": "https://b.thumbs.example.com/x.jpg",
          "selftext": ""
        }
      }
    ]
  }
}"#;

fn source(server: &MockServer) -> ListingSource {
    ListingSource::new(reqwest::Client::new(), server.uri())
}

#[tokio::test]
async fn test_fetch_normalizes_entries_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/hot.json"))
        .and(query_param("limit", "2"))
        .and(query_param_is_missing("after"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_POSTS))
        .expect(1)
        .mount(&server)
        .await;

    let query = FeedQuery::new("r/startups", SortMode::Hot, 2, None);
    let posts = source(&server).fetch(&query).await.unwrap();

    assert_eq!(posts.len(), 2);

    let first = &posts[0];
    assert_eq!(first.title, "Is there a tool for tracking client invoices?");
    assert_eq!(
        first.link,
        "https://www.reddit.com/r/startups/comments/abc/is_there_a_tool/"
    );
    assert_eq!(first.author, "founder42");
    assert_eq!(first.score, 128);
    assert_eq!(first.comments, 37);
    assert_eq!(first.timestamp, "2023-11-14T22:13:20.000Z");
    assert_eq!(first.thumbnail, None);
    assert_eq!(first.body.as_deref(), Some("Spreadsheets are killing me."));

    let second = &posts[1];
    assert_eq!(second.author, "Unknown");
    assert_eq!(
        second.link,
        format!("{}/r/startups/comments/def/show_my_side_project/", server.uri())
    );
    assert_eq!(second.timestamp, "2023-11-14T23:13:20.000Z");
    assert_eq!(
        second.thumbnail.as_deref(),
        Some("https://b.thumbs.example.com/x.jpg")
    );
    assert_eq!(second.body, None);
}

#[tokio::test]
async fn test_fetch_forwards_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/SaaS/new.json"))
        .and(query_param("limit", "5"))
        .and(query_param("after", "t3_abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data":{"children":[],"after":null}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = FeedQuery::new("SaaS", SortMode::New, 5, Some("t3_abc".to_string()));
    let posts = source(&server).fetch(&query).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/top.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let query = FeedQuery::new("startups", SortMode::Top, 5, None);
    match source(&server).fetch(&query).await {
        Err(RetrievalError::Status { status, url }) => {
            assert_eq!(status, 429);
            assert!(url.ends_with("/r/startups/top.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_children_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"after":null}}"#))
        .mount(&server)
        .await;

    let query = FeedQuery::new("startups", SortMode::Hot, 5, None);
    assert!(matches!(
        source(&server).fetch(&query).await,
        Err(RetrievalError::InvalidListing(_))
    ));
}

#[tokio::test]
async fn test_html_body_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/startups/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let query = FeedQuery::new("startups", SortMode::Hot, 5, None);
    assert!(matches!(
        source(&server).fetch(&query).await,
        Err(RetrievalError::InvalidListing(_))
    ));
}
