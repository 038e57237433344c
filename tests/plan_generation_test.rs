//! Integration tests for business-plan generation against a mocked provider.

use std::time::Duration;

use serde_json::json;
use subreddit_saas_planner::feed::Post;
use subreddit_saas_planner::plan::{GeminiClient, PlanError, PlanGenerator};
use wiremock::matchers::{body_partial_json, header, method, path, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-flash";
const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn sample_post() -> Post {
    Post {
        title: "I spend hours every week chasing late invoices".to_string(),
        link: "https://www.reddit.com/r/freelance/comments/abc/late_invoices/".to_string(),
        author: "designer_dan".to_string(),
        score: 240,
        comments: 81,
        timestamp: "2024-02-10T09:30:00.000Z".to_string(),
        thumbnail: None,
        body: Some("Clients ignore reminders and I hate nagging them.".to_string()),
    }
}

fn generator(server: &MockServer) -> PlanGenerator {
    PlanGenerator::new(GeminiClient::new(reqwest::Client::new(), server.uri(), MODEL))
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": [ { "text": text } ] } }
        ]
    })
}

#[tokio::test]
async fn test_generate_parses_fenced_reply() {
    let server = MockServer::start().await;

    let reply = r#"```json
{
  "saasName": "DunningDesk",
  "tagline": "Polite invoice follow-ups on autopilot",
  "problemStatement": "Freelancers lose hours chasing payments",
  "solution": "Automated, escalating reminder sequences",
  "targetMarket": "Solo freelancers and small studios",
  "businessModel": "Subscription",
  "keyFeatures": ["Reminder sequences", "Payment links"],
  "marketingStrategy": "Freelancer communities",
  "competitiveAdvantage": "Tone presets that keep client relationships warm",
  "revenueModel": "$12/month",
  "implementation": "Integrate with Stripe first",
  "risks": ["Accounting suites add the feature"],
  "nextSteps": ["Interview 20 freelancers"]
}
```"#;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(query_param_is_missing("key"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 2000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let plan = generator(&server)
        .generate(&sample_post(), "google", "test-key")
        .await
        .unwrap();

    assert_eq!(plan.saas_name, "DunningDesk");
    assert_eq!(plan.target_market, "Solo freelancers and small studios");
    assert_eq!(plan.key_features.len(), 2);
    assert_eq!(plan.next_steps, vec!["Interview 20 freelancers".to_string()]);
}

#[tokio::test]
async fn test_prompt_carries_post_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"saasName":"A","tagline":"B","problemStatement":"C","solution":"D","targetMarket":"E"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    generator(&server)
        .generate(&sample_post(), "Google", "k")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("I spend hours every week chasing late invoices"));
    assert!(prompt.contains("Clients ignore reminders and I hate nagging them."));
}

#[tokio::test]
async fn test_upstream_error_carries_provider_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":{"message":"API key not valid"}}"#),
        )
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(&sample_post(), "google", "bad-key")
        .await
        .unwrap_err();

    match err {
        PlanError::Upstream { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reply_without_required_fields_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("Here are some thoughts, but no JSON.")),
        )
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(&sample_post(), "google", "k")
        .await
        .unwrap_err();

    match err {
        PlanError::Parse { raw, .. } => assert_eq!(raw, "Here are some thoughts, but no JSON."),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_candidates_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(&sample_post(), "google", "k")
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Upstream { status: 200, .. }));
}

#[tokio::test]
async fn test_unsupported_provider_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(&sample_post(), "bing", "k")
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::UnsupportedProvider(ref p) if p == "bing"));
}

#[tokio::test]
async fn test_transport_error_does_not_expose_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let generator = PlanGenerator::new(GeminiClient::new(client, server.uri(), MODEL));

    let err = generator
        .generate(&sample_post(), "google", "SECRET-KEY-123")
        .await
        .unwrap_err();

    assert!(matches!(err, PlanError::Request(_)));
    assert!(!err.to_string().contains("SECRET-KEY-123"));
    assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
}
