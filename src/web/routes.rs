use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::feed::{FeedQuery, Post, SortMode, UnknownSort};
use crate::plan::{document_filename, render_markdown, BusinessPlan};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/scrape", get(scrape))
        .route("/api/generate-idea", post(generate_idea))
        .route("/api/plan-document", post(plan_document))
        .route("/healthz", get(healthz))
}

/// Query parameters for `GET /api/scrape`.
///
/// Everything arrives as an optional string so missing and malformed values
/// can be reported with the API's own error body.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeParams {
    #[serde(alias = "subreddit")]
    pub community: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub after: Option<String>,
}

/// Body of `POST /api/generate-idea`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIdeaRequest {
    pub post: Option<Post>,
    pub provider: Option<String>,
    pub api_key: Option<String>,
}

/// Body of `POST /api/plan-document`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocumentRequest {
    pub business_plan: Option<BusinessPlan>,
    pub post: Option<Post>,
}

impl ScrapeParams {
    fn into_query(self, default_limit: u32, max_limit: u32) -> Result<FeedQuery, ApiError> {
        let community = required(self.community)
            .ok_or_else(|| ApiError::BadRequest("Subreddit and sort are required".to_string()))?;
        let sort = required(self.sort)
            .ok_or_else(|| ApiError::BadRequest("Subreddit and sort are required".to_string()))?;

        let sort: SortMode = sort
            .parse()
            .map_err(|e: UnknownSort| ApiError::BadRequest(e.to_string()))?;

        let limit = match required(self.limit) {
            None => default_limit,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n.min(max_limit),
                _ => {
                    return Err(ApiError::BadRequest(format!(
                        "limit must be a positive integer, got '{raw}'"
                    )))
                }
            },
        };

        let query = FeedQuery::new(&community, sort, limit, self.after);
        if query.community.is_empty() {
            return Err(ApiError::BadRequest(
                "Subreddit and sort are required".to_string(),
            ));
        }
        Ok(query)
    }
}

/// Present and not blank.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let query = params.into_query(
        state.config.default_post_limit,
        state.config.max_post_limit,
    )?;

    if let Some(posts) = state.cache.get(&query) {
        debug!(community = %query.community, sort = %query.sort, "Serving cached posts");
        return Ok(Json(posts));
    }

    let posts = state.feed.fetch(&query).await?;
    info!(
        community = %query.community,
        sort = %query.sort,
        count = posts.len(),
        "Fetched posts"
    );

    state.cache.insert(&query, &posts);
    Ok(Json(posts))
}

async fn generate_idea(
    State(state): State<AppState>,
    body: Result<Json<GenerateIdeaRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (Some(post), Some(provider), Some(api_key)) = (
        request.post,
        required(request.provider),
        required(request.api_key),
    ) else {
        return Err(ApiError::BadRequest(
            "Post, provider, and API key are required".to_string(),
        ));
    };

    let plan = state.planner.generate(&post, &provider, &api_key).await?;
    Ok(Json(json!({ "businessPlan": plan })))
}

async fn plan_document(body: Result<Json<PlanDocumentRequest>, JsonRejection>) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => return ApiError::BadRequest(e.body_text()).into_response(),
    };

    let Some(plan) = request.business_plan else {
        return ApiError::BadRequest("businessPlan is required".to_string()).into_response();
    };

    let markdown = render_markdown(&plan, request.post.as_ref());
    let disposition = format!("attachment; filename=\"{}\"", document_filename(&plan));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    )
        .into_response()
}

async fn healthz() -> &'static str {
    "OK"
}
