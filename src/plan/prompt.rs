use crate::feed::Post;

/// Persona line placed ahead of every prompt.
pub const SYSTEM_PREAMBLE: &str =
    "You are a business strategy expert specializing in SaaS products. Always respond with valid JSON.";

const NO_CONTENT: &str = "No content provided";

const SCHEMA: &str = r#"{
  "saasName": "Creative name for the SaaS product",
  "tagline": "Compelling one-line description",
  "problemStatement": "Clear problem this SaaS solves",
  "solution": "How your SaaS addresses the problem",
  "targetMarket": "Who would use this product",
  "businessModel": "How the business operates",
  "keyFeatures": ["Feature 1", "Feature 2", "Feature 3", "Feature 4", "Feature 5"],
  "marketingStrategy": "How to reach and acquire customers",
  "competitiveAdvantage": "What makes this solution unique",
  "revenueModel": "How the business makes money",
  "implementation": "High-level implementation approach",
  "risks": ["Risk 1", "Risk 2", "Risk 3"],
  "nextSteps": ["Step 1", "Step 2", "Step 3", "Step 4"]
}"#;

/// Build the business-plan instruction for a post.
#[must_use]
pub fn build_prompt(post: &Post) -> String {
    let content = post
        .body
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(NO_CONTENT);

    format!(
        "Based on this Reddit post, generate a comprehensive SaaS business plan:

Title: {title}
Content: {content}
Author: u/{author}
Engagement: {score} upvotes, {comments} comments

Please analyze this post and create a detailed SaaS business plan that addresses the problem or opportunity mentioned. Return ONLY a valid JSON object with the following structure (no additional text or formatting):

{schema}

Make sure the response is valid JSON and the business plan is realistic, actionable, and directly inspired by the Reddit post content.
",
        title = post.title,
        author = post.author,
        score = post.score,
        comments = post.comments,
        schema = SCHEMA,
    )
}
