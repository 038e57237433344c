use super::BusinessPlan;
use crate::feed::Post;

/// Render a plan as a downloadable Markdown document.
#[must_use]
pub fn render_markdown(plan: &BusinessPlan, source: Option<&Post>) -> String {
    let mut doc = format!("# {}\n{}\n", plan.saas_name, plan.tagline);

    doc.push_str(&section("Problem Statement", &plan.problem_statement));
    doc.push_str(&section("Solution", &plan.solution));
    doc.push_str(&section("Target Market", &plan.target_market));
    doc.push_str(&bullets("Key Features", &plan.key_features));
    doc.push_str(&section("Business Model", &plan.business_model));
    doc.push_str(&section("Revenue Model", &plan.revenue_model));
    doc.push_str(&section("Marketing Strategy", &plan.marketing_strategy));
    doc.push_str(&section("Competitive Advantage", &plan.competitive_advantage));
    doc.push_str(&section("Implementation Plan", &plan.implementation));
    doc.push_str(&bullets("Risks & Mitigation", &plan.risks));
    doc.push_str(&bullets("Next Steps", &plan.next_steps));

    if let Some(post) = source {
        doc.push_str(&format!(
            "\n---\nGenerated from Reddit post: {}\nBy: {}\n",
            post.title, post.author
        ));
    }

    doc
}

/// File name for a plan's Markdown document.
#[must_use]
pub fn document_filename(plan: &BusinessPlan) -> String {
    let stem: String = plan
        .saas_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}_business_plan.md")
}

fn section(heading: &str, text: &str) -> String {
    format!("\n## {heading}\n{text}\n")
}

fn bullets(heading: &str, items: &[String]) -> String {
    let mut out = format!("\n## {heading}\n");
    for item in items {
        out.push_str(&format!("• {item}\n"));
    }
    out
}
