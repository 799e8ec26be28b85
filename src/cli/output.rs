//! Output formatting helpers for CLI commands

use crate::feedback::{Insights, PairSummary, Recommendation, RecommendationPriority};
use crate::registry::BackendView;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Format backends as a table, in fallback order
pub fn format_backends_table(backends: &[BackendView]) -> String {
    let mut table = new_table(vec![
        "Name", "Type", "Model", "Priority", "Status", "Per minute", "Per day", "Timeout",
    ]);

    for b in backends {
        let status = if b.available {
            "Available".green().to_string()
        } else {
            "No credentials".yellow().to_string()
        };

        table.add_row(vec![
            Cell::new(&b.name),
            Cell::new(&b.backend_type),
            Cell::new(&b.model_id),
            Cell::new(b.priority),
            Cell::new(status),
            Cell::new(b.rate_limit.minute_limit),
            Cell::new(b.rate_limit.day_limit),
            Cell::new(format!("{}ms", b.timeout_ms)),
        ]);
    }

    table.to_string()
}

/// Format backends as JSON
pub fn format_backends_json(backends: &[BackendView]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({ "backends": backends }))
}

fn summary_table(title: &str, rows: &[PairSummary]) -> String {
    let mut table = new_table(vec!["Backend", "Style", "Score", "Avg rating", "Feedback"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.backend),
            Cell::new(row.style),
            Cell::new(format!("{:.3}", row.score)),
            Cell::new(format!("{:.2}", row.avg_rating)),
            Cell::new(row.feedback_count),
        ]);
    }
    format!("{}\n{}", title.bold(), table)
}

/// Format an insight report plus its recommendations for a terminal
pub fn format_insights_table(insights: &Insights, recommendations: &[Recommendation]) -> String {
    let mut sections = Vec::new();

    if insights.top_performers.is_empty() && insights.underperforming.is_empty() {
        sections.push("No feedback with enough samples yet.".dimmed().to_string());
    }
    if !insights.top_performers.is_empty() {
        sections.push(summary_table("Top performers", &insights.top_performers));
    }
    if !insights.underperforming.is_empty() {
        sections.push(summary_table("Underperforming", &insights.underperforming));
    }
    if !insights.insufficient_data.is_empty() {
        sections.push(summary_table("Insufficient data", &insights.insufficient_data));
    }

    if !recommendations.is_empty() {
        let mut lines = vec!["Recommendations".bold().to_string()];
        for rec in recommendations {
            let tag = match rec.priority {
                RecommendationPriority::High => "HIGH".red().bold().to_string(),
                RecommendationPriority::Medium => "MEDIUM".yellow().to_string(),
            };
            lines.push(format!("  [{}] {} ({})", tag, rec.description, rec.action));
        }
        sections.push(lines.join("\n"));
    }

    let total: u64 = insights.trends.iter().map(|d| d.feedback_count).sum();
    sections.push(format!(
        "{} feedback records over the last {} days with activity",
        total,
        insights.trends.len()
    ));

    sections.join("\n\n")
}

/// Format an insight report plus its recommendations as JSON
pub fn format_insights_json(
    insights: &Insights,
    recommendations: &[Recommendation],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "insights": insights,
        "recommendations": recommendations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentCapabilities;
    use crate::feedback::{DailyCount, RecommendationCategory};
    use crate::ratelimit::RateLimitSnapshot;
    use crate::style::ConversationStyle;
    use chrono::{NaiveDate, Utc};

    fn backend_view(available: bool) -> BackendView {
        BackendView {
            name: "gemini".to_string(),
            backend_type: "gemini".to_string(),
            model_id: "gemini-1.5-flash".to_string(),
            priority: 1,
            available,
            timeout_ms: 8000,
            capabilities: AgentCapabilities::default(),
            rate_limit: RateLimitSnapshot {
                minute_used: 0,
                minute_limit: 15,
                day_used: 0,
                day_limit: 1500,
                last_reset: Utc::now(),
            },
            total_requests: 0,
            total_failures: 0,
            avg_latency_ms: 0,
        }
    }

    fn insights() -> Insights {
        Insights {
            underperforming: vec![PairSummary {
                backend: "hf".to_string(),
                style: ConversationStyle::Casual,
                score: 0.31,
                avg_rating: 1.4,
                feedback_count: 7,
            }],
            top_performers: Vec::new(),
            insufficient_data: Vec::new(),
            trends: vec![DailyCount {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                feedback_count: 7,
            }],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_backends_table_empty() {
        let output = format_backends_table(&[]);
        assert!(output.contains("Name"));
    }

    #[test]
    fn test_format_backends_table_with_data() {
        let output = format_backends_table(&[backend_view(true), backend_view(false)]);
        assert!(output.contains("gemini-1.5-flash"));
        assert!(output.contains("Available"));
        assert!(output.contains("No credentials"));
        assert!(output.contains("1500"));
    }

    #[test]
    fn test_format_backends_json_valid() {
        let output = format_backends_json(&[backend_view(true)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["backends"][0]["rate_limit"]["minute_limit"], 15);
    }

    #[test]
    fn test_format_insights_table_lists_sections() {
        let rec = Recommendation {
            priority: RecommendationPriority::High,
            category: RecommendationCategory::PerformanceIssue,
            backend: "hf".to_string(),
            style: ConversationStyle::Casual,
            score: 0.31,
            description: "hf underperforms for casual".to_string(),
            action: "lower its priority".to_string(),
        };
        let output = format_insights_table(&insights(), &[rec]);
        assert!(output.contains("Underperforming"));
        assert!(output.contains("HIGH"));
        assert!(output.contains("7 feedback records"));
    }

    #[test]
    fn test_format_insights_json_valid() {
        let output = format_insights_json(&insights(), &[]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["insights"]["underperforming"][0]["backend"], "hf");
        assert!(parsed["recommendations"].as_array().unwrap().is_empty());
    }
}
