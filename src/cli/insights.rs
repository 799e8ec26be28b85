//! Insights command implementation

use crate::cli::output::{format_insights_json, format_insights_table};
use crate::cli::InsightsArgs;
use crate::config::ChatrouteConfig;
use crate::feedback::{FeedbackStore, SqliteStorage};
use anyhow::Context;
use std::sync::Arc;

/// Handle `chatroute insights`
///
/// Reads the persisted aggregates directly; the server does not need to be
/// running.
pub fn handle_insights(args: &InsightsArgs) -> anyhow::Result<String> {
    let config = if args.config.exists() {
        ChatrouteConfig::load(Some(&args.config))?
    } else {
        ChatrouteConfig::default()
    }
    .with_env_overrides();

    let path = args
        .db
        .clone()
        .or_else(|| config.feedback.database_path.clone())
        .context("no feedback database configured; pass --db or set [feedback] database_path")?;
    if !path.exists() {
        anyhow::bail!("feedback database not found: {}", path.display());
    }

    let storage = SqliteStorage::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let store = FeedbackStore::new(Arc::new(storage), config.feedback.clone())?;
    report(&store, args.json)
}

/// Render the insight report for `store`.
pub fn report(store: &FeedbackStore, json: bool) -> anyhow::Result<String> {
    let insights = store.generate_insights()?;
    let recommendations = store.recommendations();

    if json {
        Ok(format_insights_json(&insights, &recommendations)?)
    } else {
        Ok(format_insights_table(&insights, &recommendations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedbackConfig;
    use crate::feedback::{FeedbackKind, FeedbackRecord};
    use crate::style::ConversationStyle;
    use std::path::PathBuf;

    fn seed(path: &std::path::Path) {
        let store = FeedbackStore::new(
            Arc::new(SqliteStorage::open(path).unwrap()),
            FeedbackConfig::default(),
        )
        .unwrap();
        for i in 0..6 {
            store
                .record_feedback(
                    FeedbackRecord::new(
                        format!("m{}", i),
                        "c1",
                        FeedbackKind::ThumbsDown,
                        "hf",
                        ConversationStyle::Casual,
                    )
                    .with_latency(3.0)
                    .with_response_error(true),
                )
                .unwrap();
        }
    }

    #[test]
    fn test_insights_from_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("feedback.db");
        seed(&db);

        let args = InsightsArgs {
            json: true,
            config: PathBuf::from("does-not-exist.toml"),
            db: Some(db),
        };
        let output = handle_insights(&args).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["insights"]["underperforming"][0]["backend"], "hf");
        assert_eq!(parsed["recommendations"][0]["priority"], "high");
    }

    #[test]
    fn test_insights_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let args = InsightsArgs {
            json: false,
            config: PathBuf::from("does-not-exist.toml"),
            db: Some(dir.path().join("missing.db")),
        };
        let err = handle_insights(&args).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
