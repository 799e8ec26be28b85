//! Feedback-driven backend selection, end to end through the chat service.

mod common;

use chatroute::config::FeedbackConfig;
use chatroute::feedback::{FeedbackKind, FeedbackRecord, FeedbackStore, SqliteStorage};
use chatroute::recommend::RecommendationSource;
use chatroute::style::ConversationStyle;
use common::{rating, registry_of, service_over, service_with, user, MockAgent};
use std::sync::Arc;

#[tokio::test]
async fn test_cold_start_uses_priority_order() {
    let service = service_over(registry_of(&[MockAgent::new("a"), MockAgent::new("b")]));

    let result = service
        .handle_chat_turn(&user("hi"), ConversationStyle::Friendly)
        .await
        .unwrap();
    assert_eq!(result.backend_used, "a");

    let preferred = service.preferred_backends();
    assert_eq!(preferred.len(), ConversationStyle::ALL.len());
    assert!(preferred
        .iter()
        .all(|p| p.entry.backend == "a" && p.entry.source == RecommendationSource::DefaultOrder));
}

#[tokio::test]
async fn test_feedback_promotes_then_demotes_backend() {
    let a = MockAgent::new("a");
    let b = MockAgent::new("b");
    let service = service_over(registry_of(&[a.clone(), b.clone()]));
    let style = ConversationStyle::Casual;

    // b: 0.4 + 0.3 + 0.2 + 0.001 = 0.901, a: 0.24 + 0.15 + 0.2 + 0.001 = 0.591
    service.record_feedback(rating("a", style, 3, 2.0)).unwrap();
    service.record_feedback(rating("b", style, 5, 0.5)).unwrap();

    let result = service.handle_chat_turn(&user("hi"), style).await.unwrap();
    assert_eq!(result.backend_used, "b");
    assert!(!result.fallback_used);

    // Five poor ratings drag b to roughly 0.511.
    for _ in 0..5 {
        service.record_feedback(rating("b", style, 1, 2.0)).unwrap();
    }

    let result = service.handle_chat_turn(&user("hi again"), style).await.unwrap();
    assert_eq!(result.backend_used, "a");

    let b_score = service
        .feedback()
        .get_aggregate("b", style)
        .unwrap()
        .score;
    assert!((b_score - 0.511).abs() < 0.001, "score was {}", b_score);
}

#[tokio::test]
async fn test_feedback_is_scoped_to_style() {
    let service = service_over(registry_of(&[MockAgent::new("a"), MockAgent::new("b")]));

    service
        .record_feedback(rating("b", ConversationStyle::Creative, 5, 0.3))
        .unwrap();

    let creative = service
        .handle_chat_turn(&user("hi"), ConversationStyle::Creative)
        .await
        .unwrap();
    let analytical = service
        .handle_chat_turn(&user("hi"), ConversationStyle::Analytical)
        .await
        .unwrap();

    assert_eq!(creative.backend_used, "b");
    assert_eq!(analytical.backend_used, "a");
}

#[tokio::test]
async fn test_preferred_backend_failing_still_falls_back() {
    let a = MockAgent::new("a");
    let b = MockAgent::failing(
        "b",
        chatroute::agent::AgentError::Network("down".to_string()),
    );
    let service = service_over(registry_of(&[a, b.clone()]));
    let style = ConversationStyle::Helpful;

    service.record_feedback(rating("b", style, 5, 0.2)).unwrap();

    let result = service.handle_chat_turn(&user("hi"), style).await.unwrap();
    assert_eq!(b.calls(), 1);
    assert_eq!(result.backend_used, "a");
    assert!(result.fallback_used);
    assert_eq!(result.failures[0].backend, "b");
}

#[test]
fn test_invalid_feedback_leaves_aggregates_untouched() {
    let service = service_over(registry_of(&[MockAgent::new("a")]));

    let err = service
        .record_feedback(FeedbackRecord::new(
            "m1",
            "c1",
            FeedbackKind::Rating { value: 0 },
            "a",
            ConversationStyle::Helpful,
        ))
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert!(service
        .feedback()
        .get_aggregate("a", ConversationStyle::Helpful)
        .is_none());
}

#[test]
fn test_analytics_and_insights() {
    let service = service_over(registry_of(&[MockAgent::new("a"), MockAgent::new("b")]));
    let style = ConversationStyle::Professional;

    for i in 0..6 {
        service
            .record_feedback(
                FeedbackRecord::new(
                    format!("down-{}", i),
                    "c1",
                    FeedbackKind::ThumbsDown,
                    "b",
                    style,
                )
                .with_latency(4.0)
                .with_response_error(true),
            )
            .unwrap();
    }
    service
        .record_feedback(FeedbackRecord::new(
            "up-1",
            "c2",
            FeedbackKind::ThumbsUp,
            "a",
            style,
        ))
        .unwrap();

    let analytics = service.analytics().unwrap();
    assert_eq!(analytics.total_feedback, 7);
    assert_eq!(analytics.positive, 1);
    assert_eq!(analytics.negative, 6);
    assert_eq!(analytics.performance[0].backend, "a");

    let insights = service.insights().unwrap();
    assert_eq!(insights.underperforming.len(), 1);
    assert_eq!(insights.underperforming[0].backend, "b");
    assert!(insights
        .insufficient_data
        .iter()
        .any(|p| p.backend == "a"));

    let recommendations = service.recommendations();
    assert!(recommendations.iter().any(|r| r.backend == "b"));
}

#[tokio::test]
async fn test_sqlite_feedback_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("feedback.db");
    let style = ConversationStyle::Friendly;

    {
        let store = Arc::new(
            FeedbackStore::new(
                Arc::new(SqliteStorage::open(&db).unwrap()),
                FeedbackConfig::default(),
            )
            .unwrap(),
        );
        let service = service_with(
            registry_of(&[MockAgent::new("a"), MockAgent::new("b")]),
            store,
        );
        service.record_feedback(rating("b", style, 5, 0.4)).unwrap();
        service.record_feedback(rating("a", style, 2, 3.0)).unwrap();
    }

    let store = Arc::new(
        FeedbackStore::new(
            Arc::new(SqliteStorage::open(&db).unwrap()),
            FeedbackConfig::default(),
        )
        .unwrap(),
    );
    let service = service_with(
        registry_of(&[MockAgent::new("a"), MockAgent::new("b")]),
        store,
    );

    let restored = service.feedback().get_aggregate("b", style).unwrap();
    assert_eq!(restored.total_count, 1);
    assert_eq!(service.feedback().record_count().unwrap(), 2);

    let result = service.handle_chat_turn(&user("hi"), style).await.unwrap();
    assert_eq!(result.backend_used, "b");
}
