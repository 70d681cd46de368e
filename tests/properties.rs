//! Invariants from spec §8 not already exercised by component-level unit
//! tests.

use std::collections::HashMap;

use bi_query_assist::config::Config;
use bi_query_assist::orchestrator::Orchestrator;

fn kw(items: &[&str]) -> std::collections::HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn seeded() -> std::sync::Arc<Orchestrator> {
    let orchestrator = Orchestrator::initialize(Config::default());
    orchestrator
        .add_document("销售额", Some("1".to_string()), kw(&["销售", "revenue"]), HashMap::new())
        .await
        .unwrap();
    orchestrator
        .add_document("销售额趋势分析", Some("2".to_string()), kw(&["销售", "trend"]), HashMap::new())
        .await
        .unwrap();
    orchestrator
        .add_document("市场分析", Some("3".to_string()), kw(&["market"]), HashMap::new())
        .await
        .unwrap();
    orchestrator
}

/// Property 2: all returned texts are distinct modulo case-insensitive,
/// whitespace-normalized equality.
#[tokio::test]
async fn property_2_suggestions_are_deduplicated() {
    let orchestrator = seeded().await;
    let suggestions = orchestrator.get_suggestions("销售", None, 10, None, None).await.unwrap();
    let mut seen = std::collections::HashSet::new();
    for s in &suggestions {
        let key = bi_query_assist::data::normalize_for_dedup(&s.text);
        assert!(seen.insert(key), "duplicate suggestion text: {}", s.text);
    }
}

/// Property 3: scores are monotonically non-increasing across the returned
/// list.
#[tokio::test]
async fn property_3_scores_are_monotonically_non_increasing() {
    let orchestrator = seeded().await;
    let suggestions = orchestrator.get_suggestions("销售", None, 10, None, None).await.unwrap();
    for w in suggestions.windows(2) {
        assert!(w[0].score >= w[1].score);
    }
}

/// Property 4: determinism — given the same indexed state and request, two
/// calls return identical ordering (oracle disabled).
#[tokio::test]
async fn property_4_repeated_calls_are_deterministic() {
    let orchestrator = seeded().await;
    let first = orchestrator.get_suggestions("销售", None, 10, None, None).await.unwrap();
    let second = orchestrator.get_suggestions("销售", None, 10, None, None).await.unwrap();
    let first_texts: Vec<&str> = first.iter().map(|s| s.text.as_str()).collect();
    let second_texts: Vec<&str> = second.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(first_texts, second_texts);
}

/// Property 5: adds are idempotent by id.
#[tokio::test]
async fn property_5_add_document_is_idempotent_by_id() {
    let orchestrator = Orchestrator::initialize(Config::default());
    let id1 = orchestrator
        .add_document("销售额", Some("fixed-id".to_string()), kw(&["销售"]), HashMap::new())
        .await
        .unwrap();
    let id2 = orchestrator
        .add_document("销售额", Some("fixed-id".to_string()), kw(&["销售"]), HashMap::new())
        .await
        .unwrap();
    assert_eq!(id1, id2);

    let suggestions = orchestrator.get_suggestions("销售额", None, 10, None, None).await.unwrap();
    let matches = suggestions.iter().filter(|s| s.text == "销售额").count();
    assert_eq!(matches, 1);
}

/// Property 6: `record_feedback` is increment-additive.
#[tokio::test]
async fn property_6_feedback_is_increment_additive() {
    let orchestrator = seeded().await;
    for _ in 0..5 {
        orchestrator.record_feedback("销售", "销售额趋势分析", Some("u9"), None).await.unwrap();
    }
    let suggestions = orchestrator
        .get_suggestions("销售", Some("u9"), 2, None, None)
        .await
        .unwrap();
    assert_eq!(suggestions[0].text, "销售额趋势分析");
}

/// Property 8: `limit = 1` returns at most one suggestion; out-of-range
/// limit is rejected.
#[tokio::test]
async fn property_8_limit_boundaries() {
    let orchestrator = seeded().await;
    let one = orchestrator.get_suggestions("销售", None, 1, None, None).await.unwrap();
    assert!(one.len() <= 1);

    let err = orchestrator.get_suggestions("销售", None, 0, None, None).await.unwrap_err();
    assert!(matches!(err, bi_query_assist::error::QaError::InvalidArgument(_)));

    let err = orchestrator.get_suggestions("销售", None, 51, None, None).await.unwrap_err();
    assert!(matches!(err, bi_query_assist::error::QaError::InvalidArgument(_)));
}

/// Property 9: empty query is rejected.
#[tokio::test]
async fn property_9_empty_query_is_rejected() {
    let orchestrator = seeded().await;
    let err = orchestrator.get_suggestions("   ", None, 5, None, None).await.unwrap_err();
    assert!(matches!(err, bi_query_assist::error::QaError::InvalidArgument(_)));
}

/// Property 10: when Oracle is unavailable, `get_related_queries` still
/// returns non-empty results when other sources have content.
#[tokio::test]
async fn property_10_related_queries_work_without_oracle() {
    let orchestrator = seeded().await;
    let related = orchestrator.get_related_queries("销售", None, 5).await.unwrap();
    assert!(!related.is_empty());
}
