//! Tests for store module

use super::*;
use crate::types::{
    ChatRole, NewSearchDoc, NewTaskResult, SearchQuery, SearchStrategy, TaskType,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_default_data_dir() {
    let dir = default_data_dir();
    assert!(dir.to_string_lossy().contains("mercato"));
    assert!(default_db_path().ends_with("mercato.db"));
}

#[test]
fn test_fts_expression_quotes_terms() {
    assert_eq!(
        helpers::fts_match_expression("에어팟 \"프로\"").as_deref(),
        Some("\"에어팟\"* OR \"프로\"*")
    );
    assert_eq!(helpers::fts_match_expression("  ?! "), None);
}

#[test]
fn test_like_pattern_escapes_wildcards() {
    assert_eq!(helpers::like_pattern("100%"), "%100\\%%");
    assert_eq!(helpers::like_pattern("a_b"), "%a\\_b%");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let store = Store::in_memory().await.unwrap();
    let session = store.create_session().await.unwrap();

    let fetched = store.get_session(session.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, session.id);
    assert!(store.get_session(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_recent_messages_window_is_chronological() {
    let store = Store::in_memory().await.unwrap();
    let session = store.create_session().await.unwrap();

    for i in 0..12 {
        let role = if i % 2 == 0 {
            ChatRole::User
        } else {
            ChatRole::Assistant
        };
        store
            .append_message(session.id, role, &format!("message {i}"))
            .await
            .unwrap();
    }

    let recent = store.recent_messages(session.id, 10).await.unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent.first().unwrap().content, "message 2");
    assert_eq!(recent.last().unwrap().content, "message 11");
    assert!(recent.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_task_results_ordering_and_latest() {
    let store = Store::in_memory().await.unwrap();
    let session = store.create_session().await.unwrap();

    let first = store
        .save_task_result(
            NewTaskResult::new(session.id, TaskType::Segment, json!({"n": 1}))
                .with_product("에어팟 프로")
                .with_pdf_path("segment_report_1.pdf"),
        )
        .await
        .unwrap();
    let second = store
        .save_task_result(NewTaskResult::new(session.id, TaskType::Trend, json!({"n": 2})))
        .await
        .unwrap();

    let all = store.list_task_results(session.id).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first.id);
    assert_eq!(all[0].product_name.as_deref(), Some("에어팟 프로"));
    assert_eq!(all[0].result_data["n"], 1);

    let latest = store.latest_task_result(session.id, None).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);

    let latest_segment = store
        .latest_task_result(session.id, Some(TaskType::Segment))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest_segment.id, first.id);

    let fetched = store.get_task_result(first.id).await.unwrap();
    assert_eq!(fetched.pdf_path.as_deref(), Some("segment_report_1.pdf"));
    assert!(matches!(
        store.get_task_result(Uuid::new_v4()).await,
        Err(crate::Error::TaskResultNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_session_cascades() {
    let store = Store::in_memory().await.unwrap();
    let session = store.create_session().await.unwrap();
    let other = store.create_session().await.unwrap();

    store
        .append_message(session.id, ChatRole::User, "안녕")
        .await
        .unwrap();
    store
        .append_message(other.id, ChatRole::User, "다른 세션")
        .await
        .unwrap();
    store
        .save_task_result(NewTaskResult::new(session.id, TaskType::Review, json!({})))
        .await
        .unwrap();
    store
        .add_search_doc(NewSearchDoc::new("review", "세션과 무관한 문서"))
        .await
        .unwrap();

    assert!(store.delete_session(session.id).await.unwrap());
    assert!(store.get_session(session.id).await.unwrap().is_none());
    assert!(store.list_messages(session.id).await.unwrap().is_empty());
    assert!(store.list_task_results(session.id).await.unwrap().is_empty());

    // untouched: the other session and the session-independent documents
    assert_eq!(store.list_messages(other.id).await.unwrap().len(), 1);
    let hits = store.search(&SearchQuery::new("무관한")).await;
    assert_eq!(hits.docs.len(), 1);

    assert!(!store.delete_session(session.id).await.unwrap());
}

#[tokio::test]
async fn test_ranked_search_filters_category() {
    let store = Store::in_memory().await.unwrap();
    if !store.full_text_enabled() {
        // SQLite built without FTS5; covered by the substring tests.
        return;
    }

    store
        .add_search_doc(
            NewSearchDoc::new("trend", "스마트워치 검색량이 꾸준히 상승")
                .with_metadata("title", "스마트워치 트렌드 분석"),
        )
        .await
        .unwrap();
    store
        .add_search_doc(NewSearchDoc::new("review", "스마트워치 배터리 리뷰 요약"))
        .await
        .unwrap();

    let hits = store
        .search(&SearchQuery::new("스마트워치").in_category("trend"))
        .await;
    assert_eq!(hits.strategy, SearchStrategy::Ranked);
    assert_eq!(hits.docs.len(), 1);
    assert_eq!(hits.docs[0].title, "스마트워치 트렌드 분석");
}

#[tokio::test]
async fn test_search_falls_back_when_index_disabled() {
    let store = Store::in_memory().await.unwrap();
    for i in 0..3 {
        store
            .add_search_doc(NewSearchDoc::new("segment", format!("에어팟 프로 세그먼트 {i}")))
            .await
            .unwrap();
    }

    store.set_full_text_enabled(false).await;
    assert!(!store.full_text_enabled());

    let hits = store
        .search(&SearchQuery::new("프로 세그먼트").with_limit(2))
        .await;
    assert_eq!(hits.strategy, SearchStrategy::Substring);
    assert_eq!(hits.docs.len(), 2);
    // insertion order
    assert!(hits.docs[0].content.ends_with('0'));
    assert!(hits.docs[1].content.ends_with('1'));
}

#[tokio::test]
async fn test_documents_stored_while_index_disabled_stay_searchable() {
    let store = Store::in_memory().await.unwrap();
    if !store.full_text_enabled() {
        return;
    }

    store.set_full_text_enabled(false).await;
    store
        .add_search_doc(NewSearchDoc::new("trend", "스마트워치 인기 상승"))
        .await
        .unwrap();
    store.set_full_text_enabled(true).await;
    store
        .add_search_doc(NewSearchDoc::new("trend", "스마트워치 가격 하락"))
        .await
        .unwrap();

    let query = SearchQuery::new("스마트워치");
    let hits = store.search(&query).await;
    assert_eq!(hits.strategy, SearchStrategy::Ranked);
    assert_eq!(hits.docs.len(), 2);
    assert_eq!(store.search_substring(&query).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_enabling_index_backfills_missing_rows() {
    let store = Store::in_memory().await.unwrap();
    if !store.full_text_enabled() {
        return;
    }

    store
        .add_search_doc(NewSearchDoc::new("review", "버즈 배터리 후기"))
        .await
        .unwrap();
    sqlx::query("DELETE FROM search_docs_fts")
        .execute(store.pool())
        .await
        .unwrap();
    store
        .add_search_doc(NewSearchDoc::new("review", "버즈 착용감 후기"))
        .await
        .unwrap();

    store.set_full_text_enabled(true).await;
    let hits = store.search(&SearchQuery::new("버즈")).await;
    assert_eq!(hits.strategy, SearchStrategy::Ranked);
    assert_eq!(hits.docs.len(), 2);
}

#[tokio::test]
async fn test_search_falls_back_when_index_broken() {
    let store = Store::in_memory().await.unwrap();
    store
        .add_search_doc(NewSearchDoc::new("competitor", "갤럭시 버즈 가격 비교"))
        .await
        .unwrap();

    sqlx::query("DROP TABLE IF EXISTS search_docs_fts")
        .execute(store.pool())
        .await
        .unwrap();

    let hits = store.search(&SearchQuery::new("버즈 가격")).await;
    assert_eq!(hits.strategy, SearchStrategy::Substring);
    assert_eq!(hits.docs.len(), 1);

    // re-enabling is refused while the table is missing
    store.set_full_text_enabled(true).await;
    assert!(!store.full_text_enabled());
}

#[tokio::test]
async fn test_search_empty_query_returns_nothing() {
    let store = Store::in_memory().await.unwrap();
    store
        .add_search_doc(NewSearchDoc::new("trend", "아무 문서"))
        .await
        .unwrap();
    assert!(store.search(&SearchQuery::new("   ")).await.docs.is_empty());
}

#[tokio::test]
async fn test_from_path_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("mercato.db");
    let store = Store::from_path(&path).await.unwrap();
    store.ping().await.unwrap();
    assert!(path.exists());
}
