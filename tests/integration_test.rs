//! Integration tests for Mercato
//!
//! These tests drive full chat turns across the crates:
//! - mercato-core: routing, agents and the orchestrator
//! - mercato-store: sessions, messages, results and search
//! - mercato-gateway: synthetic market data
//! - mercato-report: PDF/HTML artifacts and lookup

use std::sync::Arc;

use mercato_core::{AgentContext, Orchestrator, OrchestratorConfig, TurnInput};
use mercato_gateway::DataGateway;
use mercato_llm::MockProvider;
use mercato_report::{ArtifactFormat, ArtifactStore, ReportWriter};
use mercato_store::{ChatRole, SearchQuery, Store, TaskType};

struct Harness {
    orchestrator: Orchestrator,
    mock: MockProvider,
    artifacts: ArtifactStore,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockProvider::new();
    let artifacts = ArtifactStore::new(dir.path());
    let ctx = AgentContext::new(
        Store::in_memory().await.unwrap(),
        Arc::new(mock.clone()),
        Arc::new(DataGateway::synthetic_only()),
        Arc::new(ReportWriter::new(artifacts.clone()).unwrap()),
    );
    Harness {
        orchestrator: Orchestrator::new(ctx, OrchestratorConfig::default()),
        mock,
        artifacts,
        _dir: dir,
    }
}

// ============================================================================
// Scenario A: trend analysis produces a downloadable PDF
// ============================================================================

#[tokio::test]
async fn test_scenario_a_trend_report() {
    let h = harness().await;

    let reply = h
        .orchestrator
        .handle_turn(TurnInput::new("스마트워치 트렌드 분석"))
        .await
        .unwrap();

    assert_eq!(reply.task_type, Some(TaskType::Trend));
    let report_id = reply.report_id.expect("trend turn returns a report id");
    assert_eq!(reply.download_url, Some(format!("/report/{report_id}")));

    let artifact = h.artifacts.resolve(&report_id).await.unwrap();
    assert_eq!(artifact.format, ArtifactFormat::Pdf);
    let bytes = tokio::fs::read(&artifact.path).await.unwrap();
    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(b"%PDF"));

    let result = h
        .orchestrator
        .store()
        .get_task_result(reply.result_id.unwrap())
        .await
        .unwrap();
    assert_eq!(result.pdf_path.as_deref(), Some(report_id.as_str()));
    assert_eq!(result.result_data["keyword"], "스마트워치");
}

// ============================================================================
// Scenario B: two segmentations, then a synthesis report
// ============================================================================

#[tokio::test]
async fn test_scenario_b_synthesis_after_two_segments() {
    let h = harness().await;
    let segment = "에어팟 프로 구매자를 세그먼트로 분류해줘";

    let first = h
        .orchestrator
        .handle_turn(TurnInput::new(segment))
        .await
        .unwrap();
    let session_id = first.session_id;
    assert_eq!(first.task_type, Some(TaskType::Segment));

    let second = h
        .orchestrator
        .handle_turn(TurnInput::new(segment).with_session_id(session_id))
        .await
        .unwrap();
    assert_eq!(second.session_id, session_id);

    h.mock.push_response(
        "# Executive Summary\n에어팟 프로 구매자는 세 그룹으로 나뉩니다.\n\
         # 시장 환경 분석\n무선 이어폰 수요 증가\n\
         # 고객 인사이트\n가성비와 프리미엄 수요 공존\n\
         # 마케팅 전략 제안\n세그먼트별 메시지 분리\n\
         # 실행 계획\n1. 리뷰 이벤트",
    );
    let synthesis = h
        .orchestrator
        .handle_turn(TurnInput::new("종합 보고서 만들어줘").with_session_id(session_id))
        .await
        .unwrap();

    assert_eq!(synthesis.task_type, Some(TaskType::Synthesis));
    let report_id = synthesis.report_id.expect("synthesis returns an artifact");
    assert!(report_id.starts_with("synthesis_report_"));
    assert!(h.artifacts.resolve(&report_id).await.is_ok());

    let store = h.orchestrator.store();
    let results = store.list_task_results(session_id).await.unwrap();
    assert_eq!(results.len(), 3);

    // One user and one assistant message per turn
    let roles: Vec<ChatRole> = store
        .list_messages(session_id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles.len(), 6);
    assert!(roles
        .chunks(2)
        .all(|pair| pair == [ChatRole::User, ChatRole::Assistant]));

    // Each completed task is indexed for recall
    let hits = store
        .search(&SearchQuery::new("에어팟").in_category("segment"))
        .await;
    assert_eq!(hits.docs.len(), 2);
}

#[tokio::test]
async fn test_synthesis_with_one_result_returns_guidance() {
    let h = harness().await;
    let first = h
        .orchestrator
        .handle_turn(TurnInput::new("에어팟 프로 구매자를 세그먼트로 분류해줘"))
        .await
        .unwrap();

    let reply = h
        .orchestrator
        .handle_turn(TurnInput::new("종합 보고서 만들어줘").with_session_id(first.session_id))
        .await
        .unwrap();
    assert!(reply.report_id.is_none());
    assert!(reply.reply_text.contains("현재 1개"));
}

// ============================================================================
// Scenario C: greeting lists capabilities
// ============================================================================

#[tokio::test]
async fn test_scenario_c_greeting() {
    let h = harness().await;

    let reply = h
        .orchestrator
        .handle_turn(TurnInput::new("안녕"))
        .await
        .unwrap();

    assert!(reply.report_id.is_none());
    assert!(reply.task_type.is_none());
    for name in [
        "소비 트렌드 분석",
        "광고 문구 생성",
        "사용자 세그먼트 분류",
        "리뷰 감성 분석",
        "경쟁사 분석",
        "마케팅 전략 종합 보고서",
    ] {
        assert!(reply.reply_text.contains(name), "missing {name}");
    }
    assert_eq!(h.mock.call_count(), 0);
}

// ============================================================================
// Competitor analysis renders HTML
// ============================================================================

#[tokio::test]
async fn test_competitor_report_is_html() {
    let h = harness().await;

    let reply = h
        .orchestrator
        .handle_turn(TurnInput::new("아이폰 15와 갤럭시 S24 비교 분석해줘"))
        .await
        .unwrap();

    assert_eq!(reply.task_type, Some(TaskType::Competitor));
    let report_id = reply.report_id.unwrap();
    let artifact = h.artifacts.resolve(&report_id).await.unwrap();
    assert_eq!(artifact.format, ArtifactFormat::Html);
}
