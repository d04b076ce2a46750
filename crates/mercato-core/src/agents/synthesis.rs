//! Synthesis agent: one strategy report over the session's prior results

use super::context::{AgentContext, SynthesisSettings, TruncationPolicy};
use super::{strip_markdown, Agent, AgentInput, AgentReply};
use crate::error::{Error, Result};
use crate::router::DEFAULT_ROUTES;
use crate::subject;
use mercato_llm::util::truncate_chars;
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::{TaskResult, TaskType};
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Characters per estimated token
const CHARS_PER_TOKEN: usize = 3;

const SYNTHESIS_SYSTEM_PROMPT: &str = r#"당신은 커머스 마케팅 총괄 전략가입니다.
여러 분석 결과를 하나의 일관된 마케팅 전략 보고서로 통합하세요.

반드시 다음 마크다운 섹션 순서로 작성하세요:
# Executive Summary
# 시장 환경 분석
# 고객 인사이트
# 마케팅 전략 제안
# 실행 계획

각 섹션은 분석 결과의 수치와 근거를 인용하고, 실행 계획은 단기/중기 과제로 나누어 작성하세요."#;

/// One prior result prepared for the prompt
#[derive(Debug, Clone)]
pub(crate) struct SynthesisInput {
    pub(crate) result: TaskResult,
    /// Serialized payload, possibly clipped
    pub(crate) data: String,
}

/// Inputs after the budget has been applied
#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub(crate) inputs: Vec<SynthesisInput>,
    pub(crate) truncated: bool,
    pub(crate) estimated_tokens: usize,
}

fn estimate_tokens<'a>(payloads: impl IntoIterator<Item = &'a str>) -> usize {
    payloads
        .into_iter()
        .map(|p| p.chars().count())
        .sum::<usize>()
        / CHARS_PER_TOKEN
}

/// Keep the newest result per key, preserving chronological order
fn latest_per<K, F>(results: Vec<TaskResult>, key: F) -> Vec<TaskResult>
where
    K: Eq + std::hash::Hash,
    F: Fn(&TaskResult) -> K,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<TaskResult> = results
        .into_iter()
        .rev()
        .filter(|r| seen.insert(key(r)))
        .collect();
    kept.reverse();
    kept
}

/// Fit `results` (oldest first) into the token budget
pub(crate) fn select_inputs(results: Vec<TaskResult>, settings: &SynthesisSettings) -> Selection {
    let serialize = |r: TaskResult| {
        let data = serde_json::to_string(&r.result_data).unwrap_or_default();
        SynthesisInput { result: r, data }
    };

    let mut inputs: Vec<SynthesisInput> = results.into_iter().map(serialize).collect();
    let mut estimated = estimate_tokens(inputs.iter().map(|i| i.data.as_str()));
    if estimated <= settings.token_budget {
        return Selection {
            inputs,
            truncated: false,
            estimated_tokens: estimated,
        };
    }

    let results: Vec<TaskResult> = inputs.into_iter().map(|i| i.result).collect();
    let before = results.len();
    let kept = match settings.truncation {
        TruncationPolicy::LatestPerType => latest_per(results, |r| r.task_type),
        TruncationPolicy::LatestPerTypeAndProduct => {
            latest_per(results, |r| (r.task_type, r.product_name.clone()))
        }
    };
    info!(
        before,
        after = kept.len(),
        policy = ?settings.truncation,
        "Synthesis input over budget, applying truncation policy"
    );

    inputs = kept.into_iter().map(serialize).collect();
    estimated = estimate_tokens(inputs.iter().map(|i| i.data.as_str()));
    if estimated > settings.token_budget && !inputs.is_empty() {
        let share = settings.token_budget * CHARS_PER_TOKEN / inputs.len();
        for input in &mut inputs {
            if input.data.chars().count() > share {
                input.data = truncate_chars(&input.data, share).to_string();
            }
        }
        estimated = estimate_tokens(inputs.iter().map(|i| i.data.as_str()));
    }

    Selection {
        inputs,
        truncated: true,
        estimated_tokens: estimated,
    }
}

fn task_label(task_type: TaskType) -> &'static str {
    DEFAULT_ROUTES
        .iter()
        .find(|r| r.task_type == task_type)
        .map_or(task_type.as_str(), |r| r.name)
}

/// Prompt body with the inputs grouped by task type
fn grouped_prompt(inputs: &[SynthesisInput], product: Option<&str>) -> String {
    let mut prompt = match product {
        Some(p) => format!("'{p}'에 대한 분석 결과입니다.\n"),
        None => String::from("세션에서 수행된 분석 결과입니다.\n"),
    };
    for task_type in TaskType::ALL {
        let group: Vec<&SynthesisInput> = inputs
            .iter()
            .filter(|i| i.result.task_type == task_type)
            .collect();
        if group.is_empty() {
            continue;
        }
        prompt.push_str(&format!("\n## {}\n", task_label(task_type)));
        for input in group {
            prompt.push_str(&format!(
                "- [{}] {}: {}\n",
                input.result.created_at.format("%Y-%m-%d %H:%M"),
                input.result.product_name.as_deref().unwrap_or("-"),
                input.data
            ));
        }
    }
    prompt.push_str("\n위 결과를 통합하여 마케팅 전략 종합 보고서를 작성하세요.");
    prompt
}

/// Split a markdown narrative on its `#` headings
pub(crate) fn narrative_sections(narrative: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    for line in narrative.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim();
            if !heading.is_empty() {
                sections.push((heading.to_string(), String::new()));
                continue;
            }
        }
        match sections.last_mut() {
            Some((_, body)) => {
                body.push_str(line);
                body.push('\n');
            }
            None if !trimmed.is_empty() => {
                sections.push(("종합 분석".to_string(), format!("{line}\n")));
            }
            None => {}
        }
    }
    sections
        .into_iter()
        .map(|(heading, body)| (heading, body.trim().to_string()))
        .collect()
}

/// Cross-task strategy report
#[derive(Debug, Default, Clone, Copy)]
pub struct SynthesisAgent;

#[async_trait::async_trait]
impl Agent for SynthesisAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Synthesis
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let settings = &ctx.settings.synthesis;
        let product = subject::synthesis_product_filter(&input.message);

        let results: Vec<TaskResult> = ctx
            .store
            .list_task_results(input.session_id)
            .await?
            .into_iter()
            .filter(|r| r.task_type != TaskType::Synthesis)
            .filter(|r| match &product {
                Some(p) => r.product_name.as_deref() == Some(p.as_str()),
                None => true,
            })
            .collect();

        if results.len() < settings.min_results {
            return Err(Error::InsufficientData {
                found: results.len(),
                required: settings.min_results,
                product,
            });
        }

        let selection = select_inputs(results, settings);
        if selection.truncated {
            warn!(
                kept = selection.inputs.len(),
                estimated_tokens = selection.estimated_tokens,
                "Synthesis inputs truncated"
            );
        }

        let prompt = grouped_prompt(&selection.inputs, product.as_deref());
        let narrative = ctx.complete(SYNTHESIS_SYSTEM_PROMPT, &prompt).await?;

        let tasks: Vec<_> = selection
            .inputs
            .iter()
            .map(|i| {
                json!({
                    "id": i.result.id,
                    "task_type": i.result.task_type,
                    "product_name": i.result.product_name,
                    "created_at": i.result.created_at,
                })
            })
            .collect();
        let num_tasks = selection.inputs.len();

        let mut covered: Vec<TaskType> = selection.inputs.iter().map(|i| i.result.task_type).collect();
        covered.sort();
        covered.dedup();
        let labels: Vec<&str> = covered.iter().map(|t| task_label(*t)).collect();

        let payload = json!({
            "num_tasks": num_tasks,
            "tasks": tasks,
            "product_name": product,
            "synthesis": narrative,
            "truncated": selection.truncated,
            "estimated_tokens": selection.estimated_tokens,
        });

        let title = match &product {
            Some(p) => format!("{p} 마케팅 전략 종합 보고서"),
            None => "마케팅 전략 종합 보고서".to_string(),
        };
        let mut document = ReportDocument::new(title).with_subtitle(format!(
            "분석 {num_tasks}건 종합: {}",
            labels.join(", ")
        ));
        for (heading, body) in narrative_sections(&narrative) {
            document = document.section(ReportSection::new(heading).paragraph(strip_markdown(&body)));
        }

        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::Synthesis,
                product.as_deref(),
                payload,
                &document,
                ArtifactFormat::Pdf,
                &format!(
                    "마케팅 전략 종합 ({})\n{}",
                    labels.join(", "),
                    truncate_chars(&narrative, 1000)
                ),
            )
            .await?;

        info!(tasks = num_tasks, truncated = selection.truncated, "Synthesis completed");

        let summary = narrative_sections(&narrative)
            .into_iter()
            .next()
            .map(|(_, body)| body)
            .unwrap_or_default();
        let mut text = String::from("✅ 마케팅 전략 종합 보고서 생성 완료\n\n");
        if let Some(p) = &product {
            text.push_str(&format!("대상 제품: {p}\n"));
        }
        text.push_str(&format!(
            "총 {num_tasks}개의 분석 결과를 종합했습니다.\n포함된 분석: {}\n",
            labels.join(", ")
        ));
        if selection.truncated {
            text.push_str("분석 결과가 많아 태스크별 최신 결과 위주로 요약했습니다.\n");
        }
        if !summary.is_empty() {
            text.push_str(&format!(
                "\n**Executive Summary:**\n{}\n",
                truncate_chars(&strip_markdown(&summary), 300)
            ));
        }
        if persisted.artifact.is_some() {
            text.push_str("\n📄 **종합 보고서 PDF**가 생성되었습니다. 다운로드하여 전체 전략과 실행 계획을 확인하세요.");
        }

        Ok(AgentReply::completed(text, persisted))
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support;
    use super::*;
    use chrono::{Duration, Utc};
    use mercato_llm::MockProvider;
    use mercato_store::NewTaskResult;
    use uuid::Uuid;

    const NARRATIVE: &str = "# Executive Summary\n에어팟 프로는 **프리미엄** 수요가 견조합니다.\n\n\
# 시장 환경 분석\n검색량 상승\n# 고객 인사이트\n세 그룹\n# 마케팅 전략 제안\n가치 소구\n# 실행 계획\n1. 리뷰 캠페인";

    fn result(task_type: TaskType, product: &str, minutes: i64, size: usize) -> TaskResult {
        TaskResult {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            task_type,
            product_name: Some(product.to_string()),
            result_data: json!({ "body": "가".repeat(size) }),
            pdf_path: None,
            html_path: None,
            created_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_select_within_budget_keeps_everything() {
        let results = vec![
            result(TaskType::Trend, "a", 0, 10),
            result(TaskType::Trend, "a", 1, 10),
        ];
        let selection = select_inputs(results, &SynthesisSettings::default());
        assert!(!selection.truncated);
        assert_eq!(selection.inputs.len(), 2);
    }

    #[test]
    fn test_select_latest_per_type() {
        let settings = SynthesisSettings {
            token_budget: 100,
            ..SynthesisSettings::default()
        };
        let results = vec![
            result(TaskType::Segment, "a", 0, 200),
            result(TaskType::Trend, "a", 1, 50),
            result(TaskType::Segment, "b", 2, 50),
        ];
        let newest_segment = results[2].id;
        let selection = select_inputs(results, &settings);
        assert!(selection.truncated);
        let kept: Vec<_> = selection.inputs.iter().map(|i| i.result.task_type).collect();
        assert_eq!(kept, vec![TaskType::Trend, TaskType::Segment]);
        assert_eq!(selection.inputs[1].result.id, newest_segment);
    }

    #[test]
    fn test_select_latest_per_type_and_product_then_clips() {
        let settings = SynthesisSettings {
            token_budget: 100,
            truncation: TruncationPolicy::LatestPerTypeAndProduct,
            ..SynthesisSettings::default()
        };
        let results = vec![
            result(TaskType::Segment, "a", 0, 400),
            result(TaskType::Segment, "b", 1, 400),
            result(TaskType::Segment, "b", 2, 400),
        ];
        let selection = select_inputs(results, &settings);
        assert_eq!(selection.inputs.len(), 2);
        for input in &selection.inputs {
            assert!(input.data.chars().count() <= 150);
        }
        assert!(selection.estimated_tokens <= 100);
    }

    #[test]
    fn test_narrative_sections() {
        let sections = narrative_sections(NARRATIVE);
        assert_eq!(sections.len(), 5);
        assert_eq!(sections[0].0, "Executive Summary");
        assert_eq!(sections[4].1, "1. 리뷰 캠페인");

        let plain = narrative_sections("그냥 텍스트");
        assert_eq!(plain, vec![("종합 분석".to_string(), "그냥 텍스트".to_string())]);
    }

    async fn seed(ctx: &AgentContext, session_id: Uuid, task_type: TaskType, product: &str) {
        ctx.store
            .save_task_result(
                NewTaskResult::new(session_id, task_type, json!({"product_name": product}))
                    .with_product(product),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insufficient_results() {
        let (ctx, _dir) = test_support::context(MockProvider::new()).await;
        let session = ctx.store.create_session().await.unwrap();
        seed(&ctx, session.id, TaskType::Segment, "에어팟 프로").await;

        let err = SynthesisAgent
            .run(&ctx, &AgentInput::new(session.id, "종합 보고서 만들어줘"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                found: 1,
                required: 2,
                product: None
            }
        ));
    }

    #[tokio::test]
    async fn test_product_filter_applies_before_precondition() {
        let (ctx, _dir) = test_support::context(MockProvider::new()).await;
        let session = ctx.store.create_session().await.unwrap();
        seed(&ctx, session.id, TaskType::Segment, "에어팟 프로").await;
        seed(&ctx, session.id, TaskType::Trend, "스마트워치").await;

        let err = SynthesisAgent
            .run(&ctx, &AgentInput::new(session.id, "에어팟 프로 종합 보고서"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData { found: 1, .. }));
    }

    #[tokio::test]
    async fn test_run_writes_pdf() {
        let mock = MockProvider::new();
        mock.push_response(NARRATIVE);
        let (ctx, _dir) = test_support::context(mock.clone()).await;
        let session = ctx.store.create_session().await.unwrap();
        seed(&ctx, session.id, TaskType::Segment, "에어팟 프로").await;
        seed(&ctx, session.id, TaskType::Segment, "에어팟 프로").await;

        let reply = SynthesisAgent
            .run(&ctx, &AgentInput::new(session.id, "종합 보고서 만들어줘"))
            .await
            .unwrap();

        assert!(reply.reply_text.starts_with("✅ 마케팅 전략 종합 보고서 생성 완료"));
        assert!(reply.reply_text.contains("프리미엄 수요"));
        let artifact = reply.artifact.unwrap();
        assert!(artifact.file_name.starts_with("synthesis_report_"));
        assert!(artifact.file_name.ends_with(".pdf"));

        let data = reply.result_data.unwrap();
        assert_eq!(data["num_tasks"], 2);
        assert_eq!(data["truncated"], false);
        assert!(data["product_name"].is_null());

        let prompt = &mock.requests()[0].messages[1].content;
        assert!(prompt.contains("## 사용자 세그먼트 분류"));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let (ctx, _dir) = test_support::context(MockProvider::failing()).await;
        let session = ctx.store.create_session().await.unwrap();
        seed(&ctx, session.id, TaskType::Trend, "스마트워치").await;
        seed(&ctx, session.id, TaskType::Review, "스마트워치").await;

        let err = SynthesisAgent
            .run(&ctx, &AgentInput::new(session.id, "전체 정리해줘"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
