//! Ad copy generation agent

use super::context::{history_block, recall_block, AgentContext};
use super::{parse_json, Agent, AgentInput, AgentReply};
use crate::error::Result;
use crate::subject;
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_TONES: [&str; 3] = ["friendly", "formal", "humor"];
const DEFAULT_LENGTHS: [&str; 3] = ["short", "medium", "long"];

/// Expressions advertising rules do not allow without substantiation
pub const FORBIDDEN_EXPRESSIONS: [&str; 8] = [
    "최고", "최저", "국내 1위", "보장", "완벽", "100%", "무조건", "전액",
];

const BRIEF_SYSTEM_PROMPT: &str = "사용자의 광고 문구 요청에서 제품 브리프를 추출해 JSON 으로만 답하세요. \
형식: {\"product_name\": \"\", \"target_audience\": \"\", \"key_features\": [], \"campaign_goal\": \"\", \
\"tone_preferences\": [], \"length_preferences\": []}. \
톤은 friendly/formal/humor/casual, 길이는 short/medium/long 중에서 고르고, 언급이 없으면 빈 배열로 두세요. \
제품을 알 수 없으면 product_name 을 빈 문자열로 두세요.";

const COPY_SYSTEM_PROMPT: &str = "당신은 한국 이커머스 전문 카피라이터입니다. \
요청된 톤과 길이 조합마다 광고 문구를 작성하고 JSON 배열로만 답하세요. \
형식: [{\"tone\": \"friendly\", \"length\": \"short\", \"copy\": \"...\"}]. \
short 는 20자 내외, medium 은 1~2문장, long 은 3~4문장입니다. \
'최고', '100%', '보장' 같은 과장 표현은 쓰지 마세요.";

/// Product brief extracted from a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdBrief {
    /// Product or service
    pub product_name: String,
    /// Intended audience
    pub target_audience: String,
    /// Selling points
    pub key_features: Vec<String>,
    /// Campaign goal
    pub campaign_goal: String,
    /// Requested tones
    pub tone_preferences: Vec<String>,
    /// Requested lengths
    pub length_preferences: Vec<String>,
}

impl AdBrief {
    fn has_product(&self) -> bool {
        !self.product_name.trim().is_empty()
    }
}

/// One generated copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopy {
    /// Copy text
    #[serde(alias = "copy")]
    pub text: String,
    /// Tone slot
    pub tone: String,
    /// Length slot
    pub length: String,
}

/// Forbidden expressions found in a copy
#[must_use]
pub fn compliance_issues(text: &str) -> Vec<&'static str> {
    FORBIDDEN_EXPRESSIONS
        .iter()
        .copied()
        .filter(|word| text.contains(word))
        .collect()
}

fn normalize_options(values: &[String], default: &[&str]) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim().to_lowercase();
        if !value.is_empty() && !options.contains(&value) {
            options.push(value);
        }
    }
    if options.is_empty() {
        default.iter().map(|s| (*s).to_string()).collect()
    } else {
        options
    }
}

fn tone_label(tone: &str) -> &str {
    match tone {
        "formal" => "공식적",
        "friendly" => "친근함",
        "humor" => "유머러스",
        "casual" => "편안함",
        other => other,
    }
}

fn length_label(length: &str) -> &str {
    match length {
        "short" => "짧게",
        "medium" => "중간",
        "long" => "길게",
        other => other,
    }
}

/// Copies from a reply that is not JSON: one per non-empty line, assigned
/// round-robin to the requested slots
fn copies_from_lines(reply: &str, slots: &[(String, String)]) -> Vec<AdCopy> {
    if slots.is_empty() {
        return Vec::new();
    }
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || "-*•.) ".contains(c))
                .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        })
        .filter(|line| !line.is_empty() && !line.starts_with(['{', '[', '`', '#']))
        .enumerate()
        .map(|(i, line)| {
            let (tone, length) = &slots[i % slots.len()];
            AdCopy {
                text: line.to_string(),
                tone: tone.clone(),
                length: length.clone(),
            }
        })
        .collect()
}

/// Ad copy matrix over tone × length, with a compliance check
#[derive(Debug, Default, Clone, Copy)]
pub struct AdCopyAgent;

impl AdCopyAgent {
    async fn brief(&self, ctx: &AgentContext, input: &AgentInput) -> Result<Option<AdBrief>> {
        let parsed: Option<AdBrief> = ctx
            .complete_json(BRIEF_SYSTEM_PROMPT, &input.message)
            .await
            .filter(AdBrief::has_product);
        if parsed.is_some() {
            return Ok(parsed);
        }

        if let Some(product) = subject::ad_product(&input.message) {
            return Ok(Some(AdBrief {
                product_name: product,
                ..AdBrief::default()
            }));
        }

        self.previous_brief(ctx, input.session_id).await
    }

    async fn previous_brief(&self, ctx: &AgentContext, session_id: Uuid) -> Result<Option<AdBrief>> {
        let previous = ctx
            .store
            .latest_task_result(session_id, Some(TaskType::AdCopy))
            .await?;
        Ok(previous
            .and_then(|r| serde_json::from_value::<AdBrief>(r.result_data["brief"].clone()).ok())
            .filter(AdBrief::has_product))
    }
}

#[async_trait::async_trait]
impl Agent for AdCopyAgent {
    fn task_type(&self) -> TaskType {
        TaskType::AdCopy
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let Some(brief) = self.brief(ctx, input).await? else {
            return Ok(AgentReply::text(
                "제품이나 서비스 정보를 찾을 수 없습니다. 예시) \
                 '친환경 세제에 대한 광고 문구를 친근한 톤으로 3개 만들어줘'처럼 \
                 제품명, 특징, 원하는 톤을 함께 알려주시면 도움이 됩니다.",
            ));
        };
        let product = brief.product_name.trim().to_string();
        let tones = normalize_options(&brief.tone_preferences, &DEFAULT_TONES);
        let lengths = normalize_options(&brief.length_preferences, &DEFAULT_LENGTHS);
        let per_slot = if input.continuation { 3 } else { 2 };

        let slots: Vec<(String, String)> = tones
            .iter()
            .flat_map(|t| lengths.iter().map(move |l| (t.clone(), l.clone())))
            .collect();

        let recalled = ctx.recall(&product, TaskType::AdCopy).await;
        let mut prompt = format!(
            "제품: {product}\n타깃: {}\n특징: {}\n캠페인 목표: {}\n톤: {}\n길이: {}\n조합마다 {per_slot}개씩 작성하세요.",
            brief.target_audience,
            brief.key_features.join(", "),
            brief.campaign_goal,
            tones.join(", "),
            lengths.join(", "),
        );
        if input.continuation {
            prompt.push_str("\n이전에 제공한 문구와 겹치지 않도록 새로운 관점과 표현을 사용하세요.");
        }
        prompt.push_str(&recall_block(&recalled));
        prompt.push_str(&history_block(&input.history));

        // No local fallback for copy itself
        let reply = ctx.complete(COPY_SYSTEM_PROMPT, &prompt).await?;
        let copies: Vec<AdCopy> = match parse_json::<Vec<AdCopy>>(&reply) {
            Some(copies) => copies
                .into_iter()
                .filter(|c| !c.text.trim().is_empty())
                .collect(),
            None => copies_from_lines(&reply, &slots),
        };

        if copies.is_empty() {
            return Ok(AgentReply::text(
                "광고 문구를 생성하지 못했습니다. 제품 정보 또는 원하는 톤/길이를 더 구체적으로 알려주세요.",
            ));
        }

        let issues: Vec<serde_json::Value> = copies
            .iter()
            .filter_map(|c| {
                let found = compliance_issues(&c.text);
                (!found.is_empty()).then(|| {
                    json!({"text": c.text, "tone": c.tone, "length": c.length, "issues": found})
                })
            })
            .collect();
        let compliance_passed = issues.is_empty();
        let mut used_tones: Vec<String> = Vec::new();
        for copy in &copies {
            if !used_tones.contains(&copy.tone) {
                used_tones.push(copy.tone.clone());
            }
        }

        let payload = json!({
            "product_name": product,
            "target_audience": brief.target_audience,
            "brief": brief,
            "ad_copies": copies,
            "total_variations": copies.len(),
            "tones": used_tones,
            "compliance_passed": compliance_passed,
            "compliance_issues": issues,
        });

        let mut document = ReportDocument::new(format!("{product} 광고 문구 제안"))
            .section(ReportSection::new("브리프").bullets(
                [
                    format!("제품: {product}"),
                    format!("타깃: {}", brief.target_audience),
                    format!("특징: {}", brief.key_features.join(", ")),
                    format!("캠페인 목표: {}", brief.campaign_goal),
                ]
                .into_iter()
                .filter(|line| !line.trim_end().ends_with(':')),
            ));
        if !brief.target_audience.is_empty() {
            document = document.with_subtitle(format!("타깃: {}", brief.target_audience));
        }
        for tone in &used_tones {
            let rows = copies
                .iter()
                .filter(|c| &c.tone == tone)
                .map(|c| {
                    let check = if compliance_issues(&c.text).is_empty() {
                        "통과".to_string()
                    } else {
                        format!("보완: {}", compliance_issues(&c.text).join(", "))
                    };
                    vec![length_label(&c.length).to_string(), c.text.clone(), check]
                })
                .collect();
            document = document.section(
                ReportSection::new(format!("톤: {}", tone_label(tone))).table(
                    vec!["길이".to_string(), "문구".to_string(), "검수".to_string()],
                    rows,
                ),
            );
        }

        let summary = copies
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::AdCopy,
                Some(&product),
                payload,
                &document,
                ArtifactFormat::Pdf,
                &format!("{product} 광고 문구\n{summary}"),
            )
            .await?;

        info!(product = %product, copies = copies.len(), compliance_passed, "Ad copy generated");

        let passed = copies.len() - issues.len();
        let mut lines = vec![format!("✍️ **{product} 광고 문구 제안**")];
        if !brief.target_audience.is_empty() {
            lines.push(format!("- 타깃: {}", brief.target_audience));
        }
        if !brief.campaign_goal.is_empty() {
            lines.push(format!("- 캠페인 목표: {}", brief.campaign_goal));
        }
        if input.continuation {
            lines.push(String::new());
            lines.push("🔁 추가 요청을 반영해 새로운 문구를 제안합니다.".to_string());
        }
        lines.push(String::new());
        lines.push(format!(
            "총 {}개의 카피를 길이·톤 조합으로 구성했습니다:",
            copies.len()
        ));
        for tone in &used_tones {
            lines.push(format!("\n**톤: {}**", tone_label(tone)));
            for copy in copies.iter().filter(|c| &c.tone == tone) {
                lines.push(format!("- {}: {}", length_label(&copy.length), copy.text.trim()));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "✅ 규제 검수 통과: {passed}개 / ⚠️ 보완 필요: {}개",
            issues.len()
        ));
        if !compliance_passed {
            lines.push(
                "보완이 필요한 카피는 금지어 또는 표현 제한과 충돌합니다. 해당 표현을 수정하세요."
                    .to_string(),
            );
        }
        lines.push(String::new());
        lines.push(
            "⚠️ 본 결과는 마케팅 참고용 초안입니다. 최종 사용 전 관련 법규와 브랜드 가이드를 다시 확인하세요."
                .to_string(),
        );

        Ok(AgentReply::completed(lines.join("\n"), persisted))
    }
}
