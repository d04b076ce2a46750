//! Review sentiment agent

use super::context::{recall_block, AgentContext};
use super::{strip_markdown, Agent, AgentInput, AgentReply};
use crate::error::Result;
use crate::subject;
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, instrument};

const MAX_REVIEWS: usize = 30;
const TOPIC_COUNT: usize = 5;

const POSITIVE_WORDS: &[&str] = &[
    "좋아", "좋네", "좋은", "만족", "추천", "훌륭", "편하", "편해", "빠르", "빨랐", "기대 이상",
    "세련", "최고", "굿", "great", "good",
];

const NEGATIVE_WORDS: &[&str] = &[
    "아쉬", "불편", "비싸", "끊겨", "끊김", "허술", "닳", "어려웠", "별로", "실망", "고장", "느려",
    "bad",
];

const TOPIC_STOPWORDS: &[&str] = &[
    "정말", "너무", "조금", "그냥", "진짜", "생각보다", "했는데", "있어요", "좋아요", "같아요",
    "합니다", "습니다", "입니다", "해서", "하는", "매일", "처음엔", "다만", "확실히", "기대",
];

const IMPROVEMENT_RULES: &[(&[&str], &str)] = &[
    (&["배터리", "닳"], "배터리 지속 시간 개선"),
    (&["비싸", "가격"], "가격 경쟁력 확보 (프로모션, 번들 구성)"),
    (&["끊겨", "끊김", "연결", "펌웨어"], "연결 안정성 및 펌웨어 품질 개선"),
    (&["포장", "배송"], "배송 및 포장 품질 개선"),
    (&["어려웠", "어려워", "복잡"], "초기 사용 가이드 및 온보딩 강화"),
    (&["고장", "불량"], "품질 관리 및 A/S 정책 강화"),
];

const REVIEW_SYSTEM_PROMPT: &str = r#"당신은 시장 분석 전문가이며, 그 중에서도 뛰어난 구매자 리뷰 감성 분석가입니다.
주어진 제품 리뷰를 긍정, 부정, 중립으로 분류하고 전체 감성 분포와 평균 점수(0~1)를 계산하세요.
리뷰 요약과 개선이 필요한 영역도 함께 제시하세요.
다음 형식의 JSON으로만 응답하세요:
{
    "sentiment_distribution": {"positive": 0, "negative": 0, "neutral": 0},
    "average_score": 0.0,
    "summary": "리뷰 요약",
    "improvements": ["개선 영역"],
    "overall_insights": "전체적인 인사이트"
}"#;

/// Review counts per polarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentDistribution {
    /// Positive reviews
    pub positive: usize,
    /// Negative reviews
    pub negative: usize,
    /// Neutral reviews
    pub neutral: usize,
}

impl SentimentDistribution {
    fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Sentiment analysis outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentAnalysis {
    /// Polarity counts
    pub sentiment_distribution: SentimentDistribution,
    /// Mean score in 0..=1
    pub average_score: f64,
    /// Short summary
    pub summary: String,
    /// Areas to improve
    pub improvements: Vec<String>,
    /// Overall takeaway
    pub overall_insights: String,
}

fn count_hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

/// Lexicon-based sentiment used when the model gives nothing usable
#[must_use]
pub fn lexicon_sentiment(reviews: &[String], product: &str) -> SentimentAnalysis {
    let mut distribution = SentimentDistribution::default();
    let mut score_sum = 0.0;

    for review in reviews {
        let lower = review.to_lowercase();
        let positive = count_hits(&lower, POSITIVE_WORDS) as f64;
        let negative = count_hits(&lower, NEGATIVE_WORDS) as f64;
        if positive > negative {
            distribution.positive += 1;
        } else if negative > positive {
            distribution.negative += 1;
        } else {
            distribution.neutral += 1;
        }
        score_sum += (0.5 + 0.25 * (positive - negative)).clamp(0.0, 1.0);
    }

    let average_score = if reviews.is_empty() {
        0.0
    } else {
        (score_sum / reviews.len() as f64 * 100.0).round() / 100.0
    };

    let tone = if distribution.positive > distribution.negative {
        "대체로 긍정적인"
    } else if distribution.negative > distribution.positive {
        "부정적인 의견이 많은"
    } else {
        "긍정과 부정이 엇갈리는"
    };

    SentimentAnalysis {
        sentiment_distribution: distribution,
        average_score,
        summary: format!(
            "{product} 리뷰 {}건 중 긍정 {}건, 부정 {}건, 중립 {}건으로 {tone} 반응입니다.",
            reviews.len(),
            distribution.positive,
            distribution.negative,
            distribution.neutral
        ),
        improvements: improvement_areas(reviews),
        overall_insights: format!(
            "{product} 구매자 반응은 {tone} 편이며, 부정 리뷰에서 언급된 불편 요소를 우선 개선하는 것이 좋습니다."
        ),
    }
}

/// Rule-based improvement areas from review text
#[must_use]
pub fn improvement_areas(reviews: &[String]) -> Vec<String> {
    let joined = reviews.join("\n");
    let mut areas: Vec<String> = IMPROVEMENT_RULES
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| joined.contains(t)))
        .map(|(_, area)| (*area).to_string())
        .collect();
    if areas.is_empty() {
        areas.push("고객 피드백 지속 모니터링".to_string());
    }
    areas
}

fn strip_particle(token: &str) -> &str {
    const PARTICLES: [char; 10] = ['이', '가', '은', '는', '을', '를', '도', '에', '의', '로'];
    match token.chars().last() {
        Some(last) if token.chars().count() > 2 && PARTICLES.contains(&last) => {
            &token[..token.len() - last.len_utf8()]
        }
        _ => token,
    }
}

/// Most frequent tokens (2+ characters, stopwords and product words removed)
#[must_use]
pub fn extract_topics(reviews: &[String], product: &str, limit: usize) -> Vec<String> {
    let product_words: Vec<String> = product
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for review in reviews {
        for raw in review.split(|c: char| !c.is_alphanumeric()) {
            let token = strip_particle(&raw.to_lowercase()).to_string();
            if token.chars().count() < 2
                || TOPIC_STOPWORDS.contains(&token.as_str())
                || product_words.contains(&token)
                || token.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }
            let entry = counts.entry(token).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(limit).map(|(t, _)| t).collect()
}

/// Review sentiment, topics and improvement areas
#[derive(Debug, Default, Clone, Copy)]
pub struct ReviewAgent;

#[async_trait::async_trait]
impl Agent for ReviewAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Review
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let Some(product) = subject::product_name(&input.message) else {
            return Ok(AgentReply::text(
                "분석할 제품명을 알려주세요. 예: '에어팟 프로 리뷰 분석해줘'",
            ));
        };

        let fetched = ctx.gateway.reviews(&product, MAX_REVIEWS).await;
        let data_source = fetched.source;
        let reviews: Vec<String> = fetched
            .data
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if reviews.is_empty() {
            return Ok(AgentReply::text(format!(
                "'{product}'에 대한 리뷰 데이터를 찾을 수 없습니다. 다른 제품을 시도해보세요."
            )));
        }

        let recalled = ctx.recall(&product, TaskType::Review).await;
        let prompt = format!(
            "다음은 {product} 제품에 대한 리뷰 데이터입니다:\n\n{}\n\n\
             위 리뷰를 분석하여 감성 분포와 평균 점수를 계산하고 요약과 개선 영역을 제시하세요.{}",
            reviews.join("\n---\n"),
            recall_block(&recalled),
        );

        let mut analysis = ctx
            .complete_json::<SentimentAnalysis>(REVIEW_SYSTEM_PROMPT, &prompt)
            .await
            .filter(|a| a.sentiment_distribution.total() > 0)
            .unwrap_or_else(|| lexicon_sentiment(&reviews, &product));
        if analysis.improvements.is_empty() {
            analysis.improvements = improvement_areas(&reviews);
        }
        let topics = extract_topics(&reviews, &product, TOPIC_COUNT);
        let distribution = analysis.sentiment_distribution;

        let payload = json!({
            "product_name": product,
            "total_reviews": reviews.len(),
            "sentiment_distribution": distribution,
            "average_score": analysis.average_score,
            "topics": topics,
            "summary": analysis.summary,
            "improvements": analysis.improvements,
            "overall_insights": analysis.overall_insights,
            "data_source": data_source.as_str(),
        });

        let document = ReportDocument::new(format!("{product} 리뷰 감성 분석"))
            .with_subtitle(format!(
                "리뷰 {}건 기반 ({})",
                reviews.len(),
                data_source.as_str()
            ))
            .section(ReportSection::new("감성 분포").table(
                vec!["구분".to_string(), "리뷰 수".to_string()],
                vec![
                    vec!["긍정".to_string(), distribution.positive.to_string()],
                    vec!["부정".to_string(), distribution.negative.to_string()],
                    vec!["중립".to_string(), distribution.neutral.to_string()],
                    vec!["평균 점수".to_string(), format!("{:.2}", analysis.average_score)],
                ],
            ))
            .section(ReportSection::new("주요 토픽").bullets(topics.iter()))
            .section(ReportSection::new("리뷰 요약").paragraph(strip_markdown(&analysis.summary)))
            .section(ReportSection::new("전체 인사이트").paragraph(&analysis.overall_insights))
            .section(ReportSection::new("개선이 필요한 영역").bullets(analysis.improvements.iter()));

        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::Review,
                Some(&product),
                payload,
                &document,
                ArtifactFormat::Pdf,
                &format!(
                    "{product} 리뷰 감성: 긍정 {} 부정 {} 중립 {}\n{}",
                    distribution.positive,
                    distribution.negative,
                    distribution.neutral,
                    analysis.summary
                ),
            )
            .await?;

        info!(product = %product, reviews = reviews.len(), "Review analysis completed");

        let mut text = format!(
            "✅ **{product} 구매자 리뷰 감성 분석 완료**\n\n\
             📊 **감성 분석 결과:**\n\
             전체 리뷰 수: {}\n\
             긍정 리뷰 수: {}\n\
             부정 리뷰 수: {}\n\
             중립 리뷰 수: {}\n\
             평균 점수: {:.2}\n\n\
             📖 **주요 토픽:**\n{}\n\n\
             ✒️ **리뷰 요약:**\n{}\n\n\
             👁️ **전체 인사이트:**\n{}\n\n\
             🛠️ **개선이 필요한 영역:**\n- {}",
            reviews.len(),
            distribution.positive,
            distribution.negative,
            distribution.neutral,
            analysis.average_score,
            topics.join(", "),
            analysis.summary,
            analysis.overall_insights,
            analysis.improvements.join("\n- "),
        );
        if persisted.artifact.is_some() {
            text.push_str("\n\n📄 리뷰 분석 리포트 PDF가 생성되었습니다.");
        }

        Ok(AgentReply::completed(text, persisted))
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support;
    use super::*;
    use mercato_llm::MockProvider;

    fn reviews(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_lexicon_sentiment() {
        let analysis = lexicon_sentiment(
            &reviews(&[
                "정말 좋아요 만족합니다",
                "배터리가 빨리 닳아서 아쉬워요",
                "그럭저럭 씁니다",
            ]),
            "버즈",
        );
        assert_eq!(
            analysis.sentiment_distribution,
            SentimentDistribution {
                positive: 1,
                negative: 1,
                neutral: 1
            }
        );
        assert_eq!(analysis.average_score, 0.5);
        assert!(analysis.improvements.contains(&"배터리 지속 시간 개선".to_string()));
    }

    #[test]
    fn test_improvement_default() {
        assert_eq!(
            improvement_areas(&reviews(&["좋아요"])),
            vec!["고객 피드백 지속 모니터링".to_string()]
        );
    }

    #[test]
    fn test_extract_topics_ranks_by_frequency() {
        let topics = extract_topics(
            &reviews(&[
                "에어팟 배터리가 좋아요",
                "배터리 오래가요, 음질도 좋고",
                "음질 최고 배터리 굿",
            ]),
            "에어팟 프로",
            2,
        );
        assert_eq!(topics, vec!["배터리".to_string(), "음질".to_string()]);
    }

    #[tokio::test]
    async fn test_run_with_lexicon_fallback() {
        let (ctx, _dir) = test_support::context(MockProvider::failing()).await;
        let session = ctx.store.create_session().await.unwrap();

        let reply = ReviewAgent
            .run(&ctx, &AgentInput::new(session.id, "갤럭시 버즈 리뷰 분석해줘"))
            .await
            .unwrap();

        let data = reply.result_data.unwrap();
        assert_eq!(data["product_name"], "갤럭시 버즈");
        let dist = &data["sentiment_distribution"];
        let total = dist["positive"].as_u64().unwrap()
            + dist["negative"].as_u64().unwrap()
            + dist["neutral"].as_u64().unwrap();
        assert_eq!(total, data["total_reviews"].as_u64().unwrap());
        assert!(!data["topics"].as_array().unwrap().is_empty());
        assert!(reply.artifact.unwrap().file_name.starts_with("review_report_"));
    }

    #[tokio::test]
    async fn test_run_with_model_analysis() {
        let mock = MockProvider::new();
        mock.push_response(
            r#"{"sentiment_distribution": {"positive": 8, "negative": 2, "neutral": 2},
                "average_score": 0.72, "summary": "대체로 만족", "improvements": [],
                "overall_insights": "음질 호평"}"#,
        );
        let (ctx, _dir) = test_support::context(mock).await;
        let session = ctx.store.create_session().await.unwrap();

        let reply = ReviewAgent
            .run(&ctx, &AgentInput::new(session.id, "에어팟 프로 후기 정리"))
            .await
            .unwrap();

        let data = reply.result_data.unwrap();
        assert_eq!(data["average_score"], 0.72);
        assert_eq!(data["summary"], "대체로 만족");
        // Empty model improvements are filled by rules
        assert!(!data["improvements"].as_array().unwrap().is_empty());
    }
}
