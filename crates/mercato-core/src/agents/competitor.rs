//! Competitor analysis agent

use super::context::{recall_block, AgentContext};
use super::market::{self, MarketPositioning};
use super::{format_won, strip_markdown, Agent, AgentInput, AgentReply};
use crate::error::Result;
use crate::subject;
use mercato_gateway::{DataSource, MentionCounts, ShoppingItem, ShoppingQuery};
use std::collections::HashSet;
use mercato_llm::util::truncate_chars;
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

const LISTINGS_PER_QUERY: u32 = 10;
const MAX_UNNAMED_COMPETITORS: usize = 3;

const INFO_SYSTEM_PROMPT: &str = "사용자의 경쟁사 분석 요청에서 분석 대상 제품과 비교할 경쟁 제품을 추출해 JSON 으로만 답하세요. \
형식: {\"target\": \"제품명\", \"competitors\": [\"경쟁 제품\"], \"category\": \"카테고리\"}. \
경쟁 제품이 언급되지 않았으면 빈 배열, 제품을 알 수 없으면 target 을 빈 문자열로 두세요.";

const SWOT_SYSTEM_PROMPT: &str = "당신은 커머스 시장 분석가입니다. 가격 비교 데이터를 바탕으로 대상 제품의 SWOT 분석을 작성하고 JSON 으로만 답하세요. \
형식: {\"strengths\": [], \"weaknesses\": [], \"opportunities\": [], \"threats\": []}. 항목마다 2~4개씩 작성하세요.";

const STRATEGY_SYSTEM_PROMPT: &str = "당신은 마케팅 전략가입니다. SWOT 분석을 바탕으로 대상 제품의 차별화 전략을 \
포지셔닝, 가격, 채널, 메시지 관점에서 5줄 이내로 제안하세요.";

const POSITIONING_SYSTEM_PROMPT: &str = "당신은 시장 분석 전문가입니다. 추정 점유율과 가격 데이터로 시장 구조를 분석하고 JSON 으로만 답하세요. \
형식: {\"market_leader\": {\"product\": \"\", \"share\": 0, \"analysis\": \"\"}, \"challengers\": [], \"niche_players\": [], \
\"price_segments\": {\"premium\": [], \"mid_range\": [], \"budget\": []}, \"strategic_insights\": \"\"}. \
challengers 와 niche_players 의 항목은 market_leader 와 같은 형식입니다.";

/// Target and competitors named in the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    /// Product under analysis
    pub target: String,
    /// Named competitors
    pub competitors: Vec<String>,
    /// Product category
    pub category: String,
}

/// Lowest listing found for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Product searched for
    pub name: String,
    /// Lowest price in won
    pub lowest_price: u64,
    /// Mall offering it
    pub mall: String,
    /// Listing title
    pub title: String,
    /// Canonical brand
    pub brand: String,
    /// Distinct malls selling it
    pub mall_count: usize,
}

impl PriceEntry {
    fn from_item(name: &str, item: &ShoppingItem, mall_count: usize) -> Self {
        Self {
            name: name.to_string(),
            lowest_price: item.lprice,
            mall: item.mall_name.clone(),
            title: item.title.clone(),
            brand: market::infer_brand(&item.brand, name),
            mall_count: mall_count.max(1),
        }
    }
}

/// SWOT quadrants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Swot {
    /// Strengths
    pub strengths: Vec<String>,
    /// Weaknesses
    pub weaknesses: Vec<String>,
    /// Opportunities
    pub opportunities: Vec<String>,
    /// Threats
    pub threats: Vec<String>,
}

impl Swot {
    fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.opportunities.is_empty()
            && self.threats.is_empty()
    }
}

fn mall_count(items: &[ShoppingItem]) -> usize {
    items
        .iter()
        .filter(|item| item.lprice > 0 && !item.mall_name.trim().is_empty())
        .map(|item| item.mall_name.trim())
        .collect::<HashSet<_>>()
        .len()
}

fn lowest_listing(items: &[ShoppingItem]) -> Option<&ShoppingItem> {
    items
        .iter()
        .filter(|item| item.lprice > 0)
        .min_by_key(|item| item.lprice)
}

/// Target price relative to the competitor average, in percent
fn price_gap_pct(prices: &[PriceEntry]) -> Option<f64> {
    let (target, others) = prices.split_first()?;
    if others.is_empty() {
        return None;
    }
    let average = others.iter().map(|p| p.lowest_price as f64).sum::<f64>() / others.len() as f64;
    (average > 0.0).then(|| ((target.lowest_price as f64 - average) / average * 100.0).round())
}

/// SWOT derived from the price position alone
#[must_use]
pub fn price_position_swot(prices: &[PriceEntry], category: &str) -> Swot {
    let lines = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    match price_gap_pct(prices) {
        Some(gap) if gap < 0.0 => Swot {
            strengths: vec![format!("경쟁 제품 평균 대비 {:.0}% 낮은 가격", gap.abs())],
            weaknesses: lines(&["저가 이미지로 인한 프리미엄 인식 부족 가능성"]),
            opportunities: vec![
                "가격 민감 고객층 확대".to_string(),
                format!("{category} 카테고리 가성비 수요 공략"),
            ],
            threats: lines(&["경쟁사의 가격 인하 대응"]),
        },
        Some(gap) if gap > 0.0 => Swot {
            strengths: lines(&["프리미엄 포지셔닝 가능"]),
            weaknesses: vec![format!("경쟁 제품 평균 대비 {gap:.0}% 높은 가격")],
            opportunities: lines(&["차별화 기능 중심의 가치 소구"]),
            threats: lines(&["가성비 경쟁 제품으로의 고객 이탈"]),
        },
        Some(_) => Swot {
            strengths: lines(&["경쟁 제품과 동등한 가격 경쟁력"]),
            weaknesses: lines(&["가격 외 차별화 요소 부족 가능성"]),
            opportunities: lines(&["브랜드 경험과 서비스로 차별화"]),
            threats: lines(&["가격 경쟁 심화"]),
        },
        None => Swot {
            strengths: lines(&["시장 내 판매 채널 확보"]),
            weaknesses: lines(&["비교 가능한 경쟁 데이터 부족"]),
            opportunities: vec![format!("{category} 카테고리 신규 수요 발굴")],
            threats: lines(&["신규 경쟁 제품 진입"]),
        },
    }
}

/// Strategy text derived from the price position alone
#[must_use]
pub fn rule_strategy(target: &str, prices: &[PriceEntry]) -> String {
    match price_gap_pct(prices) {
        Some(gap) if gap < 0.0 => format!(
            "- 포지셔닝: '{target}'을 합리적인 가격의 실속형 선택지로 제시하세요.\n\
             - 가격: 현재 가격 우위를 유지하되 번들 구성으로 객단가를 높이세요.\n\
             - 메시지: 경쟁 제품 대비 가격 차이를 수치로 보여주세요."
        ),
        Some(gap) if gap > 0.0 => format!(
            "- 포지셔닝: '{target}'의 품질과 브랜드 경험을 전면에 내세우세요.\n\
             - 가격: 할인보다 사은품이나 보증 연장으로 가치를 보완하세요.\n\
             - 메시지: 가격 차이를 정당화하는 핵심 기능을 강조하세요."
        ),
        _ => format!(
            "- 포지셔닝: '{target}'만의 사용 경험과 서비스를 차별점으로 삼으세요.\n\
             - 채널: 리뷰와 커뮤니티 콘텐츠로 신뢰를 쌓으세요.\n\
             - 메시지: 구매 후 만족 사례를 중심으로 전달하세요."
        ),
    }
}

/// Price comparison, SWOT and differentiation strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct CompetitorAgent;

impl CompetitorAgent {
    async fn product_info(&self, ctx: &AgentContext, message: &str) -> Option<ProductInfo> {
        let mut info = ctx
            .complete_json::<ProductInfo>(INFO_SYSTEM_PROMPT, message)
            .await
            .filter(|i| !i.target.trim().is_empty())
            .or_else(|| {
                subject::competitor_subject(message).map(|(target, competitors)| ProductInfo {
                    target,
                    competitors,
                    category: String::new(),
                })
            })?;

        info.target = info.target.trim().to_string();
        info.competitors.retain(|c| !c.trim().is_empty() && *c != info.target);
        if info.category.trim().is_empty() {
            info.category = subject::product_category(&info.target).to_string();
        }
        Some(info)
    }

    /// Lowest listing per product; the target comes first
    async fn price_comparison(
        &self,
        ctx: &AgentContext,
        info: &ProductInfo,
    ) -> (Vec<PriceEntry>, DataSource) {
        let mut source = DataSource::Live;
        let target = ctx
            .gateway
            .products(&ShoppingQuery::new(&info.target).with_display(LISTINGS_PER_QUERY))
            .await;
        if target.is_synthetic() {
            source = DataSource::Synthetic;
        }

        let Some(lowest) = lowest_listing(&target.data) else {
            return (Vec::new(), source);
        };
        let mut prices = vec![PriceEntry::from_item(
            &info.target,
            lowest,
            mall_count(&target.data),
        )];

        if info.competitors.is_empty() {
            // Other listings in the same search stand in for competitors
            let mut others: Vec<&ShoppingItem> = target
                .data
                .iter()
                .filter(|item| item.lprice > 0 && item.title != lowest.title)
                .collect();
            others.sort_by_key(|item| item.lprice);
            prices.extend(
                others
                    .into_iter()
                    .take(MAX_UNNAMED_COMPETITORS)
                    .map(|item| PriceEntry::from_item(&item.title, item, 1)),
            );
            return (prices, source);
        }

        for competitor in &info.competitors {
            let fetched = ctx
                .gateway
                .products(&ShoppingQuery::new(competitor).with_display(LISTINGS_PER_QUERY))
                .await;
            if fetched.is_synthetic() {
                source = DataSource::Synthetic;
            }
            match lowest_listing(&fetched.data) {
                Some(item) => prices.push(PriceEntry::from_item(
                    competitor,
                    item,
                    mall_count(&fetched.data),
                )),
                None => warn!(competitor = %competitor, "No listings for competitor"),
            }
        }
        (prices, source)
    }

    /// Blog and cafe mentions per product, in `prices` order
    async fn mentions(
        &self,
        ctx: &AgentContext,
        prices: &[PriceEntry],
    ) -> (Vec<MentionCounts>, DataSource) {
        let mut source = DataSource::Live;
        let mut counts = Vec::with_capacity(prices.len());
        for entry in prices {
            let fetched = ctx.gateway.mentions(&entry.name).await;
            if fetched.is_synthetic() {
                source = DataSource::Synthetic;
            }
            counts.push(fetched.data);
        }
        (counts, source)
    }

    async fn positioning(
        &self,
        ctx: &AgentContext,
        prices: &[PriceEntry],
        shares: &[market::MarketShare],
        category: &str,
    ) -> MarketPositioning {
        let prompt = format!(
            "카테고리: {category}\n추정 점유율:\n{}\n가격:\n{}",
            serde_json::to_string(shares).unwrap_or_default(),
            serde_json::to_string(prices).unwrap_or_default(),
        );
        ctx.complete_json::<MarketPositioning>(POSITIONING_SYSTEM_PROMPT, &prompt)
            .await
            .filter(MarketPositioning::is_complete)
            .unwrap_or_else(|| market::rule_positioning(prices, shares, category))
    }
}

#[async_trait::async_trait]
impl Agent for CompetitorAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Competitor
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let Some(product_info) = self.product_info(ctx, &input.message).await else {
            return Ok(AgentReply::text(
                "제품명을 명확히 지정해주세요. 예: '아이폰 15와 갤럭시 S24 비교 분석해줘'",
            ));
        };
        let target = product_info.target.clone();

        let (prices, data_source) = self.price_comparison(ctx, &product_info).await;
        if prices.is_empty() {
            return Ok(AgentReply::text(format!(
                "'{target}'에 대한 데이터를 찾을 수 없습니다."
            )));
        }
        let competitor_count = prices.len() - 1;

        let recalled = ctx.recall(&target, TaskType::Competitor).await;
        let comparison = serde_json::to_string(&prices).unwrap_or_default();
        let swot_prompt = format!(
            "대상 제품: {target}\n카테고리: {}\n가격 비교 (첫 항목이 대상 제품):\n{comparison}{}",
            product_info.category,
            recall_block(&recalled),
        );
        let swot = ctx
            .complete_json::<Swot>(SWOT_SYSTEM_PROMPT, &swot_prompt)
            .await
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| price_position_swot(&prices, &product_info.category));

        let strategy_prompt = format!(
            "대상 제품: {target}\nSWOT:\n{}",
            serde_json::to_string(&swot).unwrap_or_default()
        );
        let strategy = match ctx.complete(STRATEGY_SYSTEM_PROMPT, &strategy_prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => rule_strategy(&target, &prices),
            Err(e) => {
                warn!(error = %e, "Strategy generation failed, using rule-based strategy");
                rule_strategy(&target, &prices)
            }
        };

        let (mentions, mention_source) = self.mentions(ctx, &prices).await;
        let benchmark = market::benchmark_scores(&prices);
        let shares = market::market_shares(&prices, &mentions);
        let positioning = self
            .positioning(ctx, &prices, &shares, &product_info.category)
            .await;
        let popularity: Vec<market::Popularity> = prices
            .iter()
            .zip(&mentions)
            .enumerate()
            .map(|(i, (entry, counts))| {
                market::popularity(entry, i + 1, &product_info.category, *counts)
            })
            .collect();

        let payload = json!({
            "product_info": product_info,
            "price_comparison": prices,
            "swot": swot,
            "strategy": strategy,
            "benchmark": benchmark,
            "market_shares": {
                "shares": shares,
                "positioning": positioning,
            },
            "popularity": popularity,
            "competitor_count": competitor_count,
            "data_source": data_source.as_str(),
            "mention_source": mention_source.as_str(),
        });

        let mut positioning_lines: Vec<String> = Vec::new();
        if let Some(leader) = &positioning.market_leader {
            positioning_lines.push(format!("시장 리더: {} ({:.1}%)", leader.product, leader.share));
        }
        if !positioning.challengers.is_empty() {
            positioning_lines.push(format!(
                "도전자: {}",
                positioning
                    .challengers
                    .iter()
                    .map(|p| p.product.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !positioning.niche_players.is_empty() {
            positioning_lines.push(format!(
                "틈새 제품: {}",
                positioning
                    .niche_players
                    .iter()
                    .map(|p| p.product.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        let document = ReportDocument::new(format!("{target} 경쟁사 분석 보고서"))
            .with_subtitle(format!(
                "카테고리: {} / 데이터: {}",
                product_info.category,
                data_source.as_str()
            ))
            .section(ReportSection::new("가격 비교").table(
                vec![
                    "제품".to_string(),
                    "최저가".to_string(),
                    "판매처".to_string(),
                    "상품명".to_string(),
                ],
                prices
                    .iter()
                    .map(|p| {
                        vec![
                            p.name.clone(),
                            format_won(p.lowest_price),
                            p.mall.clone(),
                            p.title.clone(),
                        ]
                    })
                    .collect(),
            ))
            .section(ReportSection::new("벤치마크 점수").table(
                vec![
                    "제품".to_string(),
                    "가격 경쟁력".to_string(),
                    "브랜드 파워".to_string(),
                    "종합".to_string(),
                ],
                benchmark
                    .iter()
                    .map(|b| {
                        vec![
                            b.name.clone(),
                            format!("{:.1}", b.price_score),
                            b.brand_score.to_string(),
                            format!("{:.1}", b.total_score),
                        ]
                    })
                    .collect(),
            ))
            .section(
                ReportSection::new("시장 점유율 추정")
                    .table(
                        vec!["제품".to_string(), "추정 점유율".to_string()],
                        shares
                            .iter()
                            .map(|s| vec![s.name.clone(), format!("{:.1}%", s.share)])
                            .collect(),
                    )
                    .bullets(positioning_lines.iter())
                    .paragraph(strip_markdown(&positioning.strategic_insights)),
            )
            .section(
                ReportSection::new("온라인 반응도 (참고)")
                    .paragraph("블로그와 카페 언급량을 반영한 참고 지표이며 실제 판매량이 아닙니다.")
                    .table(
                        vec![
                            "제품".to_string(),
                            "반응도".to_string(),
                            "점수".to_string(),
                            "블로그".to_string(),
                            "카페".to_string(),
                        ],
                        popularity
                            .iter()
                            .map(|p| {
                                vec![
                                    p.name.clone(),
                                    p.level.clone(),
                                    format!("{:.1}", p.popularity_score),
                                    p.mentions.blog.to_string(),
                                    p.mentions.cafe.to_string(),
                                ]
                            })
                            .collect(),
                    ),
            )
            .section(ReportSection::new("강점 (Strengths)").bullets(swot.strengths.iter()))
            .section(ReportSection::new("약점 (Weaknesses)").bullets(swot.weaknesses.iter()))
            .section(ReportSection::new("기회 (Opportunities)").bullets(swot.opportunities.iter()))
            .section(ReportSection::new("위협 (Threats)").bullets(swot.threats.iter()))
            .section(ReportSection::new("차별화 전략").paragraph(strip_markdown(&strategy)));

        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::Competitor,
                Some(&target),
                payload,
                &document,
                ArtifactFormat::Html,
                &format!(
                    "{target} 경쟁사 분석 ({})\n{}",
                    product_info.competitors.join(", "),
                    strategy
                ),
            )
            .await?;

        info!(target = %target, competitors = competitor_count, "Competitor analysis completed");

        let mut text = format!("**{target} 경쟁사 분석 완료**\n\n");
        if product_info.competitors.is_empty() {
            text.push_str(&format!(
                "명시된 경쟁 제품이 없어 검색 결과 상위 {competitor_count}개 상품과 비교했습니다.\n\n"
            ));
        } else {
            text.push_str(&format!(
                "총 {}개 경쟁사를 비교 분석했습니다.\n경쟁사: {}\n\n",
                product_info.competitors.len(),
                product_info.competitors.join(", ")
            ));
        }
        text.push_str("**가격 비교:**\n");
        for p in &prices {
            text.push_str(&format!("- {}: {} ({})\n", p.name, format_won(p.lowest_price), p.mall));
        }
        if let Some(leader) = &positioning.market_leader {
            text.push_str(&format!(
                "\n**시장 리더 (추정):** {} ({:.1}%)\n",
                leader.product, leader.share
            ));
        }
        text.push_str(&format!(
            "\n**SWOT 분석 요약:**\n- 강점: {}개\n- 약점: {}개\n- 기회: {}개\n- 위협: {}개\n\n",
            swot.strengths.len(),
            swot.weaknesses.len(),
            swot.opportunities.len(),
            swot.threats.len()
        ));
        text.push_str(&format!(
            "**차별화 전략:** {}\n\n",
            truncate_chars(&strategy, 200).replace('\n', " ").trim()
        ));
        if persisted.artifact.is_some() {
            text.push_str("**상세 분석 보고서**가 생성되었습니다.\n");
            text.push_str("HTML 보고서를 다운로드하여 비교 테이블과 전체 전략을 확인하세요.\n");
        }
        text.push_str("\n본 결과는 AI 기반 분석이며 참고용으로만 사용하세요.");

        Ok(AgentReply::completed(text, persisted))
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support;
    use super::*;
    use mercato_llm::MockProvider;

    fn entry(name: &str, price: u64) -> PriceEntry {
        PriceEntry {
            name: name.to_string(),
            lowest_price: price,
            mall: "쿠팡".to_string(),
            title: name.to_string(),
            brand: "Unknown".to_string(),
            mall_count: 1,
        }
    }

    #[test]
    fn test_price_gap() {
        assert_eq!(
            price_gap_pct(&[entry("a", 80_000), entry("b", 100_000)]),
            Some(-20.0)
        );
        assert_eq!(price_gap_pct(&[entry("a", 80_000)]), None);
    }

    #[test]
    fn test_price_position_swot() {
        let cheaper = price_position_swot(&[entry("a", 80_000), entry("b", 100_000)], "이어폰");
        assert_eq!(cheaper.strengths, vec!["경쟁 제품 평균 대비 20% 낮은 가격".to_string()]);

        let pricier = price_position_swot(&[entry("a", 150_000), entry("b", 100_000)], "이어폰");
        assert_eq!(pricier.weaknesses, vec!["경쟁 제품 평균 대비 50% 높은 가격".to_string()]);

        let alone = price_position_swot(&[entry("a", 1)], "이어폰");
        assert!(!alone.is_empty());
    }

    #[tokio::test]
    async fn test_run_named_competitors_writes_html() {
        let (ctx, _dir) = test_support::context(MockProvider::failing()).await;
        let session = ctx.store.create_session().await.unwrap();

        let reply = CompetitorAgent
            .run(
                &ctx,
                &AgentInput::new(session.id, "아이폰 15 프로와 갤럭시 S24 울트라 비교해줘"),
            )
            .await
            .unwrap();

        let artifact = reply.artifact.unwrap();
        assert!(artifact.file_name.starts_with("competitor_report_"));
        assert!(artifact.file_name.ends_with(".html"));
        let html = std::fs::read_to_string(&artifact.path).unwrap();
        assert!(html.contains("아이폰 15 프로 경쟁사 분석 보고서"));

        let data = reply.result_data.unwrap();
        assert_eq!(data["product_info"]["target"], "아이폰 15 프로");
        assert_eq!(data["product_info"]["competitors"], json!(["갤럭시 S24 울트라"]));
        assert_eq!(data["product_info"]["category"], "스마트폰");
        assert_eq!(data["competitor_count"], 1);
        assert_eq!(data["price_comparison"].as_array().unwrap().len(), 2);
        assert!(!data["swot"]["strengths"].as_array().unwrap().is_empty());
        assert!(data["strategy"].as_str().unwrap().contains("포지셔닝"));

        let benchmark = data["benchmark"].as_array().unwrap();
        assert_eq!(benchmark.len(), 2);
        assert_eq!(benchmark[0]["brand_score"], 95);
        assert_eq!(benchmark[1]["brand_score"], 90);
        let shares = data["market_shares"]["shares"].as_array().unwrap();
        let total: f64 = shares.iter().map(|s| s["share"].as_f64().unwrap()).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(data["market_shares"]["positioning"]["market_leader"]["product"].is_string());
        assert!(!data["market_shares"]["positioning"]["strategic_insights"]
            .as_str()
            .unwrap()
            .is_empty());
        let popularity = data["popularity"].as_array().unwrap();
        assert_eq!(popularity.len(), 2);
        assert!(popularity[0]["mentions"]["blog"].as_u64().unwrap() >= 50);
        assert_eq!(data["mention_source"], "synthetic");
        assert!(html.contains("벤치마크 점수"));
        assert!(html.contains("시장 점유율 추정"));
        assert!(html.contains("온라인 반응도"));
        assert!(reply.reply_text.contains("시장 리더"));

        let stored = ctx.store.get_task_result(reply.result_id.unwrap()).await.unwrap();
        assert_eq!(stored.html_path.as_deref(), Some(artifact.file_name.as_str()));
        assert!(stored.pdf_path.is_none());
    }

    #[tokio::test]
    async fn test_run_without_named_competitors_uses_listings() {
        let mock = MockProvider::new();
        mock.push_response(r#"{"target": "갤럭시 버즈", "competitors": [], "category": ""}"#);
        mock.push_response(
            r#"{"strengths": ["노이즈 캔슬링"], "weaknesses": [], "opportunities": [], "threats": []}"#,
        );
        mock.push_response("프리미엄 음질을 강조하세요.");
        let (ctx, _dir) = test_support::context(mock).await;
        let session = ctx.store.create_session().await.unwrap();

        let reply = CompetitorAgent
            .run(&ctx, &AgentInput::new(session.id, "갤럭시 버즈 경쟁사 분석"))
            .await
            .unwrap();

        let data = reply.result_data.unwrap();
        assert_eq!(data["product_info"]["category"], "이어폰/헤드폰");
        assert_eq!(data["competitor_count"], 3);
        assert_eq!(data["swot"]["strengths"], json!(["노이즈 캔슬링"]));
        assert_eq!(data["strategy"], "프리미엄 음질을 강조하세요.");
        // unparseable positioning answer falls back to the share ranking
        let leader = &data["market_shares"]["positioning"]["market_leader"];
        let top = data["market_shares"]["shares"]
            .as_array()
            .unwrap()
            .iter()
            .max_by(|a, b| a["share"].as_f64().unwrap().total_cmp(&b["share"].as_f64().unwrap()))
            .unwrap()
            .clone();
        assert_eq!(leader["product"], top["name"]);
    }

    #[tokio::test]
    async fn test_llm_positioning_is_used_when_complete() {
        let mock = MockProvider::new();
        mock.push_response(
            r#"{"target": "아이폰 15", "competitors": ["갤럭시 S24"], "category": "스마트폰"}"#,
        );
        mock.push_response(
            r#"{"strengths": ["브랜드"], "weaknesses": ["가격"], "opportunities": [], "threats": []}"#,
        );
        mock.push_response("브랜드 경험을 강조하세요.");
        mock.push_response(
            r#"{"market_leader": {"product": "갤럭시 S24", "share": 52.0, "analysis": "채널 우위"},
                "challengers": [{"product": "아이폰 15", "share": 48.0, "analysis": "브랜드 충성도"}],
                "strategic_insights": "양강 구도입니다."}"#,
        );
        let (ctx, _dir) = test_support::context(mock).await;
        let session = ctx.store.create_session().await.unwrap();

        let reply = CompetitorAgent
            .run(&ctx, &AgentInput::new(session.id, "아이폰 15와 갤럭시 S24 비교"))
            .await
            .unwrap();

        let positioning = &reply.result_data.unwrap()["market_shares"]["positioning"];
        assert_eq!(positioning["market_leader"]["product"], "갤럭시 S24");
        assert_eq!(positioning["strategic_insights"], "양강 구도입니다.");
        assert_eq!(positioning["niche_players"], json!([]));
        assert!(reply.reply_text.contains("갤럭시 S24 (52.0%)"));
    }

    #[tokio::test]
    async fn test_missing_target_returns_guidance() {
        let (ctx, _dir) = test_support::context(MockProvider::failing()).await;
        let session = ctx.store.create_session().await.unwrap();
        let reply = CompetitorAgent
            .run(&ctx, &AgentInput::new(session.id, "경쟁사 분석해줘"))
            .await
            .unwrap();
        assert!(reply.result_id.is_none());
        assert!(reply.reply_text.contains("제품명을 명확히"));
    }
}
