//! Trend analysis agent

use super::context::{recall_block, AgentContext};
use super::{strip_markdown, Agent, AgentInput, AgentReply};
use crate::error::Result;
use crate::subject::{self, clean_keyword, resolve_time_window, TimeWindow};
use chrono::NaiveDate;
use mercato_gateway::{DataSource, TrendPoint, TrendQuery};
use mercato_report::{ArtifactFormat, ReportDocument, ReportSection};
use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

const MOMENTUM_WINDOW: usize = 3;
const MOMENTUM_THRESHOLD: f64 = 5.0;
const CLUSTER_SUMMARY_LIMIT: usize = 3;
const FALLBACK_TERMS: [&str; 6] = ["구매", "가격", "후기", "추천", "비교", "이벤트"];

const KEYWORD_SYSTEM_PROMPT: &str = "사용자 문장에서 트렌드 분석 대상 키워드 하나만 출력하세요. \
설명이나 따옴표 없이 키워드만 답하고, 찾을 수 없으면 NONE 이라고 답하세요.";

const INSIGHT_SYSTEM_PROMPT: &str = "당신은 커머스 마케팅 트렌드 분석가입니다. \
주어진 검색 관심도 지표를 해석해 마케터가 바로 활용할 수 있는 인사이트를 3~4줄로 작성하세요. \
수치를 근거로 들고, 과장된 표현은 피하세요.";

const CLUSTER_SYSTEM_PROMPT: &str = "당신은 마케팅 데이터 분석가입니다. 주어진 검색 키워드와 지표를 바탕으로 \
연관 키워드를 3~5개의 클러스터로 묶고 각각의 추세 변화를 분석하세요. JSON 배열로만 답하세요. \
각 항목은 name, keywords, trend_label, change_pct, insight 필드를 가지며 change_pct 는 % 단위 숫자입니다 (예: 12.5 는 +12.5%).";

/// Summary statistics over a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    /// Mean index
    pub average: f64,
    /// Last index
    pub latest_value: f64,
    /// Change from the first point, in percent
    pub growth_pct: Option<f64>,
    /// Last window vs the window before it, in percent
    pub momentum_pct: Option<f64>,
    /// 상승 / 하락 / 보합
    pub momentum_label: String,
    /// Date of the highest index
    pub peak_date: NaiveDate,
    /// Highest index
    pub peak_value: f64,
    /// Sample standard deviation
    pub volatility: f64,
}

/// Related search keywords that move together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCluster {
    /// Cluster label
    pub name: String,
    /// Member keywords
    pub keywords: Vec<String>,
    /// 상승 / 하락 / 보합
    pub trend_label: String,
    /// Recent change in percent
    pub change_pct: Option<f64>,
    /// One-line reading
    pub insight: String,
}

/// Model replies come as a bare array or wrapped in an object
#[derive(Deserialize)]
#[serde(untagged)]
enum ClusterReply {
    List(Vec<Value>),
    Wrapped {
        #[serde(alias = "result")]
        clusters: Vec<Value>,
    },
}

impl ClusterReply {
    fn into_clusters(self) -> Vec<KeywordCluster> {
        let (Self::List(items) | Self::Wrapped { clusters: items }) = self;
        items.iter().filter_map(normalize_cluster).collect()
    }
}

fn parse_change(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text
            .trim()
            .trim_end_matches('%')
            .replace([',', '+'], "")
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Accept the field aliases models tend to use; a cluster without a name is dropped
fn normalize_cluster(entry: &Value) -> Option<KeywordCluster> {
    let field = |keys: &[&str]| keys.iter().find_map(|k| entry.get(*k).filter(|v| !v.is_null()));
    let text = |keys: &[&str]| {
        field(keys)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = text(&["name", "cluster"])?;
    let keywords = match field(&["keywords", "terms"]) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Some(KeywordCluster {
        name,
        keywords,
        trend_label: text(&["trend_label", "trend", "direction"])
            .unwrap_or_else(|| "보합".to_string()),
        change_pct: field(&["change_pct", "change", "delta"]).and_then(parse_change),
        insight: text(&["insight", "note", "summary"]).unwrap_or_default(),
    })
}

fn direction(change: f64) -> &'static str {
    if change >= MOMENTUM_THRESHOLD {
        "상승"
    } else if change <= -MOMENTUM_THRESHOLD {
        "하락"
    } else {
        "보합"
    }
}

/// Three stock clusters built from the keyword and its own metrics
#[must_use]
pub fn rule_clusters(keyword: &str, metrics: &TrendMetrics) -> Vec<KeywordCluster> {
    let momentum = metrics.momentum_pct.unwrap_or(0.0);
    let growth = metrics.growth_pct.unwrap_or(0.0);
    let terms = FALLBACK_TERMS.map(|t| format!("{keyword} {t}"));

    let consideration = if growth != 0.0 { growth } else { round1(momentum / 2.0) };
    let lifestyle = (momentum != 0.0 || growth != 0.0).then(|| round1((momentum + growth) / 2.0));

    let cluster = |name: &str, keywords: &[&String], change: Option<f64>, insight: &str| {
        KeywordCluster {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).clone()).collect(),
            trend_label: direction(change.unwrap_or(0.0)).to_string(),
            change_pct: change,
            insight: insight.to_string(),
        }
    };
    let core = keyword.to_string();

    vec![
        cluster(
            "핵심 수요",
            &[&core, &terms[0], &terms[1]],
            metrics.momentum_pct,
            "핵심 검색어와 직접적인 연관어에서 나타난 수요 흐름입니다.",
        ),
        cluster(
            "구매 고려 및 가격",
            &[&terms[2], &terms[3]],
            Some(consideration),
            "구매 의도와 가격 탐색 키워드의 변화로 전환 가능성을 가늠하세요.",
        ),
        cluster(
            "관련 라이프스타일",
            &[&terms[4], &terms[5]],
            lifestyle,
            "콘텐츠와 라이프스타일 키워드로 캠페인 소재를 넓힐 수 있습니다.",
        ),
    ]
}

/// "name +x.x%" for the first few clusters
fn summarize_clusters(clusters: &[KeywordCluster]) -> Option<String> {
    (!clusters.is_empty()).then(|| {
        clusters
            .iter()
            .take(CLUSTER_SUMMARY_LIMIT)
            .map(|c| format!("{} {}", c.name, fmt_pct(c.change_pct)))
            .collect::<Vec<_>>()
            .join(", ")
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compute metrics; `None` for an empty series
#[must_use]
pub fn compute_metrics(points: &[TrendPoint]) -> Option<TrendMetrics> {
    let first = points.first()?;
    let last = points.last()?;
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();

    let growth_pct = (first.value != 0.0)
        .then(|| round1((last.value - first.value) / first.value * 100.0));

    let window = MOMENTUM_WINDOW.min(values.len() / 2);
    let momentum_pct = if window == 0 {
        None
    } else {
        let recent = mean(&values[values.len() - window..]);
        let previous = mean(&values[values.len() - 2 * window..values.len() - window]);
        (previous != 0.0).then(|| round1((recent - previous) / previous * 100.0))
    };

    let momentum_label = match momentum_pct {
        Some(m) if m >= MOMENTUM_THRESHOLD => "상승",
        Some(m) if m <= -MOMENTUM_THRESHOLD => "하락",
        Some(_) => "보합",
        None => "데이터 부족",
    }
    .to_string();

    let peak = points
        .iter()
        .fold(first, |best, p| if p.value > best.value { p } else { best });

    let average = mean(&values);
    let volatility = if values.len() < 2 {
        0.0
    } else {
        let variance = values.iter().map(|v| (v - average).powi(2)).sum::<f64>()
            / (values.len() - 1) as f64;
        variance.sqrt()
    };

    Some(TrendMetrics {
        average: round1(average),
        latest_value: last.value,
        growth_pct,
        momentum_pct,
        momentum_label,
        peak_date: peak.date,
        peak_value: peak.value,
        volatility: round1(volatility),
    })
}

/// Weighted direction label: growth counts 0.6, momentum 0.4, and a high
/// latest index adds a bonus
#[must_use]
pub fn signal_label(metrics: &TrendMetrics) -> &'static str {
    let mut weighted = 0.0;
    let mut weight = 0.0;
    if let Some(g) = metrics.growth_pct {
        weighted += g * 0.6;
        weight += 0.6;
    }
    if let Some(m) = metrics.momentum_pct {
        weighted += m * 0.4;
        weight += 0.4;
    }
    let mut score = if weight > 0.0 { weighted / weight } else { 0.0 };
    if metrics.latest_value >= 70.0 {
        score += 5.0;
    }

    if score >= 20.0 {
        "🚀 강한 상승세"
    } else if score >= 8.0 {
        "↗️ 완만한 상승"
    } else if score <= -20.0 {
        "📉 강한 하락"
    } else if score <= -8.0 {
        "↘️ 완만한 하락"
    } else {
        "➖ 보합세"
    }
}

fn confidence(source: DataSource, has_points: bool) -> &'static str {
    match (has_points, source) {
        (false, _) => "낮음",
        (true, DataSource::Live) => "높음",
        (true, DataSource::Synthetic) => "중간",
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:+.1}%"))
}

fn rule_insight(keyword: &str, metrics: &TrendMetrics) -> String {
    let direction = match metrics.momentum_label.as_str() {
        "상승" => format!(
            "최근 '{keyword}' 관심도가 상승 중입니다. 노출을 늘리고 프로모션 시점을 앞당기는 것을 검토하세요."
        ),
        "하락" => format!(
            "최근 '{keyword}' 관심도가 하락 중입니다. 신규 유입보다 기존 고객 리텐션과 번들 구성에 집중하세요."
        ),
        _ => format!(
            "'{keyword}' 관심도는 안정적입니다. 꾸준한 콘텐츠 노출로 검색 점유율을 유지하세요."
        ),
    };
    let peak = format!(
        "최고 관심 시점은 {} (지수 {:.0})이므로 비슷한 시기의 캠페인을 계획해 보세요.",
        metrics.peak_date, metrics.peak_value
    );
    let volatility = if metrics.volatility >= 10.0 {
        "변동성이 커서 단기 이벤트 대응형 운영이 유리합니다."
    } else {
        "변동성이 낮아 장기 캠페인 운영에 적합합니다."
    };
    format!("- {direction}\n- {peak}\n- {volatility}")
}

/// Consumer trend analysis over a search-interest series
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendAgent;

impl TrendAgent {
    async fn keyword(&self, ctx: &AgentContext, message: &str) -> Option<String> {
        if let Some(keyword) = subject::trend_keyword(message) {
            return Some(keyword);
        }
        match ctx.complete(KEYWORD_SYSTEM_PROMPT, message).await {
            Ok(reply) => {
                let candidate = reply.lines().next().unwrap_or_default().trim();
                if candidate.eq_ignore_ascii_case("none") {
                    None
                } else {
                    clean_keyword(candidate)
                }
            }
            Err(e) => {
                warn!(error = %e, "Keyword assist failed");
                None
            }
        }
    }

    async fn clusters(
        &self,
        ctx: &AgentContext,
        keyword: &str,
        window: &TimeWindow,
        metrics: &TrendMetrics,
    ) -> Vec<KeywordCluster> {
        let prompt = format!(
            "키워드: {keyword}\n기간: {} ~ {} (단위: {})\n지표: {}\n\
             연관 클러스터를 3~5개 제안하고 각 클러스터의 최근 변화율을 숫자로 제공하세요.",
            window.start,
            window.end,
            window.time_unit.as_str(),
            json!({
                "momentum_pct": metrics.momentum_pct,
                "momentum_label": metrics.momentum_label,
                "growth_pct": metrics.growth_pct,
                "latest_value": metrics.latest_value,
            }),
        );
        let clusters = ctx
            .complete_json::<ClusterReply>(CLUSTER_SYSTEM_PROMPT, &prompt)
            .await
            .map(ClusterReply::into_clusters)
            .unwrap_or_default();
        if clusters.is_empty() {
            debug!(keyword = %keyword, "No usable clusters from the model, using stock clusters");
            return rule_clusters(keyword, metrics);
        }
        clusters
    }

    async fn insight(
        &self,
        ctx: &AgentContext,
        keyword: &str,
        window: &TimeWindow,
        metrics: &TrendMetrics,
        cluster_summary: Option<&str>,
        recall: &str,
    ) -> String {
        let clusters = cluster_summary
            .map(|s| format!("\n연관 키워드 클러스터: {s}"))
            .unwrap_or_default();
        let prompt = format!(
            "키워드: {keyword}\n기간: {} ~ {} ({})\n지표: {}{clusters}{recall}",
            window.start,
            window.end,
            window.time_unit.as_str(),
            serde_json::to_string(metrics).unwrap_or_default(),
        );
        match ctx.complete(INSIGHT_SYSTEM_PROMPT, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => rule_insight(keyword, metrics),
            Err(e) => {
                warn!(error = %e, "Insight generation failed, using rule-based insight");
                rule_insight(keyword, metrics)
            }
        }
    }
}

#[async_trait::async_trait]
impl Agent for TrendAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Trend
    }

    #[instrument(skip(self, ctx, input), fields(session_id = %input.session_id))]
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply> {
        let Some(keyword) = self.keyword(ctx, &input.message).await else {
            return Ok(AgentReply::text(
                "어떤 키워드의 트렌드를 분석할까요?\n예: \"스마트워치 트렌드 분석\", \"최근 3개월 캠핑용품 트렌드 알려줘\"",
            ));
        };

        let window = resolve_time_window(&input.message, subject::today_kst());
        let recalled = ctx.recall(&keyword, TaskType::Trend).await;

        let fetched = ctx
            .gateway
            .trend(&TrendQuery {
                keyword: keyword.clone(),
                start: window.start,
                end: window.end,
                time_unit: window.time_unit,
            })
            .await;
        let points = &fetched.data.points;
        let confidence = confidence(fetched.source, !points.is_empty());

        let Some(metrics) = compute_metrics(points) else {
            return Ok(AgentReply::text(format!(
                "'{keyword}'에 대한 트렌드 데이터가 충분하지 않습니다. 다른 키워드나 기간으로 다시 시도해 주세요."
            )));
        };
        let signal = signal_label(&metrics);
        let clusters = self.clusters(ctx, &keyword, &window, &metrics).await;
        let cluster_summary = summarize_clusters(&clusters);
        let insight = self
            .insight(
                ctx,
                &keyword,
                &window,
                &metrics,
                cluster_summary.as_deref(),
                &recall_block(&recalled),
            )
            .await;

        let summary = format!(
            "'{keyword}' 검색 관심도는 평균 {:.1}, 최근 {:.0}이며 첫 시점 대비 {} 변화했습니다. 최근 모멘텀은 {} ({})입니다.",
            metrics.average,
            metrics.latest_value,
            fmt_pct(metrics.growth_pct),
            metrics.momentum_label,
            fmt_pct(metrics.momentum_pct),
        );

        let series: Vec<_> = points
            .iter()
            .map(|p| json!({"date": p.date.to_string(), "value": p.value}))
            .collect();
        let payload = json!({
            "keyword": keyword,
            "period": {"start": window.start.to_string(), "end": window.end.to_string()},
            "time_unit": window.time_unit.as_str(),
            "trend_series": series,
            "metrics": metrics,
            "summary": summary,
            "insight": insight,
            "signal": signal,
            "confidence": confidence,
            "clusters": clusters,
            "cluster_summary": cluster_summary,
            "data_source": fetched.source.as_str(),
        });

        let document = ReportDocument::new(format!("'{keyword}' 트렌드 분석 리포트"))
            .with_subtitle(format!(
                "분석 기간: {} ~ {} (단위: {})",
                window.start,
                window.end,
                window.time_unit.as_str()
            ))
            .section(
                ReportSection::new("요약")
                    .paragraph(&summary)
                    .bullets([
                        format!("추세 해석: {signal}"),
                        format!("데이터 신뢰도: {confidence}"),
                        format!("데이터 출처: {}", fetched.source.as_str()),
                    ]),
            )
            .section(ReportSection::new("주요 지표").table(
                vec!["지표".to_string(), "값".to_string()],
                vec![
                    vec!["평균 지수".to_string(), format!("{:.1}", metrics.average)],
                    vec!["최신 지수".to_string(), format!("{:.0}", metrics.latest_value)],
                    vec!["첫 시점 대비".to_string(), fmt_pct(metrics.growth_pct)],
                    vec!["최근 모멘텀".to_string(), fmt_pct(metrics.momentum_pct)],
                    vec![
                        "최고 지점".to_string(),
                        format!("{} ({:.0})", metrics.peak_date, metrics.peak_value),
                    ],
                    vec!["변동성".to_string(), format!("{:.1}", metrics.volatility)],
                ],
            ))
            .section(ReportSection::new("연관 키워드 클러스터").table(
                vec![
                    "클러스터".to_string(),
                    "키워드".to_string(),
                    "추세".to_string(),
                    "변화율".to_string(),
                    "인사이트".to_string(),
                ],
                clusters
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.keywords.join(", "),
                            c.trend_label.clone(),
                            fmt_pct(c.change_pct),
                            c.insight.clone(),
                        ]
                    })
                    .collect(),
            ))
            .section(ReportSection::new("추천 인사이트").paragraph(strip_markdown(&insight)))
            .section(ReportSection::new("시계열 데이터").table(
                vec!["날짜".to_string(), "지수".to_string()],
                points
                    .iter()
                    .map(|p| vec![p.date.to_string(), format!("{:.1}", p.value)])
                    .collect(),
            ));

        let persisted = ctx
            .persist(
                input.session_id,
                TaskType::Trend,
                Some(&keyword),
                payload,
                &document,
                ArtifactFormat::Pdf,
                &format!("{summary}\n{signal}\n{insight}"),
            )
            .await?;

        info!(keyword = %keyword, points = points.len(), "Trend analysis completed");

        let source_label = match fetched.source {
            DataSource::Live => "Naver DataLab",
            DataSource::Synthetic => "Naver DataLab (모의)",
        };
        let mut lines = vec![
            format!("📈 **'{keyword}' 트렌드 분석 요약**"),
            String::new(),
            format!(
                "- 분석 기간: {} ~ {} (단위: {})",
                window.start,
                window.end,
                window.time_unit.as_str()
            ),
            format!("- 데이터 신뢰도: {confidence}"),
            format!("- 추세 해석: {signal}"),
            String::new(),
            summary,
        ];
        if let Some(cluster_summary) = &cluster_summary {
            lines.push(format!("- 연관 키워드 클러스터: {cluster_summary}"));
        }
        lines.extend([
            String::new(),
            "**추천 인사이트**".to_string(),
            insight,
            String::new(),
            format!("🔗 데이터 출처: {source_label}"),
            "⚠️ 공개 데이터 기반 추정치이므로 의사결정 시 추가 검증이 필요합니다.".to_string(),
        ]);
        if let Some(artifact) = &persisted.artifact {
            lines.push(String::new());
            lines.push("📄 **트렌드 리포트 PDF가 생성되었습니다.**".to_string());
            lines.push(format!("파일명: `{}`", artifact.file_name));
        }

        Ok(AgentReply::completed(lines.join("\n"), persisted))
    }
}
