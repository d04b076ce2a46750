//! Market position scoring for the competitor report
//!
//! All scores are 0-100. Shopping search exposes no review or rating data,
//! so the benchmark and share estimates rest on price, brand and channel
//! reach only. The online reaction signal adds blog and cafe mention
//! counts and is reported alongside, never used for ranking.

use super::competitor::PriceEntry;
use mercato_gateway::MentionCounts;
use serde::{Deserialize, Serialize};

/// Mall count at which channel reach scores 100
const FULL_REACH_MALLS: f64 = 4.0;

/// Mentions at which the UGC score saturates
const FULL_UGC_MENTIONS: f64 = 1000.0;

const BRANDS: &[(&str, &[&str])] = &[
    ("Apple", &["apple", "애플", "아이폰", "iphone", "에어팟", "airpods", "아이패드", "ipad", "맥북", "macbook"]),
    ("Samsung", &["samsung", "삼성", "갤럭시", "galaxy"]),
    ("LG", &["엘지", "lg전자", "lg ", "그램"]),
    ("Xiaomi", &["xiaomi", "샤오미", "redmi"]),
    ("Sony", &["sony", "소니"]),
    ("Dyson", &["dyson", "다이슨"]),
    ("Oppo", &["oppo", "오포"]),
    ("Vivo", &["vivo", "비보"]),
];

const FLAGSHIP_BRANDS: &[&str] = &["Apple", "Samsung", "LG"];

/// Canonical brand from the listing's brand field, else from the product name
#[must_use]
pub fn infer_brand(listed: &str, name: &str) -> String {
    let find = |text: &str| {
        let lower = format!("{} ", text.to_lowercase());
        BRANDS
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| lower.contains(k)))
            .map(|(brand, _)| (*brand).to_string())
    };
    find(listed)
        .or_else(|| find(name))
        .or_else(|| (!listed.trim().is_empty()).then(|| listed.trim().to_string()))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Brand recognition weight
#[must_use]
pub fn brand_power(brand: &str) -> u32 {
    match brand {
        "Apple" => 95,
        "Samsung" => 90,
        "LG" => 85,
        "Sony" => 80,
        "Xiaomi" => 75,
        "Oppo" | "Vivo" => 70,
        _ => 50,
    }
}

/// Typical price for a category, in won
fn category_average_price(category: &str) -> f64 {
    match category {
        "스마트폰" => 800_000.0,
        "노트북" => 1_500_000.0,
        "태블릿" => 600_000.0,
        "웨어러블" => 300_000.0,
        "이어폰/헤드폰" => 200_000.0,
        _ => 500_000.0,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Benchmark scores for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkScore {
    /// Product name
    pub name: String,
    /// Cheapest price over this price, scaled to 100
    pub price_score: f64,
    /// Brand recognition
    pub brand_score: u32,
    /// Mean of the price and brand scores
    pub total_score: f64,
}

/// Price competitiveness and brand power per product
#[must_use]
pub fn benchmark_scores(prices: &[PriceEntry]) -> Vec<BenchmarkScore> {
    let cheapest = prices
        .iter()
        .map(|p| p.lowest_price)
        .filter(|p| *p > 0)
        .min()
        .unwrap_or(1) as f64;

    prices
        .iter()
        .map(|p| {
            let price_score = if p.lowest_price > 0 {
                round1(cheapest / p.lowest_price as f64 * 100.0)
            } else {
                0.0
            };
            let brand_score = brand_power(&p.brand);
            BenchmarkScore {
                name: p.name.clone(),
                price_score,
                brand_score,
                total_score: round1((price_score + f64::from(brand_score)) / 2.0),
            }
        })
        .collect()
}

/// Estimated share of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    /// Product name
    pub name: String,
    /// Percent of the compared set, one decimal
    pub share: f64,
}

/// Share of the compared set from channel reach (30%), brand (40%),
/// price position (20%) and mentions (10%).
///
/// Shares sum to exactly 100.0; the rounding remainder goes to the first
/// product. `mentions` pairs with `prices` by index.
#[must_use]
pub fn market_shares(prices: &[PriceEntry], mentions: &[MentionCounts]) -> Vec<MarketShare> {
    match prices {
        [] => return Vec::new(),
        [only] => {
            return vec![MarketShare {
                name: only.name.clone(),
                share: 100.0,
            }]
        }
        _ => {}
    }

    let listed: Vec<u64> = prices
        .iter()
        .map(|p| p.lowest_price)
        .filter(|p| *p > 0)
        .collect();
    let min = listed.iter().copied().min().unwrap_or(0) as f64;
    let max = listed.iter().copied().max().unwrap_or(0) as f64;

    let scores: Vec<f64> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let reach = (p.mall_count.max(1) as f64 * 25.0).min(100.0);
            let brand = f64::from(brand_power(&p.brand));
            let price = match p.lowest_price {
                0 => 0.0,
                _ if max <= min => 100.0,
                price => 100.0 * (1.0 - (price as f64 - min) / (max - min)),
            };
            let buzz = mentions
                .get(i)
                .map_or(0.0, |m| (m.total() as f64 / 20.0).min(100.0));
            reach * 0.3 + brand * 0.4 + price * 0.2 + buzz * 0.1
        })
        .collect();

    let total: f64 = scores.iter().sum();
    let mut shares: Vec<MarketShare> = prices
        .iter()
        .zip(&scores)
        .map(|(p, score)| MarketShare {
            name: p.name.clone(),
            share: if total > 0.0 {
                round1(score / total * 100.0)
            } else {
                round1(100.0 / prices.len() as f64)
            },
        })
        .collect();

    let remainder = 100.0 - shares.iter().map(|s| s.share).sum::<f64>();
    if let Some(first) = shares.first_mut() {
        first.share = round1(first.share + remainder);
    }
    shares
}

/// Online reaction level for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popularity {
    /// Product name
    pub name: String,
    /// 높음, 보통 or 낮음
    pub level: String,
    /// Blog and cafe mentions
    pub mentions: MentionCounts,
    /// Combined score
    pub popularity_score: f64,
    /// Channel reach, brand, price and search rank
    pub sales_potential: f64,
    /// Mentions scaled to 100 at 1 000
    pub ugc_score: f64,
}

/// Online reaction: half sales potential, half mention volume.
///
/// `rank` is the 1-based position in the comparison.
#[must_use]
pub fn popularity(
    entry: &PriceEntry,
    rank: usize,
    category: &str,
    mentions: MentionCounts,
) -> Popularity {
    let reach = (entry.mall_count as f64 / FULL_REACH_MALLS * 100.0).min(100.0);
    let brand = f64::from(brand_power(&entry.brand));

    let average = category_average_price(category);
    let price = entry.lowest_price as f64;
    let price_factor = if FLAGSHIP_BRANDS.contains(&entry.brand.as_str()) && price > average * 1.5 {
        // flagship lines sell despite the premium
        80.0
    } else if price > 0.0 {
        ((1.0 - price / average) * 100.0).max(0.0)
    } else {
        50.0
    };
    let rank_score = ((6.0 - rank as f64) / 5.0 * 100.0).clamp(0.0, 100.0);

    let sales_potential = reach * 0.3 + brand * 0.3 + price_factor * 0.2 + rank_score * 0.2;
    let ugc_score = (mentions.total() as f64 / FULL_UGC_MENTIONS * 100.0).min(100.0);
    let score = sales_potential * 0.5 + ugc_score * 0.5;

    let level = if score >= 75.0 {
        "높음"
    } else if score >= 50.0 {
        "보통"
    } else {
        "낮음"
    };

    Popularity {
        name: entry.name.clone(),
        level: level.to_string(),
        mentions,
        popularity_score: round1(score),
        sales_potential: round1(sales_potential),
        ugc_score: round1(ugc_score),
    }
}

/// One product's role in the market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPlayer {
    /// Product name
    pub product: String,
    /// Estimated share
    pub share: f64,
    /// Short assessment
    pub analysis: String,
}

/// Products grouped by price tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSegments {
    /// Well above the set average
    pub premium: Vec<String>,
    /// Near the set average
    pub mid_range: Vec<String>,
    /// Well below the set average
    pub budget: Vec<String>,
}

/// Leader, challengers and niche players of the compared set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPositioning {
    /// Largest share
    pub market_leader: Option<MarketPlayer>,
    /// Second and third
    pub challengers: Vec<MarketPlayer>,
    /// Everyone else
    pub niche_players: Vec<MarketPlayer>,
    /// Price tiers
    pub price_segments: PriceSegments,
    /// Overall reading of the market
    pub strategic_insights: String,
}

impl MarketPositioning {
    /// Whether an LLM answer carries the parts the report needs
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.market_leader.is_some() && !self.strategic_insights.trim().is_empty()
    }
}

/// Positioning derived from shares and prices alone
#[must_use]
pub fn rule_positioning(
    prices: &[PriceEntry],
    shares: &[MarketShare],
    category: &str,
) -> MarketPositioning {
    let mut ranked: Vec<&MarketShare> = shares.iter().collect();
    ranked.sort_by(|a, b| b.share.total_cmp(&a.share));

    let player = |s: &MarketShare, analysis: String| MarketPlayer {
        product: s.name.clone(),
        share: s.share,
        analysis,
    };

    let mut segments = PriceSegments::default();
    let listed: Vec<f64> = prices
        .iter()
        .filter(|p| p.lowest_price > 0)
        .map(|p| p.lowest_price as f64)
        .collect();
    let average = listed.iter().sum::<f64>() / listed.len().max(1) as f64;
    for p in prices.iter().filter(|p| p.lowest_price > 0) {
        let price = p.lowest_price as f64;
        let tier = if price > average * 1.2 {
            &mut segments.premium
        } else if price < average * 0.8 {
            &mut segments.budget
        } else {
            &mut segments.mid_range
        };
        tier.push(p.name.clone());
    }

    let Some((leader, rest)) = ranked.split_first() else {
        return MarketPositioning {
            price_segments: segments,
            ..MarketPositioning::default()
        };
    };

    if rest.is_empty() {
        return MarketPositioning {
            market_leader: Some(player(
                *leader,
                "독점 시장입니다. 경쟁사가 없거나 데이터가 부족합니다.".to_string(),
            )),
            price_segments: segments,
            strategic_insights: "현재 시장에서 유일한 제품이거나 경쟁 데이터가 부족합니다."
                .to_string(),
            ..MarketPositioning::default()
        };
    }

    let challengers: Vec<MarketPlayer> = rest
        .iter()
        .take(2)
        .map(|s| player(*s, format!("점유율 {:.1}%로 시장 리더를 추격하는 도전자입니다.", s.share)))
        .collect();
    let niche_players: Vec<MarketPlayer> = rest
        .iter()
        .skip(2)
        .map(|s| player(*s, format!("점유율 {:.1}%의 틈새 시장 제품입니다.", s.share)))
        .collect();

    let mut insights = format!(
        "{category} 시장 분석 (간략):\n- 시장 리더: {} ({:.1}%)\n",
        leader.name, leader.share
    );
    insights.push_str(&format!(
        "- 주요 경쟁자: {}\n",
        challengers
            .iter()
            .map(|c| c.product.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    MarketPositioning {
        market_leader: Some(player(
            *leader,
            format!("비교 대상 중 가장 높은 추정 점유율 {:.1}%를 보입니다.", leader.share),
        )),
        challengers,
        niche_players,
        price_segments: segments,
        strategic_insights: insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, brand: &str, price: u64, malls: usize) -> PriceEntry {
        PriceEntry {
            name: name.to_string(),
            lowest_price: price,
            mall: "쿠팡".to_string(),
            title: name.to_string(),
            brand: brand.to_string(),
            mall_count: malls,
        }
    }

    #[test]
    fn test_infer_brand() {
        assert_eq!(infer_brand("", "아이폰 15 프로"), "Apple");
        assert_eq!(infer_brand("삼성전자", "버즈3"), "Samsung");
        assert_eq!(infer_brand("", "LG 그램 16"), "LG");
        assert_eq!(infer_brand("브리츠", "블루투스 스피커"), "브리츠");
        assert_eq!(infer_brand("", "무선 충전기"), "Unknown");
        assert_eq!(brand_power("Unknown"), 50);
    }

    #[test]
    fn test_benchmark_scores() {
        let scores = benchmark_scores(&[
            entry("아이폰 15", "Apple", 1_250_000, 3),
            entry("갤럭시 S24", "Samsung", 1_000_000, 4),
        ]);
        assert_eq!(scores[0].price_score, 80.0);
        assert_eq!(scores[0].brand_score, 95);
        assert_eq!(scores[0].total_score, 87.5);
        assert_eq!(scores[1].price_score, 100.0);
        assert_eq!(scores[1].total_score, 95.0);
    }

    #[test]
    fn test_market_shares_sum_to_hundred() {
        let prices = [
            entry("아이폰 15", "Apple", 1_200_000, 3),
            entry("갤럭시 S24", "Samsung", 1_000_000, 4),
            entry("샤오미 14", "Xiaomi", 700_000, 1),
        ];
        let mentions = [MentionCounts { blog: 900, cafe: 300 }; 3];
        let shares = market_shares(&prices, &mentions);
        assert_eq!(shares.len(), 3);
        let total: f64 = shares.iter().map(|s| s.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
        // reach and brand outweigh the lower price
        assert!(shares[1].share > shares[2].share);
    }

    #[test]
    fn test_market_shares_edge_cases() {
        assert!(market_shares(&[], &[]).is_empty());
        let single = market_shares(&[entry("a", "Unknown", 1000, 1)], &[]);
        assert_eq!(single[0].share, 100.0);

        let same = market_shares(
            &[entry("a", "Unknown", 1000, 1), entry("b", "Unknown", 1000, 1)],
            &[],
        );
        assert_eq!(same[0].share, 50.0);
        assert_eq!(same[1].share, 50.0);
    }

    #[test]
    fn test_popularity_levels() {
        let busy = popularity(
            &entry("갤럭시 버즈", "Samsung", 150_000, 4),
            1,
            "이어폰/헤드폰",
            MentionCounts { blog: 3000, cafe: 1000 },
        );
        assert_eq!(busy.level, "높음");
        assert_eq!(busy.ugc_score, 100.0);

        let quiet = popularity(
            &entry("무명 이어폰", "Unknown", 250_000, 1),
            6,
            "이어폰/헤드폰",
            MentionCounts::default(),
        );
        assert_eq!(quiet.level, "낮음");
        assert_eq!(quiet.ugc_score, 0.0);
    }

    #[test]
    fn test_flagship_price_exception() {
        let flagship = popularity(
            &entry("아이폰 15 프로", "Apple", 1_600_000, 4),
            1,
            "스마트폰",
            MentionCounts::default(),
        );
        // 100*0.3 + 95*0.3 + 80*0.2 + 100*0.2
        assert_eq!(flagship.sales_potential, 94.5);
    }

    #[test]
    fn test_rule_positioning() {
        let prices = [
            entry("a", "Apple", 1_500_000, 3),
            entry("b", "Samsung", 1_000_000, 4),
            entry("c", "Xiaomi", 500_000, 1),
            entry("d", "Unknown", 1_000_000, 1),
        ];
        let shares = market_shares(&prices, &[]);
        let positioning = rule_positioning(&prices, &shares, "스마트폰");

        assert!(positioning.is_complete());
        assert_eq!(positioning.challengers.len(), 2);
        assert_eq!(positioning.niche_players.len(), 1);
        assert_eq!(positioning.price_segments.premium, vec!["a".to_string()]);
        assert_eq!(positioning.price_segments.budget, vec!["c".to_string()]);
        assert!(positioning.strategic_insights.contains("시장 리더"));

        let alone = rule_positioning(&prices[..1], &market_shares(&prices[..1], &[]), "스마트폰");
        assert!(alone.challengers.is_empty());
        assert!(alone.market_leader.unwrap().analysis.contains("독점"));
    }
}
