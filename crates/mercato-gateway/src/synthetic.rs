//! Deterministic synthetic data
//!
//! Generators are seeded from a SHA-256 digest of the query text, so the same
//! query always produces the same series, listings, snippets and counts.

use crate::types::{
    MentionCounts, ShoppingItem, ShoppingQuery, TrendPoint, TrendQuery, TrendSeries,
};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

const MIN_TREND_STEPS: i64 = 8;
const MAX_TREND_STEPS: i64 = 20;

const LISTING_VARIANTS: &[&str] = &[
    "기본형", "프로", "라이트", "플러스", "에디션", "미니", "맥스", "스페셜",
];

const MALLS: &[&str] = &["네이버스토어", "쿠팡", "11번가", "G마켓", "SSG", "롯데ON"];

const REVIEW_TEMPLATES: &[&str] = &[
    "{product} 정말 좋아요! 출퇴근할 때 매일 쓰는데 만족스럽습니다.",
    "{product} 가격 대비 성능이 훌륭해요. 주변에도 추천했어요.",
    "디자인이 세련돼서 {product} 들고 다니기 좋네요. 다만 가격이 조금 비싸요.",
    "{product} 배터리가 생각보다 빨리 닳아서 아쉬워요.",
    "선물용으로 {product} 샀는데 받는 사람이 아주 좋아했어요.",
    "{product} 배송은 빨랐는데 포장이 조금 허술했습니다.",
    "기능이 많아서 처음엔 어려웠지만 {product} 쓰다 보니 편해요.",
    "{product} 음질이 기대 이상이에요. 운동할 때도 잘 씁니다.",
    "전작보다 확실히 좋아졌어요. {product} 업그레이드 만족합니다.",
    "{product} 연결이 가끔 끊겨서 불편해요. 펌웨어 업데이트가 필요해 보여요.",
    "가성비를 생각하면 {product} 무난한 선택입니다.",
    "{product} 착용감이 편하고 오래 써도 부담이 없어요.",
];

/// Stable 64-bit seed for a query string
#[must_use]
pub fn seed_for(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn rng_for(text: &str) -> StdRng {
    StdRng::seed_from_u64(seed_for(text))
}

/// Synthetic interest series ending at `query.end`.
///
/// Baseline 40-79, slope -2..=2 per step, jitter -5..=5, clamped to 5-100,
/// with 8 to 20 points.
#[must_use]
pub fn trend_series(query: &TrendQuery) -> TrendSeries {
    let mut rng = rng_for(&format!(
        "trend:{}:{}:{}:{}",
        query.keyword,
        query.start,
        query.end,
        query.time_unit.as_str()
    ));

    let step_days = query.time_unit.step_days();
    let span_days = (query.end - query.start).num_days().max(0);
    let steps = (span_days / step_days + 1).clamp(MIN_TREND_STEPS, MAX_TREND_STEPS);

    let baseline = 40.0 + f64::from(rng.gen_range(0..40_i32));
    let slope = f64::from(rng.gen_range(-2..=2_i32));

    let points = (0..steps)
        .map(|i| {
            let jitter = f64::from(rng.gen_range(-5..=5_i32));
            let value = (baseline + slope * i as f64 + jitter).clamp(5.0, 100.0);
            TrendPoint {
                date: query.end - Duration::days((steps - 1 - i) * step_days),
                value: (value * 10.0).round() / 10.0,
            }
        })
        .collect();

    TrendSeries {
        keyword: query.keyword.clone(),
        points,
    }
}

/// Synthetic shopping listings for a query
#[must_use]
pub fn shopping_items(query: &ShoppingQuery) -> Vec<ShoppingItem> {
    let mut rng = rng_for(&format!("shop:{}", query.query));
    let count = (query.display as usize).clamp(1, LISTING_VARIANTS.len());
    let base_price: u64 = rng.gen_range(300..3000) * 100;
    let brand = query
        .query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    (0..count)
        .map(|i| {
            let factor = rng.gen_range(80..=130);
            let lprice = base_price * factor / 100 / 100 * 100;
            ShoppingItem {
                title: format!("{} {}", query.query, LISTING_VARIANTS[i]),
                link: format!("https://search.shopping.naver.com/catalog/synthetic-{}", i + 1),
                lprice,
                mall_name: MALLS[rng.gen_range(0..MALLS.len())].to_string(),
                brand: brand.clone(),
                category: "디지털/가전".to_string(),
            }
        })
        .collect()
}

/// Synthetic review snippets mentioning the product
#[must_use]
pub fn review_snippets(product: &str, limit: usize) -> Vec<String> {
    let mut rng = rng_for(&format!("reviews:{product}"));
    let mut templates: Vec<&str> = REVIEW_TEMPLATES.to_vec();
    templates.shuffle(&mut rng);

    templates
        .into_iter()
        .take(limit.max(1))
        .map(|t| t.replace("{product}", product))
        .collect()
}

/// Synthetic blog and cafe mention counts, 50 to 1 999 posts each
#[must_use]
pub fn mention_counts(product: &str) -> MentionCounts {
    let mut rng = rng_for(&format!("mentions:{product}"));
    MentionCounts {
        blog: rng.gen_range(50..2000),
        cafe: rng.gen_range(50..2000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeUnit;
    use chrono::NaiveDate;

    fn query(keyword: &str) -> TrendQuery {
        TrendQuery {
            keyword: keyword.to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            time_unit: TimeUnit::Week,
        }
    }

    #[test]
    fn test_trend_series_is_deterministic() {
        let a = trend_series(&query("스마트워치"));
        let b = trend_series(&query("스마트워치"));
        assert_eq!(a, b);

        let other = trend_series(&query("무선이어폰"));
        assert_ne!(a.points, other.points);
    }

    #[test]
    fn test_trend_series_shape() {
        let series = trend_series(&query("스마트워치"));
        assert!((8..=20).contains(&series.points.len()));
        assert!(series.points.iter().all(|p| (5.0..=100.0).contains(&p.value)));
        assert_eq!(series.points.last().unwrap().date, query("x").end);
        assert!(series.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_short_window_still_has_minimum_points() {
        let mut q = query("캠핑의자");
        q.start = q.end - Duration::days(7);
        q.time_unit = TimeUnit::Date;
        assert_eq!(trend_series(&q).points.len(), 8);
    }

    #[test]
    fn test_shopping_items_deterministic() {
        let q = ShoppingQuery::new("갤럭시 버즈").with_display(5);
        let a = shopping_items(&q);
        assert_eq!(a, shopping_items(&q));
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|i| i.lprice > 0 && i.lprice % 100 == 0));
        assert_eq!(a[0].brand, "갤럭시");
    }

    #[test]
    fn test_review_snippets_mention_product() {
        let reviews = review_snippets("에어팟 프로", 5);
        assert_eq!(reviews.len(), 5);
        assert!(reviews.iter().all(|r| r.contains("에어팟 프로")));
        assert_eq!(reviews, review_snippets("에어팟 프로", 5));
    }

    #[test]
    fn test_mention_counts_are_stable() {
        let counts = mention_counts("갤럭시 버즈");
        assert_eq!(counts, mention_counts("갤럭시 버즈"));
        assert!((50..2000).contains(&counts.blog));
        assert_eq!(counts.total(), counts.blog + counts.cafe);
    }
}
