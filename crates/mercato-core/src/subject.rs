//! Subject extraction
//!
//! Pattern-based helpers that pull the analysis subject (keyword, product,
//! competitor set, product filter) and the trend time window out of a chat
//! message. Agents fall back to an LLM assist only where noted in their docs.

use chrono::{Duration, NaiveDate, Utc};
use mercato_gateway::TimeUnit;
use regex::Regex;
use std::sync::LazyLock;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new($pattern).expect(concat!(stringify!($name), " is a compile-time constant"))
        });
    };
}

static_regex!(QUOTED, r#"["“”'‘’]([^"“”'‘’]{2,})["“”'‘’]"#);
static_regex!(HASHTAG, r"#([A-Za-z0-9가-힣]+)");
static_regex!(
    PERIOD_EXPR,
    r"(?i)\s*(?:최근|요즘|지난|이번|다음)\s*(?:\d+\s*)?(?:개월간|개월|주간|반년|분기|년|달|월|주|일)?"
);
static_regex!(
    ANALYSIS_WORDS,
    r"(?i)(?:트렌드|trend|분석|시장|데이터|전망|추이|현황|보고|파악)(?:\s+|$)"
);
static_regex!(LEADING_QUALIFIER, r"^(?:대한|관련|국내|해외)\s+");
static_regex!(TRAILING_PARTICLE, r"(?:에서|으로|의|을|를|은|는|와|과)$");
static_regex!(TOKEN_SPLIT, r"[,\s]+");
static_regex!(WHITESPACE, r"\s+");

static_regex!(
    TREND_PATTERN_TREND,
    r"(?i)(?P<keyword>[가-힣A-Za-z0-9&\s]+?)\s*(?:트렌드|trend)"
);
static_regex!(
    TREND_PATTERN_MARKET,
    r"(?i)(?P<keyword>[가-힣A-Za-z0-9&\s]+?)\s*(?:시장|수요)\s*(?:전망|분석|어떻게|추이)"
);
static_regex!(
    TREND_PATTERN_ABOUT,
    r"(?P<keyword>[가-힣A-Za-z0-9&\s]+?)\s*(?:에 대한|관련)\s*(?:트렌드|분석)"
);

static_regex!(PRODUCT_BUYER, r"(.+?)\s*구매자");
static_regex!(PRODUCT_SEGMENT, r"(.+?)[을를]\s*세그먼트");
static_regex!(PRODUCT_TARGET, r"(.+?)\s*타겟");
static_regex!(PRODUCT_POSSESSIVE_REVIEW, r"^([가-힣A-Za-z0-9\s]+?)의\s*리뷰");
static_regex!(PRODUCT_REVIEW, r"^([가-힣A-Za-z0-9\s]+?)\s*리뷰");
static_regex!(PRODUCT_SENTIMENT, r"^([가-힣A-Za-z0-9\s]+?)\s*감성\s*분석");
static_regex!(PRODUCT_AFTERWORD, r"^([가-힣A-Za-z0-9\s]+?)\s*후기");
static_regex!(PRODUCT_RATING, r"^([가-힣A-Za-z0-9\s]+?)\s*평가");
static_regex!(PRODUCT_ANALYZE, r"^([가-힣A-Za-z0-9\s]+?)[을를]\s*분석");
static_regex!(PRODUCT_SUFFIX, r"(?:구매자들?의|에\s*대한|관련)\s*$");

static_regex!(
    AD_PRODUCT,
    r"^(.+?)\s*(?:에\s*대한|의|을|를)?\s*(?:광고|문구|카피|헤드라인|슬로건)"
);

static_regex!(
    COMPETITOR_KEYWORD,
    r"경쟁사|비교|가격|시장|벤치마크|경쟁"
);
static_regex!(
    PRODUCT_SEPARATOR,
    r"(?i)\s*(?:,|/|\bvs\.?\s|와\s|과\s|랑\s|하고\s|및\s)\s*"
);

static_regex!(
    FILLER_PREFIX,
    r"^(?:마지막으로|이제|그럼|이번에는|다음으로|자)\s+"
);
static_regex!(
    SYNTHESIS_ABOUT,
    r"(.+?)\s*(?:에\s*대한|에\s*관한|의)\s*종합"
);
static_regex!(SYNTHESIS_REPORT, r"(.+?)\s*종합\s*보고서");
static_regex!(SYNTHESIS_STRATEGY, r"(.+?)\s*마케팅\s*전략");

static_regex!(WINDOW_DAYS, r"(\d+)\s*(?:일동안|일간|일|days?)");
static_regex!(WINDOW_WEEKS, r"(\d+)\s*(?:주간|주|weeks?)");
static_regex!(WINDOW_MONTHS, r"(\d+)\s*(?:개월|달|months?)");
static_regex!(WINDOW_YEARS, r"(\d+)\s*(?:년|years?)");

const STOPWORDS: &[&str] = &[
    "최근", "요즘", "지난", "이번", "다음", "개월", "달", "월", "주", "일", "년", "주간",
    "개월간", "분기", "반년", "트렌드", "trend", "분석", "알려줘", "해주세요", "해줘",
    "데이터", "시장", "어떻게", "요청", "보고", "정보", "관련", "대한", "입니다", "주세요",
    "please", "tell", "show", "about", "analysis", "정리", "해줘요", "알려주세요",
];

const AD_WORDS: &[&str] = &["광고", "문구", "카피", "헤드라인", "슬로건"];

const DEMONSTRATIVES: &[&str] = &[
    "그", "저", "이", "그것", "저것", "이것", "전체", "모든", "지금까지",
];

/// Default trend window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 180;
const MIN_WINDOW_DAYS: i64 = 7;
const MAX_WINDOW_DAYS: i64 = 365 * 10;

// ============================================================================
// Trend keyword
// ============================================================================

/// Normalize a raw keyword candidate; `None` when nothing meaningful is left
#[must_use]
pub fn clean_keyword(raw: &str) -> Option<String> {
    let cleaned = WHITESPACE.replace_all(raw.trim(), " ");
    let cleaned = PERIOD_EXPR.replace_all(&cleaned, "");
    let cleaned = ANALYSIS_WORDS.replace_all(&cleaned, "");
    let cleaned = LEADING_QUALIFIER.replace(cleaned.trim(), "");
    let cleaned = TRAILING_PARTICLE.replace(cleaned.trim(), "");
    let cleaned = cleaned
        .trim_matches(|c: char| c.is_whitespace() || "\"'()[]".contains(c))
        .to_string();

    if cleaned.chars().count() < 2 || STOPWORDS.contains(&cleaned.to_lowercase().as_str()) {
        return None;
    }
    Some(cleaned)
}

fn is_meaningful_token(token: &str) -> bool {
    let stripped = token.trim_matches(|c: char| "\"'()[]{}.,!?".contains(c));
    if stripped.is_empty() {
        return false;
    }
    let lower = stripped.to_lowercase();
    if STOPWORDS.contains(&lower.as_str()) {
        return false;
    }
    if lower.contains("트렌드") || lower.contains("trend") || lower.contains("분석") {
        return false;
    }
    !(stripped.chars().count() == 1 && !stripped.chars().all(|c| c.is_ascii_digit()))
}

/// Keyword for a trend query: quoted text, hashtag, phrase patterns, then
/// the first meaningful tokens
#[must_use]
pub fn trend_keyword(message: &str) -> Option<String> {
    let text = message.trim();
    if text.is_empty() {
        return None;
    }

    for caps in QUOTED.captures_iter(text) {
        if let Some(keyword) = caps.get(1).and_then(|m| clean_keyword(m.as_str())) {
            return Some(keyword);
        }
    }

    if let Some(keyword) = HASHTAG
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean_keyword(m.as_str()))
    {
        return Some(keyword);
    }

    let without_period = PERIOD_EXPR.replace_all(text, " ");
    for pattern in [&*TREND_PATTERN_TREND, &*TREND_PATTERN_MARKET, &*TREND_PATTERN_ABOUT] {
        if let Some(keyword) = pattern
            .captures(&without_period)
            .and_then(|caps| caps.name("keyword"))
            .and_then(|m| clean_keyword(m.as_str()))
        {
            return Some(keyword);
        }
    }

    let tokens: Vec<&str> = TOKEN_SPLIT
        .split(text)
        .filter(|t| !t.is_empty() && is_meaningful_token(t))
        .take(2)
        .collect();
    if tokens.is_empty() {
        return None;
    }
    clean_keyword(&tokens.join(" "))
}

// ============================================================================
// Products
// ============================================================================

fn tidy_product(raw: &str) -> Option<String> {
    let stripped = PRODUCT_SUFFIX.replace(raw.trim(), "");
    let stripped = FILLER_PREFIX.replace(stripped.trim(), "");
    let product = WHITESPACE.replace_all(stripped.trim(), " ").to_string();
    (product.chars().count() >= 2 && !DEMONSTRATIVES.contains(&product.as_str()))
        .then_some(product)
}

/// Product named in a segmentation or review request
#[must_use]
pub fn product_name(message: &str) -> Option<String> {
    let text = message.trim();
    let patterns: [&Regex; 9] = [
        &PRODUCT_BUYER,
        &PRODUCT_SEGMENT,
        &PRODUCT_TARGET,
        &PRODUCT_POSSESSIVE_REVIEW,
        &PRODUCT_REVIEW,
        &PRODUCT_SENTIMENT,
        &PRODUCT_AFTERWORD,
        &PRODUCT_RATING,
        &PRODUCT_ANALYZE,
    ];

    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| tidy_product(m.as_str()))
    })
}

/// Product named in an ad-copy request
#[must_use]
pub fn ad_product(message: &str) -> Option<String> {
    AD_PRODUCT
        .captures(message.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| tidy_product(m.as_str()))
        .and_then(|p| clean_keyword(&p))
        .filter(|p| !AD_WORDS.iter().any(|w| p.contains(w)))
}

/// Target product and named competitors in a competitor request.
///
/// `"아이폰 15 프로와 갤럭시 S24 울트라 비교"` yields the target
/// `아이폰 15 프로` and one competitor.
#[must_use]
pub fn competitor_subject(message: &str) -> Option<(String, Vec<String>)> {
    let text = FILLER_PREFIX.replace(message.trim(), "");
    let head = match COMPETITOR_KEYWORD.find(&text) {
        Some(m) => &text[..m.start()],
        None => &text[..],
    };
    let head = TRAILING_PARTICLE.replace(head.trim(), "");

    let mut names = PRODUCT_SEPARATOR
        .split(head.trim())
        .filter_map(|part| {
            let part = TRAILING_PARTICLE.replace(part.trim(), "");
            tidy_product(&part)
        });

    let target = names.next()?;
    let competitors: Vec<String> = names.filter(|n| *n != target).take(5).collect();
    Some((target, competitors))
}

/// Rule-based product category
#[must_use]
pub fn product_category(product: &str) -> &'static str {
    let lower = product.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if any(&["아이패드", "ipad", "갤럭시탭", "galaxy tab", "태블릿", "tablet"]) {
        "태블릿"
    } else if any(&["버즈", "buds", "에어팟", "airpods", "이어폰", "헤드폰", "earphone"]) {
        "이어폰/헤드폰"
    } else if any(&["워치", "watch", "밴드", "band"]) {
        "웨어러블"
    } else if any(&["아이폰", "iphone", "갤럭시", "galaxy", "샤오미", "xiaomi", "폰", "phone"]) {
        "스마트폰"
    } else if any(&["맥북", "macbook", "그램", "gram", "노트북", "laptop"]) {
        "노트북"
    } else {
        "기타"
    }
}

/// Optional product filter for a synthesis request
#[must_use]
pub fn synthesis_product_filter(message: &str) -> Option<String> {
    let mut text = message.trim().to_string();
    // Filler words can stack ("자 이제 ...")
    loop {
        let next = FILLER_PREFIX.replace(&text, "").to_string();
        if next == text {
            break;
        }
        text = next;
    }

    [&*SYNTHESIS_ABOUT, &*SYNTHESIS_REPORT, &*SYNTHESIS_STRATEGY]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| tidy_product(m.as_str()))
        })
}

// ============================================================================
// Time window
// ============================================================================

/// Trend analysis period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// First day
    pub start: NaiveDate,
    /// Last day (yesterday)
    pub end: NaiveDate,
    /// Series granularity
    pub time_unit: TimeUnit,
    /// Span in days
    pub days: i64,
}

/// Today's date in Korea
#[must_use]
pub fn today_kst() -> NaiveDate {
    (Utc::now() + Duration::hours(9)).date_naive()
}

fn captured_number(pattern: &Regex, text: &str) -> Option<i64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Resolve the analysis period mentioned in a message.
///
/// Without a period the window is the last 180 days, weekly. Explicit spans
/// are clamped to 7 days..10 years; the unit is daily up to 120 days,
/// weekly up to two years and monthly beyond. Windows end yesterday since
/// the trend provider has no data for the current day.
#[must_use]
pub fn resolve_time_window(message: &str, today: NaiveDate) -> TimeWindow {
    let end = today - Duration::days(1);
    let text = message.to_lowercase();

    let days = captured_number(&WINDOW_DAYS, &text)
        .map(|d| d.max(1))
        .or_else(|| captured_number(&WINDOW_WEEKS, &text).map(|w| w.saturating_mul(7)))
        .or_else(|| captured_number(&WINDOW_MONTHS, &text).map(|m| m.saturating_mul(30)))
        .or_else(|| captured_number(&WINDOW_YEARS, &text).map(|y| y.saturating_mul(365)))
        .or_else(|| {
            let condensed: String = text.split_whitespace().collect();
            if text.contains("분기") {
                Some(90)
            } else if text.contains("반년") {
                Some(180)
            } else if condensed.contains("일년") {
                Some(365)
            } else {
                None
            }
        });

    let Some(days) = days else {
        return TimeWindow {
            start: end - Duration::days(DEFAULT_WINDOW_DAYS),
            end,
            time_unit: TimeUnit::Week,
            days: DEFAULT_WINDOW_DAYS,
        };
    };

    let days = days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS);
    let time_unit = if days > 365 * 2 {
        TimeUnit::Month
    } else if days > 120 {
        TimeUnit::Week
    } else {
        TimeUnit::Date
    };

    TimeWindow {
        start: end - Duration::days(days),
        end,
        time_unit,
        days,
    }
}
