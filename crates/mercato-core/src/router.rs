//! Keyword router
//!
//! An explicit ordered table; the first entry with any keyword contained in
//! the lowercased message wins. Matching is substring-only, not intent
//! classification.

use mercato_store::TaskType;
use tracing::debug;

/// One routing table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    /// Agent selected by this row
    pub task_type: TaskType,
    /// Display name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Trigger keywords
    pub keywords: &'static [&'static str],
}

/// Default table, in registration order
pub const DEFAULT_ROUTES: [RouteEntry; 6] = [
    RouteEntry {
        task_type: TaskType::Trend,
        name: "소비 트렌드 분석",
        description: "특정 키워드나 제품의 트렌드를 분석합니다.",
        keywords: &["트렌드", "유행", "인기", "검색량", "관심도", "소비"],
    },
    RouteEntry {
        task_type: TaskType::AdCopy,
        name: "광고 문구 생성",
        description: "제품/서비스에 맞는 광고 문구를 생성합니다.",
        keywords: &["광고", "문구", "카피", "헤드라인", "슬로건"],
    },
    RouteEntry {
        task_type: TaskType::Segment,
        name: "사용자 세그먼트 분류",
        description: "구매자 리뷰를 바탕으로 고객을 세그먼트로 분류합니다.",
        keywords: &["세그먼트", "고객분류", "타겟", "페르소나", "클러스터", "그룹"],
    },
    RouteEntry {
        task_type: TaskType::Review,
        name: "리뷰 감성 분석",
        description: "제품 리뷰의 감성을 분석하고 요약합니다.",
        keywords: &["리뷰", "감성", "평가", "후기", "댓글", "의견"],
    },
    RouteEntry {
        task_type: TaskType::Competitor,
        name: "경쟁사 분석",
        description: "경쟁 제품/서비스를 분석하고 비교합니다.",
        keywords: &["경쟁사", "비교", "가격", "시장", "벤치마크", "경쟁"],
    },
    RouteEntry {
        task_type: TaskType::Synthesis,
        name: "마케팅 전략 종합 보고서",
        description: "모든 분석 결과를 종합하여 통합 마케팅 전략을 제시합니다.",
        keywords: &["종합", "통합", "전체", "보고서", "정리", "마케팅 전략", "전략 보고서"],
    },
];

/// Words that mark a follow-up to the previous task
pub const CONTINUATION_WORDS: [&str; 7] = ["추가", "더", "또", "계속", "more", "another", "extra"];

/// Ordered keyword router
#[derive(Debug, Clone)]
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router over the default table
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DEFAULT_ROUTES.to_vec(),
        }
    }

    /// Router over a custom table
    #[must_use]
    pub fn with_entries(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// Table rows in order
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// First task type whose keyword occurs in the message
    #[must_use]
    pub fn select(&self, message: &str) -> Option<TaskType> {
        let lowered = message.to_lowercase();
        self.entries.iter().find_map(|entry| {
            entry
                .keywords
                .iter()
                .find(|kw| lowered.contains(*kw))
                .map(|kw| {
                    debug!(task_type = %entry.task_type, keyword = kw, "Route matched");
                    entry.task_type
                })
        })
    }

    /// Whether the message asks to continue the previous task
    #[must_use]
    pub fn is_continuation(message: &str) -> bool {
        let lowered = message.to_lowercase();
        CONTINUATION_WORDS.iter().any(|w| lowered.contains(w))
    }

    /// Static listing of what the service can do
    #[must_use]
    pub fn capability_message(&self) -> String {
        let mut text = String::from("🛍️ 커머스 마케팅 AI 에이전트 - 사용 가능한 태스크:\n\n");

        for entry in &self.entries {
            let keywords: Vec<&str> = entry.keywords.iter().take(3).copied().collect();
            text.push_str(&format!("• **{}**\n", entry.name));
            text.push_str(&format!("  - 설명: {}\n", entry.description));
            text.push_str(&format!("  - 키워드: {}\n\n", keywords.join(", ")));
        }

        text.push_str("예시:\n");
        text.push_str("- \"최근 반려동물 관련 트렌드 분석해줘\"\n");
        text.push_str("- \"친환경 세제 광고 문구 만들어줘\"\n");
        text.push_str("- \"에어팟 프로 리뷰 감성 분석해줘\"\n");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_match() {
        let router = Router::new();
        assert_eq!(router.select("스마트워치 트렌드 분석"), Some(TaskType::Trend));
        assert_eq!(
            router.select("에어팟 프로 구매자를 세그먼트로 분류해줘"),
            Some(TaskType::Segment)
        );
        assert_eq!(router.select("종합 보고서 만들어줘"), Some(TaskType::Synthesis));
        assert_eq!(router.select("갤럭시 버즈 경쟁사 분석"), Some(TaskType::Competitor));
    }

    #[test]
    fn test_first_registered_wins() {
        let router = Router::new();
        // "광고" (ad_copy) and "리뷰" (review) both match
        assert_eq!(router.select("리뷰 기반 광고 문구"), Some(TaskType::AdCopy));
        // "트렌드" (trend) beats "보고서" (synthesis)
        assert_eq!(router.select("트렌드 보고서"), Some(TaskType::Trend));
    }

    #[test]
    fn test_no_match() {
        let router = Router::new();
        assert_eq!(router.select("안녕"), None);
        assert_eq!(router.select(""), None);
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let router = Router::with_entries(vec![RouteEntry {
            task_type: TaskType::Trend,
            name: "trend",
            description: "",
            keywords: &["trend"],
        }]);
        assert_eq!(router.select("Show me the TREND"), Some(TaskType::Trend));
    }

    #[test]
    fn test_continuation_words() {
        assert!(Router::is_continuation("조금 더 만들어줘"));
        assert!(Router::is_continuation("Give me ANOTHER one"));
        assert!(!Router::is_continuation("안녕"));
    }

    #[test]
    fn test_capability_message_lists_every_agent() {
        let text = Router::new().capability_message();
        for entry in DEFAULT_ROUTES {
            assert!(text.contains(entry.name));
        }
        assert!(text.contains("트렌드, 유행, 인기"));
        assert!(!text.contains("검색량"));
    }
}
