//! Error types for mercato-core
//!
//! Agent failures never reach the HTTP layer as errors: the orchestrator
//! turns them into chat replies through [`Error::guidance`] and
//! [`Error::user_message`].

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown session or report
    #[error("not found: {0}")]
    NotFound(String),

    /// Not enough prior results to synthesize
    #[error("insufficient data: found {found} results, need {required}")]
    InsufficientData {
        /// Results available after filtering
        found: usize,
        /// Results required
        required: usize,
        /// Product filter in effect
        product: Option<String>,
    },

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] mercato_llm::Error),

    /// Store error
    #[error("store error: {0}")]
    Store(#[from] mercato_store::Error),

    /// Artifact rendering error
    #[error("render error: {0}")]
    Render(#[from] mercato_report::Error),

    /// Internal error (panics, serialization)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reply used when an agent fails for a reason the user cannot act on
pub const APOLOGY: &str = "죄송합니다. 요청을 처리하는 중 문제가 발생했습니다. 잠시 후 다시 시도해 주세요.";

impl Error {
    /// Actionable text for failures the user can fix, if any
    #[must_use]
    pub fn guidance(&self) -> Option<String> {
        match self {
            Error::InsufficientData {
                found,
                required,
                product,
            } => {
                let scope = match product {
                    Some(p) => format!("'{p}'에 대한 "),
                    None => String::new(),
                };
                let example = product.as_deref().unwrap_or("에어팟 프로");
                Some(format!(
                    "종합 보고서를 만들려면 {scope}분석 결과가 최소 {required}개 필요합니다 (현재 {found}개).\n\n\
                     먼저 다음과 같은 분석을 실행해 주세요:\n\
                     - 트렌드 분석: \"{example} 트렌드 분석해줘\"\n\
                     - 광고 문구 생성: \"{example} 광고 문구 만들어줘\"\n\
                     - 세그먼트 분류: \"{example} 구매자를 세그먼트로 분류해줘\"\n\
                     - 리뷰 감성 분석: \"{example} 리뷰 분석해줘\"\n\
                     - 경쟁사 분석: \"{example} 경쟁사 분석해줘\""
                ))
            }
            _ => None,
        }
    }

    /// Text stored and returned as the assistant reply for this failure
    #[must_use]
    pub fn user_message(&self) -> String {
        self.guidance().unwrap_or_else(|| APOLOGY.to_string())
    }

    /// Whether the failure is the user's to fix rather than ours
    #[must_use]
    pub fn is_guidance(&self) -> bool {
        matches!(self, Error::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_guidance_names_product() {
        let err = Error::InsufficientData {
            found: 1,
            required: 2,
            product: Some("신라면".to_string()),
        };
        let text = err.user_message();
        assert!(text.contains("'신라면'"));
        assert!(text.contains("최소 2개"));
        assert!(err.is_guidance());
    }

    #[test]
    fn test_other_errors_apologize() {
        let err = Error::Llm(mercato_llm::Error::Timeout(60_000));
        assert_eq!(err.user_message(), APOLOGY);
        assert!(err.guidance().is_none());
        assert!(!err.to_string().is_empty());
    }
}
