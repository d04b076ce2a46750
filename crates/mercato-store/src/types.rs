//! Persisted record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default number of documents returned by a search
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Maximum length of a derived search document title
const MAX_DERIVED_TITLE_CHARS: usize = 200;

// ============================================================================
// Sessions and messages
// ============================================================================

/// A chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: Uuid,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Role of a stored chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message typed by the user
    User,
    /// Reply produced by the service
    Assistant,
    /// Internal bookkeeping message
    System,
}

impl ChatRole {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(format!("unknown chat role: {other}")),
        }
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Insertion sequence number
    pub id: i64,
    /// Owning session
    pub session_id: Uuid,
    /// Author role
    pub role: ChatRole,
    /// Message text
    pub content: String,
    /// When the message was stored
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Task results
// ============================================================================

/// Kind of analysis a task result holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Consumer trend analysis
    Trend,
    /// Advertising copy generation
    AdCopy,
    /// Customer segmentation
    Segment,
    /// Review sentiment analysis
    Review,
    /// Competitor analysis
    Competitor,
    /// Combined strategy report
    Synthesis,
}

impl TaskType {
    /// All task types in registration order
    pub const ALL: [TaskType; 6] = [
        Self::Trend,
        Self::AdCopy,
        Self::Segment,
        Self::Review,
        Self::Competitor,
        Self::Synthesis,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::AdCopy => "ad_copy",
            Self::Segment => "segment",
            Self::Review => "review",
            Self::Competitor => "competitor",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown task type: {s}"))
    }
}

/// A persisted agent result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Result ID
    pub id: Uuid,
    /// Owning session
    pub session_id: Uuid,
    /// Which agent produced it
    pub task_type: TaskType,
    /// Subject of the analysis (product or keyword)
    pub product_name: Option<String>,
    /// Structured payload
    pub result_data: serde_json::Value,
    /// Rendered PDF artifact file name
    pub pdf_path: Option<String>,
    /// Rendered HTML artifact file name
    pub html_path: Option<String>,
    /// When the result was stored
    pub created_at: DateTime<Utc>,
}

/// A task result waiting to be stored
#[derive(Debug, Clone)]
pub struct NewTaskResult {
    /// Pre-allocated ID, so artifacts can be named before insertion
    pub id: Uuid,
    /// Owning session
    pub session_id: Uuid,
    /// Which agent produced it
    pub task_type: TaskType,
    /// Subject of the analysis
    pub product_name: Option<String>,
    /// Structured payload
    pub result_data: serde_json::Value,
    /// PDF artifact file name
    pub pdf_path: Option<String>,
    /// HTML artifact file name
    pub html_path: Option<String>,
}

impl NewTaskResult {
    /// Create a new result with a fresh ID
    #[must_use]
    pub fn new(session_id: Uuid, task_type: TaskType, result_data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            task_type,
            product_name: None,
            result_data,
            pdf_path: None,
            html_path: None,
        }
    }

    /// Use a specific ID
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set the analysed subject
    #[must_use]
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product_name = Some(product.into());
        self
    }

    /// Attach a PDF artifact
    #[must_use]
    pub fn with_pdf_path(mut self, path: impl Into<String>) -> Self {
        self.pdf_path = Some(path.into());
        self
    }

    /// Attach an HTML artifact
    #[must_use]
    pub fn with_html_path(mut self, path: impl Into<String>) -> Self {
        self.html_path = Some(path.into());
        self
    }
}

// ============================================================================
// Search documents
// ============================================================================

/// A searchable document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDoc {
    /// Document ID
    pub id: Uuid,
    /// Category tag (usually a task type)
    pub category: String,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Free-form metadata
    pub metadata: serde_json::Value,
    /// When the document was stored
    pub created_at: DateTime<Utc>,
}

/// A search document waiting to be stored
#[derive(Debug, Clone)]
pub struct NewSearchDoc {
    /// Category tag
    pub category: String,
    /// Body text
    pub content: String,
    /// Free-form metadata; `title` and `product_name` keys feed the title
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NewSearchDoc {
    /// Create a document in a category
    #[must_use]
    pub fn new(category: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Title resolution: metadata title, then product name, then the
    /// first content line cut to 200 characters.
    #[must_use]
    pub fn resolve_title(&self) -> String {
        for key in ["title", "product_name"] {
            if let Some(value) = self.metadata.get(key).and_then(|v| v.as_str()) {
                if !value.trim().is_empty() {
                    return value.trim().to_string();
                }
            }
        }

        let first_line = self.content.lines().next().unwrap_or_default().trim();
        first_line.chars().take(MAX_DERIVED_TITLE_CHARS).collect()
    }
}

/// Search request
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text query
    pub text: String,
    /// Restrict to one category
    pub category: Option<String>,
    /// Maximum results
    pub limit: usize,
}

impl SearchQuery {
    /// Create a query with the default limit
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Restrict to one category
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the result limit
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Which lookup produced a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// FTS5 match ranked by bm25
    Ranked,
    /// LIKE containment in insertion order
    Substring,
}

/// Search outcome
#[derive(Debug, Clone)]
pub struct SearchHits {
    /// Strategy that produced `docs`
    pub strategy: SearchStrategy,
    /// Matching documents, most relevant first
    pub docs: Vec<SearchDoc>,
}
