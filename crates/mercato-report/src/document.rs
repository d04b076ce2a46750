//! Renderer-neutral report model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One content block inside a section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Free text; embedded newlines start new lines
    Paragraph {
        /// Text
        text: String,
    },
    /// Bulleted list
    Bullets {
        /// Items
        items: Vec<String>,
    },
    /// Simple table
    Table {
        /// Column headers
        headers: Vec<String>,
        /// Rows of cells
        rows: Vec<Vec<String>>,
    },
}

/// A titled report section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    /// Section heading
    pub heading: String,
    /// Content in order
    pub blocks: Vec<Block>,
}

impl ReportSection {
    /// Create an empty section
    #[must_use]
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    /// Append a paragraph; blank text is skipped
    #[must_use]
    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.blocks.push(Block::Paragraph { text });
        }
        self
    }

    /// Append a bullet list; an empty list is skipped
    #[must_use]
    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if !items.is_empty() {
            self.blocks.push(Block::Bullets { items });
        }
        self
    }

    /// Append a table
    #[must_use]
    pub fn table(mut self, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        self.blocks.push(Block::Table { headers, rows });
        self
    }

    /// Whether the section has no content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A complete report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    /// Report title
    pub title: String,
    /// Line under the title
    pub subtitle: Option<String>,
    /// Creation time
    pub generated_at: DateTime<Utc>,
    /// Sections in order
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    /// Create an empty report
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    /// Set the subtitle
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Append a section; empty sections are dropped
    #[must_use]
    pub fn section(mut self, section: ReportSection) -> Self {
        if !section.is_empty() {
            self.sections.push(section);
        }
        self
    }

    /// Human-readable creation time
    #[must_use]
    pub fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_skips_empty_content() {
        let doc = ReportDocument::new("리뷰 분석")
            .with_subtitle("에어팟 프로")
            .section(ReportSection::new("빈 섹션").paragraph("  ").bullets(Vec::<String>::new()))
            .section(ReportSection::new("요약").paragraph("긍정 리뷰가 많습니다"));

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].heading, "요약");
        assert_eq!(doc.subtitle.as_deref(), Some("에어팟 프로"));
    }

    #[test]
    fn test_block_serialization_is_tagged() {
        let block = Block::Bullets {
            items: vec!["a".to_string()],
        };
        let value = minijinja::Value::from_serialize(&block);
        let kind = value.get_attr("kind").unwrap();
        assert_eq!(kind.as_str(), Some("bullets"));
    }
}
