//! PDF renderer
//!
//! Lays text out top to bottom on A4 pages. Without a configured TTF font
//! the built-in Helvetica is used, which only covers Latin-1; other
//! characters are printed as `?`. Point `font_path` at a Hangul-capable
//! font (e.g. NanumGothic) for Korean reports.

use crate::artifact::ArtifactFormat;
use crate::document::{Block, ReportDocument};
use crate::error::{Error, Result};
use crate::writer::ReportRenderer;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::debug;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_TOP: f32 = 277.0;
const MARGIN_BOTTOM: f32 = 20.0;

const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;

/// Width budget per line, counted in half-width units
const LINE_UNITS: usize = 92;

/// PDF renderer
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    font_path: Option<PathBuf>,
}

impl PdfRenderer {
    /// Renderer using the built-in Helvetica font
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed a TrueType font instead of the built-in one
    #[must_use]
    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Whether a custom font is configured
    #[must_use]
    pub fn has_custom_font(&self) -> bool {
        self.font_path.is_some()
    }

    fn load_font(&self, pdf: &PdfDocumentReference) -> Result<IndirectFontRef> {
        match &self.font_path {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
                pdf.add_external_font(BufReader::new(file))
                    .map_err(|e| Error::Font(e.to_string()))
            }
            None => pdf
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| Error::Font(e.to_string())),
        }
    }
}

impl ReportRenderer for PdfRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Pdf
    }

    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>> {
        let (pdf, page, layer) = PdfDocument::new(
            doc.title.as_str(),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let font = self.load_font(&pdf)?;
        let layer = pdf.get_page(page).get_layer(layer);

        {
            let mut cursor = Cursor {
                pdf: &pdf,
                layer,
                font: &font,
                y: MARGIN_TOP,
                unicode: self.has_custom_font(),
                pages: 1,
            };

            cursor.write(&doc.title, TITLE_SIZE, 0.0);
            if let Some(subtitle) = &doc.subtitle {
                cursor.write(subtitle, SUBTITLE_SIZE, 0.0);
            }
            cursor.write(&format!("Generated: {}", doc.generated_label()), BODY_SIZE, 0.0);
            cursor.gap(6.0);

            for section in &doc.sections {
                cursor.write(&section.heading, HEADING_SIZE, 0.0);
                cursor.gap(1.5);
                for block in &section.blocks {
                    cursor.block(block);
                    cursor.gap(2.0);
                }
                cursor.gap(4.0);
            }

            debug!(pages = cursor.pages, title = %doc.title, "Rendered PDF");
        }

        pdf.save_to_bytes().map_err(|e| Error::Pdf(e.to_string()))
    }
}

/// Write position on the current page
struct Cursor<'a> {
    pdf: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    y: f32,
    unicode: bool,
    pages: usize,
}

impl Cursor<'_> {
    fn line_height(size: f32) -> f32 {
        size * 0.55
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            let (page, layer) = self.pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.pdf.get_page(page).get_layer(layer);
            self.y = MARGIN_TOP;
            self.pages += 1;
        }
    }

    fn write(&mut self, text: &str, size: f32, indent: f32) {
        let budget = (LINE_UNITS as f32 * BODY_SIZE / size) as usize;
        for raw_line in text.lines() {
            for line in wrap_line(raw_line, budget.saturating_sub(indent as usize / 2)) {
                let height = Self::line_height(size);
                self.ensure_room(height);
                self.y -= height;
                let printable = if self.unicode {
                    line
                } else {
                    latin1_only(&line)
                };
                self.layer
                    .use_text(printable, size, Mm(MARGIN_LEFT + indent), Mm(self.y), self.font);
            }
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph { text } => self.write(text, BODY_SIZE, 0.0),
            Block::Bullets { items } => {
                for item in items {
                    self.write(&format!("- {item}"), BODY_SIZE, 4.0);
                }
            }
            Block::Table { headers, rows } => {
                self.write(&headers.join(" | "), BODY_SIZE, 0.0);
                self.write(&"-".repeat(60), BODY_SIZE, 0.0);
                for row in rows {
                    self.write(&row.join(" | "), BODY_SIZE, 0.0);
                }
            }
        }
    }
}

fn char_units(c: char) -> usize {
    if c.is_ascii() {
        1
    } else {
        2
    }
}

/// Split a line into pieces that fit `max_units`, preferring word boundaries
pub(crate) fn wrap_line(line: &str, max_units: usize) -> Vec<String> {
    let max_units = max_units.max(8);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in line.split(' ') {
        let word_width: usize = word.chars().map(char_units).sum();
        let sep = usize::from(!current.is_empty());

        if width + sep + word_width <= max_units {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            width += sep + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            width = 0;
        }

        for c in word.chars() {
            let w = char_units(c);
            if width + w > max_units {
                lines.push(std::mem::take(&mut current));
                width = 0;
            }
            current.push(c);
            width += w;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn latin1_only(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReportSection;

    fn sample() -> ReportDocument {
        ReportDocument::new("Smartwatch trend report")
            .with_subtitle("스마트워치")
            .section(
                ReportSection::new("Summary")
                    .paragraph("Interest grew 12% over the window.\nMomentum is positive.")
                    .bullets(["peak in week 12", "volatility 4.2"]),
            )
            .section(ReportSection::new("Series").table(
                vec!["date".to_string(), "value".to_string()],
                vec![vec!["2024-01-01".to_string(), "42.0".to_string()]],
            ))
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = PdfRenderer::new().render(&sample()).unwrap();
        assert!(bytes.len() > 500);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_report_spans_pages() {
        let mut section = ReportSection::new("Long");
        for i in 0..200 {
            section = section.paragraph(format!("line number {i}"));
        }
        let doc = ReportDocument::new("Long").section(section);
        let bytes = PdfRenderer::new().render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_font_is_font_error() {
        let renderer = PdfRenderer::new().with_font("/nonexistent/font.ttf");
        let err = renderer.render(&sample()).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn test_wrap_line_respects_width() {
        let wrapped = wrap_line("alpha beta gamma delta", 11);
        assert_eq!(wrapped, vec!["alpha beta", "gamma delta"]);

        // wide characters count double
        let wrapped = wrap_line("가나다라마바사아자차", 8);
        assert_eq!(wrapped, vec!["가나다라", "마바사아", "자차"]);

        assert_eq!(wrap_line("", 20), vec![String::new()]);
    }

    #[test]
    fn test_latin1_replacement() {
        assert_eq!(latin1_only("café 스마트"), "café ???");
    }
}
