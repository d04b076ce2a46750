//! ReportWriter - render a document and store it as an artifact

use crate::artifact::{ArtifactFormat, ArtifactRef, ArtifactStore};
use crate::document::ReportDocument;
use crate::error::Result;
use crate::html::HtmlRenderer;
use crate::pdf::PdfRenderer;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

/// Turns a document into file bytes of one format
pub trait ReportRenderer: Send + Sync {
    /// Format produced by this renderer
    fn format(&self) -> ArtifactFormat;

    /// Render the document
    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>>;
}

/// Renders documents and writes them to the artifact directory
#[derive(Debug)]
pub struct ReportWriter {
    pdf: PdfRenderer,
    html: HtmlRenderer,
    artifacts: ArtifactStore,
}

impl ReportWriter {
    /// Create a writer with the default renderers
    pub fn new(artifacts: ArtifactStore) -> Result<Self> {
        Ok(Self {
            pdf: PdfRenderer::new(),
            html: HtmlRenderer::new()?,
            artifacts,
        })
    }

    /// Replace the PDF renderer (e.g. one with an embedded font)
    #[must_use]
    pub fn with_pdf_renderer(mut self, pdf: PdfRenderer) -> Self {
        self.pdf = pdf;
        self
    }

    /// Artifact directory
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    fn renderer(&self, format: ArtifactFormat) -> &dyn ReportRenderer {
        match format {
            ArtifactFormat::Pdf => &self.pdf,
            ArtifactFormat::Html => &self.html,
        }
    }

    /// Render `doc` and write it under the standard artifact name
    #[instrument(skip(self, doc), fields(title = %doc.title))]
    pub async fn write(
        &self,
        task_type: &str,
        result_id: Uuid,
        doc: &ReportDocument,
        format: ArtifactFormat,
    ) -> Result<ArtifactRef> {
        let bytes = self.renderer(format).render(doc)?;
        let name = ArtifactStore::file_name(task_type, result_id, Utc::now(), format);
        self.artifacts.write(&name, format, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReportSection;

    #[tokio::test]
    async fn test_write_pdf_and_html() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(ArtifactStore::new(dir.path())).unwrap();
        let doc = ReportDocument::new("Trend").section(ReportSection::new("Summary").paragraph("up"));
        let id = Uuid::new_v4();

        let pdf = writer.write("trend", id, &doc, ArtifactFormat::Pdf).await.unwrap();
        assert!(pdf.file_name.starts_with("trend_report_"));
        assert!(pdf.file_name.ends_with(".pdf"));
        let bytes = std::fs::read(&pdf.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let html = writer
            .write("competitor", id, &doc, ArtifactFormat::Html)
            .await
            .unwrap();
        assert!(html.file_name.ends_with(".html"));
        assert_eq!(
            writer.artifacts().resolve(&html.file_name).await.unwrap().format,
            ArtifactFormat::Html
        );
    }
}
