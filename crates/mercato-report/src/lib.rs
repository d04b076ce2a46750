//! Mercato Report - turning agent results into downloadable artifacts
//!
//! - Document: renderer-neutral report model (sections, paragraphs, bullets, tables)
//! - PDF: printpdf renderer with optional embedded TTF for Hangul
//! - HTML: minijinja renderer with auto-escaping
//! - Artifact: file naming, writing and safe lookup in the output directory

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod document;
pub mod error;
pub mod html;
pub mod pdf;
pub mod writer;

pub use artifact::{ArtifactFormat, ArtifactRef, ArtifactStore};
pub use document::{Block, ReportDocument, ReportSection};
pub use error::{Error, Result};
pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;
pub use writer::{ReportRenderer, ReportWriter};
