//! Artifact naming, writing and lookup
//!
//! Artifacts are named `{task_type}_report_{YYYYmmdd_HHMMSS}_{id8}.{ext}`
//! where `id8` is the first 8 hex characters of the task result id. The
//! file name doubles as the public report id.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Portable document
    Pdf,
    /// Self-contained HTML page
    Html,
}

impl ArtifactFormat {
    /// File extension without the dot
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }

    /// MIME type served for this format
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Html => "text/html; charset=utf-8",
        }
    }

    /// Detect the format from a file name
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A written artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Bare file name, used as the report id
    pub file_name: String,
    /// Full path on disk
    pub path: PathBuf,
    /// Format
    pub format: ArtifactFormat,
}

/// Directory holding generated artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Use `dir` as the output directory; it is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build the artifact file name for a result
    #[must_use]
    pub fn file_name(
        task_type: &str,
        result_id: Uuid,
        created_at: DateTime<Utc>,
        format: ArtifactFormat,
    ) -> String {
        let simple = result_id.simple().to_string();
        format!(
            "{}_report_{}_{}.{}",
            task_type,
            created_at.format("%Y%m%d_%H%M%S"),
            &simple[..8],
            format.extension()
        )
    }

    /// Write bytes under `file_name`
    pub async fn write(
        &self,
        file_name: &str,
        format: ArtifactFormat,
        bytes: &[u8],
    ) -> Result<ArtifactRef> {
        validate_name(file_name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Io(format!("{}: {e}", self.dir.display())))?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

        info!(file = %file_name, bytes = bytes.len(), "Artifact written");
        Ok(ArtifactRef {
            file_name: file_name.to_string(),
            path,
            format,
        })
    }

    /// Find an existing artifact by its report id
    pub async fn resolve(&self, report_id: &str) -> Result<ArtifactRef> {
        validate_name(report_id)?;

        let format = ArtifactFormat::from_file_name(report_id)
            .ok_or_else(|| Error::NotFound(report_id.to_string()))?;
        let path = self.dir.join(report_id);

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(ArtifactRef {
                file_name: report_id.to_string(),
                path,
                format,
            }),
            _ => {
                debug!(report_id, "Artifact lookup missed");
                Err(Error::NotFound(report_id.to_string()))
            }
        }
    }
}

/// Reject anything that could escape the output directory
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains("..") || name.contains('/') || name.contains('\\')
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_pattern() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();

        let name = ArtifactStore::file_name("trend", id, at, ArtifactFormat::Pdf);
        assert_eq!(name, "trend_report_20240517_090307_1b4e28ba.pdf");

        let name = ArtifactStore::file_name("competitor", id, at, ArtifactFormat::Html);
        assert!(name.ends_with("_1b4e28ba.html"));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ArtifactFormat::from_file_name("a.pdf"), Some(ArtifactFormat::Pdf));
        assert_eq!(ArtifactFormat::from_file_name("a.HTML"), Some(ArtifactFormat::Html));
        assert_eq!(ArtifactFormat::from_file_name("a.txt"), None);
        assert_eq!(ArtifactFormat::from_file_name("noext"), None);
    }

    #[tokio::test]
    async fn test_write_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("reports"));

        let written = store
            .write("trend_report_x.pdf", ArtifactFormat::Pdf, b"%PDF-1.3")
            .await
            .unwrap();
        assert!(written.path.exists());

        let found = store.resolve("trend_report_x.pdf").await.unwrap();
        assert_eq!(found, written);
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        for bad in ["../secret.pdf", "a/b.pdf", "a\\b.pdf", "..", ""] {
            let err = store.resolve(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidName(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.resolve("nothing_here.pdf").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
