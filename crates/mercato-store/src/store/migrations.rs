//! Schema setup

use super::Store;
use crate::error::{Error, Result};
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

impl Store {
    /// Run database migrations
    pub(super) async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task_results (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                task_type TEXT NOT NULL,
                product_name TEXT,
                result_data TEXT NOT NULL,
                pdf_path TEXT,
                html_path TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_task_results_session ON task_results(session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_docs (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_search_docs_category ON search_docs(category)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        // FTS5 may be compiled out of the linked SQLite; substring search covers that case.
        let fts = sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS search_docs_fts USING fts5(
                doc_id UNINDEXED,
                title,
                content,
                tokenize = 'unicode61'
            )
            "#,
        )
        .execute(&self.pool)
        .await;

        match fts {
            Ok(_) => {
                self.fts_ready.store(true, Ordering::Relaxed);
                self.full_text.store(true, Ordering::Relaxed);
                debug!("FTS5 index ready");
            }
            Err(e) => {
                self.fts_ready.store(false, Ordering::Relaxed);
                self.full_text.store(false, Ordering::Relaxed);
                warn!(error = %e, "FTS5 unavailable, search will use substring matching");
            }
        }

        Ok(())
    }
}
