//! Store - SQLite persistence
//!
//! One `Store` value is shared by the whole process; it is cheap to clone
//! and every clone talks to the same connection pool.

mod helpers;
mod migrations;
mod results;
mod search;
mod sessions;

#[cfg(test)]
mod tests;

pub use helpers::{default_data_dir, default_db_path};

use crate::error::{Error, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Relational store for sessions, messages, task results and search documents
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    full_text: Arc<AtomicBool>,
    /// The FTS5 table exists; documents are indexed even while ranked search is off
    fts_ready: Arc<AtomicBool>,
}

impl Store {
    /// Open (or create) a database file and run migrations
    pub async fn from_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Database(format!("failed to create directory: {e}")))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self::with_pool(pool);
        store.run_migrations().await?;

        info!("SQLite store initialized at {}", db_path.display());
        Ok(store)
    }

    /// Create a new in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // A memory database lives and dies with its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self::with_pool(pool);
        store.run_migrations().await?;

        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            full_text: Arc::new(AtomicBool::new(false)),
            fts_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a reference to the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether ranked full-text search is currently used
    #[must_use]
    pub fn full_text_enabled(&self) -> bool {
        self.full_text.load(Ordering::Relaxed)
    }

    /// Turn ranked search on or off at runtime.
    ///
    /// Turning it on only takes effect when the FTS5 table exists;
    /// otherwise ranked search is switched off. Documents missing from the
    /// index are added back before ranked search resumes.
    pub async fn set_full_text_enabled(&self, enabled: bool) {
        if enabled && !self.fts_table_exists().await {
            warn!("Full-text index is not available; keeping substring search");
            self.fts_ready.store(false, Ordering::Relaxed);
            self.full_text.store(false, Ordering::Relaxed);
            return;
        }
        if enabled {
            if let Err(e) = self.reindex_missing().await {
                warn!(error = %e, "Failed to rebuild full-text index; keeping substring search");
                self.full_text.store(false, Ordering::Relaxed);
                return;
            }
        }
        self.full_text.store(enabled, Ordering::Relaxed);
        info!(enabled, "Full-text search toggled");
    }

    /// Check that the database answers queries
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Index every document that has no FTS row yet
    async fn reindex_missing(&self) -> Result<u64> {
        let added = sqlx::query(
            r#"
            INSERT INTO search_docs_fts (doc_id, title, content)
            SELECT id, title, content FROM search_docs
            WHERE id NOT IN (SELECT doc_id FROM search_docs_fts)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?
        .rows_affected();

        if added > 0 {
            info!(added, "Indexed documents missing from the full-text index");
        }
        Ok(added)
    }

    async fn fts_table_exists(&self) -> bool {
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'search_docs_fts'")
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.is_some())
            .unwrap_or(false)
    }
}
