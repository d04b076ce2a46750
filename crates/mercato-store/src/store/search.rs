//! Search documents and the two-step lookup
//!
//! Lookup order:
//! 1. Ranked: FTS5 `MATCH` ordered by bm25, when the index is enabled.
//! 2. Substring: `LIKE` containment in insertion order.
//!
//! Step 2 runs when the index is disabled or missing, when the ranked query
//! errors, or when it returns nothing (the unicode61 tokenizer keeps Korean
//! particles attached to words, so exact terms can miss).

use super::helpers::{
    format_timestamp, fts_match_expression, like_pattern, row_to_search_doc,
};
use super::Store;
use crate::error::{Error, Result};
use crate::types::{NewSearchDoc, SearchDoc, SearchHits, SearchQuery, SearchStrategy};
use chrono::Utc;
use std::sync::atomic::Ordering;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

impl Store {
    /// Store a document and index it for ranked search.
    ///
    /// The index row is written whenever the FTS5 table exists, so turning
    /// ranked search back on never hides documents stored in the meantime.
    #[instrument(skip(self, doc), fields(category = %doc.category))]
    pub async fn add_search_doc(&self, doc: NewSearchDoc) -> Result<SearchDoc> {
        let stored = SearchDoc {
            id: Uuid::new_v4(),
            title: doc.resolve_title(),
            category: doc.category,
            content: doc.content,
            metadata: serde_json::Value::Object(doc.metadata),
            created_at: Utc::now(),
        };
        let metadata = serde_json::to_string(&stored.metadata)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO search_docs (id, category, title, content, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(stored.id.to_string())
        .bind(&stored.category)
        .bind(&stored.title)
        .bind(&stored.content)
        .bind(&metadata)
        .bind(format_timestamp(stored.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        if self.fts_ready.load(Ordering::Relaxed) {
            let indexed = sqlx::query(
                "INSERT INTO search_docs_fts (doc_id, title, content) VALUES (?1, ?2, ?3)",
            )
            .bind(stored.id.to_string())
            .bind(&stored.title)
            .bind(&stored.content)
            .execute(&mut *tx)
            .await;

            if let Err(e) = indexed {
                warn!(doc_id = %stored.id, error = %e, "Failed to index document, substring search still covers it");
            }
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        debug!(doc_id = %stored.id, "Stored search document");
        Ok(stored)
    }

    /// Search documents. Never fails: internal errors yield an empty result.
    #[instrument(skip(self, query), fields(text = %query.text, category = ?query.category))]
    pub async fn search(&self, query: &SearchQuery) -> SearchHits {
        if query.limit == 0 || query.text.trim().is_empty() {
            return SearchHits {
                strategy: SearchStrategy::Substring,
                docs: Vec::new(),
            };
        }

        if self.full_text_enabled() {
            match self.search_ranked(query).await {
                Ok(docs) if !docs.is_empty() => {
                    return SearchHits {
                        strategy: SearchStrategy::Ranked,
                        docs,
                    };
                }
                Ok(_) => debug!("Ranked search found nothing, trying substring match"),
                Err(e) => warn!(error = %e, "Ranked search failed, trying substring match"),
            }
        }

        let docs = self.search_substring(query).await.unwrap_or_else(|e| {
            warn!(error = %e, "Substring search failed");
            Vec::new()
        });

        SearchHits {
            strategy: SearchStrategy::Substring,
            docs,
        }
    }

    /// FTS5 lookup ranked by bm25
    pub async fn search_ranked(&self, query: &SearchQuery) -> Result<Vec<SearchDoc>> {
        let Some(expression) = fts_match_expression(&query.text) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT d.id, d.category, d.title, d.content, d.metadata, d.created_at
            FROM search_docs_fts
            JOIN search_docs d ON d.id = search_docs_fts.doc_id
            WHERE search_docs_fts MATCH ?1
              AND (?2 IS NULL OR d.category = ?2)
            ORDER BY bm25(search_docs_fts)
            LIMIT ?3
            "#,
        )
        .bind(expression)
        .bind(query.category.as_deref())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_search_doc).collect()
    }

    /// LIKE containment over title and content, insertion order
    pub async fn search_substring(&self, query: &SearchQuery) -> Result<Vec<SearchDoc>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category, title, content, metadata, created_at
            FROM search_docs
            WHERE (title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category = ?2)
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?3
            "#,
        )
        .bind(like_pattern(query.text.trim()))
        .bind(query.category.as_deref())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_search_doc).collect()
    }
}
