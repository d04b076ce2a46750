//! Sessions and chat messages

use super::helpers::{format_timestamp, row_to_message, row_to_session};
use super::Store;
use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatRole, Session};
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

impl Store {
    // =========================================================================
    // Session operations
    // =========================================================================

    /// Create a new session
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO sessions (id, created_at) VALUES (?1, ?2)")
            .bind(session.id.to_string())
            .bind(format_timestamp(session.created_at))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        debug!(session_id = %session.id, "Created session");
        Ok(session)
    }

    /// Look up a session
    #[instrument(skip(self))]
    pub async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT id, created_at FROM sessions WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(row_to_session).transpose()
    }

    /// Delete a session together with its messages and task results.
    ///
    /// Returns `false` when the session did not exist.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, id: Uuid) -> Result<bool> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query("DELETE FROM messages WHERE session_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query("DELETE FROM task_results WHERE session_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if removed > 0 {
            info!(session_id = %id, "Deleted session");
        }
        Ok(removed > 0)
    }

    // =========================================================================
    // Message operations
    // =========================================================================

    /// Append a message to a session
    #[instrument(skip(self, content), fields(role = role.as_str()))]
    pub async fn append_message(
        &self,
        session_id: Uuid,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id.to_string())
        .bind(role.as_str())
        .bind(content)
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            session_id,
            role,
            content: content.to_string(),
            created_at,
        })
    }

    /// The last `limit` messages of a session, oldest first
    #[instrument(skip(self))]
    pub async fn recent_messages(&self, session_id: Uuid, limit: usize) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, created_at FROM (
                SELECT id, session_id, role, content, created_at
                FROM messages
                WHERE session_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
            )
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(session_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// All messages of a session, oldest first
    #[instrument(skip(self))]
    pub async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_message).collect()
    }
}
