//! Task result persistence

use super::helpers::{format_timestamp, row_to_task_result};
use super::Store;
use crate::error::{Error, Result};
use crate::types::{NewTaskResult, TaskResult, TaskType};
use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

const TASK_RESULT_COLUMNS: &str =
    "id, session_id, task_type, product_name, result_data, pdf_path, html_path, created_at";

impl Store {
    /// Store an agent result
    #[instrument(skip(self, result), fields(task_type = %result.task_type, session_id = %result.session_id))]
    pub async fn save_task_result(&self, result: NewTaskResult) -> Result<TaskResult> {
        let created_at = Utc::now();
        let payload = serde_json::to_string(&result.result_data)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO task_results (
                id, session_id, task_type, product_name, result_data,
                pdf_path, html_path, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(result.id.to_string())
        .bind(result.session_id.to_string())
        .bind(result.task_type.as_str())
        .bind(&result.product_name)
        .bind(&payload)
        .bind(&result.pdf_path)
        .bind(&result.html_path)
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        debug!(result_id = %result.id, "Saved task result");

        Ok(TaskResult {
            id: result.id,
            session_id: result.session_id,
            task_type: result.task_type,
            product_name: result.product_name,
            result_data: result.result_data,
            pdf_path: result.pdf_path,
            html_path: result.html_path,
            created_at,
        })
    }

    /// Fetch one task result
    #[instrument(skip(self))]
    pub async fn get_task_result(&self, id: Uuid) -> Result<TaskResult> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_RESULT_COLUMNS} FROM task_results WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?
        .ok_or_else(|| Error::TaskResultNotFound(id.to_string()))?;

        row_to_task_result(row)
    }

    /// All task results of a session, oldest first
    #[instrument(skip(self))]
    pub async fn list_task_results(&self, session_id: Uuid) -> Result<Vec<TaskResult>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_RESULT_COLUMNS} FROM task_results \
             WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_task_result).collect()
    }

    /// Most recent task result of a session, optionally of one type
    #[instrument(skip(self))]
    pub async fn latest_task_result(
        &self,
        session_id: Uuid,
        task_type: Option<TaskType>,
    ) -> Result<Option<TaskResult>> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_RESULT_COLUMNS} FROM task_results \
             WHERE session_id = ?1 AND (?2 IS NULL OR task_type = ?2) \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(session_id.to_string())
        .bind(task_type.map(|t| t.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        row.map(row_to_task_result).transpose()
    }
}
