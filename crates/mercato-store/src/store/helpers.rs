//! Helper functions for store module

use crate::error::Error;
use crate::types::{ChatMessage, ChatRole, SearchDoc, Session, TaskResult, TaskType};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Timestamps are stored as fixed-width RFC 3339 so text order equals time order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))
}

fn parse_uuid(value: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|e| Error::Serialization(format!("invalid uuid: {e}")))
}

fn parse_json(value: &str) -> Result<serde_json::Value, Error> {
    serde_json::from_str(value).map_err(|e| Error::Serialization(format!("invalid json: {e}")))
}

/// Convert a SQLite row to a Session
pub(crate) fn row_to_session(row: SqliteRow) -> Result<Session, Error> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");

    Ok(Session {
        id: parse_uuid(&id)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Convert a SQLite row to a ChatMessage
pub(crate) fn row_to_message(row: SqliteRow) -> Result<ChatMessage, Error> {
    let session_id: String = row.get("session_id");
    let role: String = row.get("role");
    let created_at: String = row.get("created_at");

    Ok(ChatMessage {
        id: row.get("id"),
        session_id: parse_uuid(&session_id)?,
        role: role.parse::<ChatRole>().map_err(Error::Serialization)?,
        content: row.get("content"),
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Convert a SQLite row to a TaskResult
pub(crate) fn row_to_task_result(row: SqliteRow) -> Result<TaskResult, Error> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let task_type: String = row.get("task_type");
    let result_data: String = row.get("result_data");
    let created_at: String = row.get("created_at");

    Ok(TaskResult {
        id: parse_uuid(&id)?,
        session_id: parse_uuid(&session_id)?,
        task_type: task_type.parse::<TaskType>().map_err(Error::Serialization)?,
        product_name: row.get("product_name"),
        result_data: parse_json(&result_data)?,
        pdf_path: row.get("pdf_path"),
        html_path: row.get("html_path"),
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Convert a SQLite row to a SearchDoc
pub(crate) fn row_to_search_doc(row: SqliteRow) -> Result<SearchDoc, Error> {
    let id: String = row.get("id");
    let metadata: String = row.get("metadata");
    let created_at: String = row.get("created_at");

    Ok(SearchDoc {
        id: parse_uuid(&id)?,
        category: row.get("category"),
        title: row.get("title"),
        content: row.get("content"),
        metadata: parse_json(&metadata)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Build an FTS5 match expression: each term becomes a quoted prefix query,
/// joined with OR so any overlapping term scores.
pub(crate) fn fts_match_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Escape LIKE wildcards so the query is matched literally
pub(crate) fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Get the default data directory
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".mercato"))
        .unwrap_or_else(|| std::path::PathBuf::from(".mercato"))
}

/// Get the default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join("mercato.db")
}
