//! Mercato Store - session, result and search-document persistence
//!
//! This crate owns the relational store behind the chat service:
//! - Sessions and their ordered chat messages
//! - Task results produced by the marketing agents
//! - Search documents with a ranked full-text index and a substring fallback
//!
//! Storage is SQLite through sqlx; no external database server is needed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{default_data_dir, default_db_path, Store};
pub use types::{
    ChatMessage, ChatRole, NewSearchDoc, NewTaskResult, SearchDoc, SearchHits, SearchQuery,
    SearchStrategy, Session, TaskResult, TaskType, DEFAULT_SEARCH_LIMIT,
};
