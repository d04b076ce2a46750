//! Mercato LLM - LLM Provider Abstraction
//!
//! This crate provides the language-model seam used by every marketing agent:
//! - Provider: the `LlmProvider` trait and request/response types
//! - OpenAI: chat-completions provider (also works with OpenAI-compatible gateways)
//! - Mock: scripted provider for tests and offline runs
//! - Util: key masking, error sanitizing, JSON extraction from model output

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
