//! Mock LLM Provider for testing
//!
//! Replies are served from a queue; once the queue is empty the provider
//! answers with a fixed fallback text.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default reply when nothing is queued
pub const DEFAULT_MOCK_REPLY: &str = "mock response";

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Failure(String),
}

/// A mock LLM provider that returns queued responses or a default one.
#[derive(Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    fallback: Option<String>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: Some(DEFAULT_MOCK_REPLY.to_string()),
        }
    }

    /// A provider whose every unscripted call fails with an API error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fallback: None,
            ..Self::new()
        }
    }

    /// Add a text response to the queue.
    pub fn push_response(&self, content: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Text(content.into()));
    }

    /// Add a failing response to the queue.
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Failure(message.into()));
    }

    /// Number of completion calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match next {
            Some(Scripted::Text(text)) => text,
            Some(Scripted::Failure(message)) => return Err(Error::Api(message)),
            None => match &self.fallback {
                Some(text) => text.clone(),
                None => return Err(Error::Api("mock provider has no reply".to_string())),
            },
        };

        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: "mock-model".to_string(),
        })
    }
}
