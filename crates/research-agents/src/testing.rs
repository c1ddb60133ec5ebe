//! Scripted doubles for the gateway and the external collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use research_llm::{GatewayError, LLMGateway, Message};

use crate::collaborators::{CollaboratorError, MetadataLookup, PaperSearch, WorkMetadata};
use crate::literature::Paper;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub temperature: f32,
}

impl RecordedCall {
    pub fn system(&self) -> &str {
        self.messages.first().map(|m| m.content.as_str()).unwrap_or_default()
    }

    pub fn user(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }
}

/// Gateway that answers from a queue, in order, and records every call.
/// Once the queue is empty every call fails.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Reply::Fail(message.into()));
        self
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LLMGateway for ScriptedGateway {
    async fn complete(&self, messages: &[Message], temperature: f32) -> research_llm::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                temperature,
            });
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(body)) => Err(GatewayError::Api { status: 502, body }),
            None => Err(GatewayError::Api {
                status: 503,
                body: "no scripted reply left".to_string(),
            }),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Search collaborator that always returns the same records.
pub struct StaticSearch(pub Vec<Paper>);

#[async_trait]
impl PaperSearch for StaticSearch {
    async fn search(&self, _topic: &str, limit: usize) -> Result<Vec<Paper>, CollaboratorError> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }
}

/// Search collaborator that is never reachable.
pub struct UnreachableSearch;

#[async_trait]
impl PaperSearch for UnreachableSearch {
    async fn search(&self, _topic: &str, _limit: usize) -> Result<Vec<Paper>, CollaboratorError> {
        Err(CollaboratorError::Status {
            service: "paper search",
            status: 503,
        })
    }
}

/// Metadata collaborator that knows exactly one work.
pub struct StaticMetadata(pub WorkMetadata);

#[async_trait]
impl MetadataLookup for StaticMetadata {
    async fn lookup(&self, _doi: &str) -> Result<WorkMetadata, CollaboratorError> {
        Ok(self.0.clone())
    }
}

/// Metadata collaborator that finds nothing.
pub struct MissingMetadata;

#[async_trait]
impl MetadataLookup for MissingMetadata {
    async fn lookup(&self, doi: &str) -> Result<WorkMetadata, CollaboratorError> {
        Err(CollaboratorError::NotFound(doi.to_string()))
    }
}
