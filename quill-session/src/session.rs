//! A single conversation session.

use chrono::{DateTime, Utc};
use quill_model::{Message, Role};
use quill_rag::Retriever;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// System prompt used when the user has not set one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// One stored conversation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Reasoning text that accompanied an assistant reply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

/// Conversation statistics for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub total_characters: usize,
}

/// A chat session: its transcript, system prompt, and (optionally) the
/// retriever over an uploaded document.
///
/// The retriever is owned exclusively by this session, never shared, and
/// never serialized — retrieval state is in-memory only and dies with the
/// session.
#[derive(Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub messages: Vec<StoredMessage>,
    pub system_prompt: String,
    pub created_at: DateTime<Utc>,
    /// Name of the currently attached document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(skip)]
    pub retriever: Option<Box<dyn Retriever>>,
}

impl Session {
    /// Fresh empty session.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            messages: Vec::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            created_at: Utc::now(),
            document_name: None,
            retriever: None,
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(StoredMessage {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            thinking: None,
        });
        debug!(session = %self.id, "added user message");
    }

    /// Append an assistant message, optionally with its reasoning text.
    pub fn push_assistant(&mut self, content: impl Into<String>, thinking: Option<String>) {
        self.messages.push(StoredMessage {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            thinking: thinking.filter(|t| !t.is_empty()),
        });
        debug!(session = %self.id, "added assistant message");
    }

    /// The transcript as wire messages: role and content only, empty
    /// entries skipped.
    pub fn api_messages(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .map(|m| Message { role: m.role, content: m.content.clone(), reasoning_details: None })
            .collect()
    }

    /// Last message, if any.
    pub fn last_message(&self) -> Option<&StoredMessage> {
        self.messages.last()
    }

    /// Drop the transcript, keeping the system prompt and any attached
    /// document.
    pub fn clear_history(&mut self) {
        self.messages.clear();
        debug!(session = %self.id, "cleared conversation history");
    }

    /// Message and character counts.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_messages: self.messages.len(),
            user_messages: self.messages.iter().filter(|m| m.role == Role::User).count(),
            assistant_messages: self.messages.iter().filter(|m| m.role == Role::Assistant).count(),
            total_characters: self.messages.iter().map(|m| m.content.len()).sum(),
        }
    }

    /// True when a document is attached and retrievable.
    pub fn has_document(&self) -> bool {
        self.retriever.is_some()
    }

    /// Detach the uploaded document: clear the index, drop the retriever.
    pub fn detach_retriever(&mut self) {
        if let Some(retriever) = self.retriever.as_mut() {
            retriever.clear();
        }
        self.retriever = None;
        self.document_name = None;
        debug!(session = %self.id, "detached document retriever");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("messages", &self.messages.len())
            .field("document_name", &self.document_name)
            .field("has_retriever", &self.retriever.is_some())
            .finish()
    }
}
