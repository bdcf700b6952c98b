//! Request and response types for the chat-completions API.
//!
//! The wire shape is the hosted endpoint's fixed contract: OpenAI-style
//! chat completions plus `chat_template_kwargs` for the model's thinking
//! mode. Streaming deltas carry `content` and `reasoning` fields.

use serde::{Deserialize, Serialize};

/// Hosted API base URL.
pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "moonshotai/kimi-k2.5";
/// Default generation budget.
pub const DEFAULT_MAX_TOKENS: u32 = 65536;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
/// Default nucleus sampling parameter.
pub const DEFAULT_TOP_P: f32 = 0.95;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// Reasoning payload attached to assistant messages by some models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<serde_json::Value>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), reasoning_details: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), reasoning_details: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), reasoning_details: None }
    }
}

/// Template switches forwarded to the model, currently just thinking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTemplateKwargs {
    pub thinking: bool,
}

impl Default for ChatTemplateKwargs {
    fn default() -> Self {
        Self { thinking: true }
    }
}

/// A chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
    pub chat_template_kwargs: ChatTemplateKwargs,
}

impl ChatRequest {
    /// Request with the default generation parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            stream: true,
            chat_template_kwargs: ChatTemplateKwargs::default(),
        }
    }
}

/// Token accounting reported by the server.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Incremental update inside a streaming choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// One completion choice, populated differently for full responses
/// (`message`) and streaming chunks (`delta`).
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A complete (non-streaming) chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Content of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.as_ref()).map(|m| m.content.as_str())
    }
}

/// One server-sent streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

impl StreamChunk {
    /// New content text in this chunk.
    pub fn delta_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.as_ref()).and_then(|d| d.content.as_deref())
    }

    /// New reasoning text in this chunk.
    pub fn delta_reasoning(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.as_ref()).and_then(|d| d.reasoning.as_deref())
    }

    /// True for the final chunk of a completion.
    pub fn is_done(&self) -> bool {
        self.choices.first().and_then(|c| c.finish_reason.as_deref()).is_some()
    }
}
