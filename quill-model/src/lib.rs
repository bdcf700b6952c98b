//! # quill-model
//!
//! Client for the hosted chat-completions API: request/response types,
//! bearer-authenticated JSON transport with retry, and SSE streaming.
//!
//! The wire protocol is the endpoint's fixed contract (OpenAI-style chat
//! completions plus `chat_template_kwargs.thinking`); this crate
//! implements it, it does not redesign it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use quill_model::{ChatClient, ChatRequest, Message, DEFAULT_MODEL};
//!
//! let client = ChatClient::builder(std::env::var("NVIDIA_API_KEY")?).build()?;
//! let request = ChatRequest::new(DEFAULT_MODEL, vec![Message::user("hello")]);
//!
//! let mut stream = client.complete_stream(request).await?;
//! while let Some(chunk) = stream.next().await {
//!     if let Some(delta) = chunk?.delta_content() {
//!         print!("{delta}");
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{ChatClient, ChatClientBuilder, ChunkStream, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use types::{
    ChatRequest, ChatResponse, ChatTemplateKwargs, Choice, Delta, Message, Role, StreamChunk,
    Usage, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
