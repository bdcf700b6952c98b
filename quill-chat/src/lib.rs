//! # quill-chat
//!
//! The chat service layer: formats conversation turns for the hosted
//! model API, streams replies into session state, and orchestrates
//! retrieval augmentation for sessions with an uploaded document.
//!
//! Retrieval is strictly best-effort at this layer — an empty or failing
//! index downgrades the turn to plain chat instead of failing it.

pub mod formatter;
pub mod rag;
pub mod service;

pub use formatter::build_api_messages;
pub use rag::{attach_document, augment_system_prompt, DEFAULT_TOP_K};
pub use service::{ChatError, ChatService, GenerationOptions, StreamEvent, StreamedReply};
