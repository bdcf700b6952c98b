//! # quill-session
//!
//! Multi-session conversation state: transcripts with timestamps and
//! reasoning traces, per-session system prompts, per-session document
//! retrievers, and a manager for creating, switching, renaming,
//! deleting, duplicating, and exporting sessions.
//!
//! State is in-memory only. Sessions serialize to JSON for explicit
//! export/import; the retriever attachment never serializes and is
//! discarded with the session.

pub mod manager;
pub mod session;

pub use manager::{SessionError, SessionManager};
pub use session::{Session, SessionStats, StoredMessage, DEFAULT_SYSTEM_PROMPT};
