//! Assembles the outbound message list for the API.

use quill_model::Message;
use quill_session::Session;

/// Build the messages for one chat turn: optional system prompt first,
/// then the session transcript (role and content only), then the new
/// user message.
pub fn build_api_messages(session: &Session, system_prompt: &str, user_content: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(session.messages.len() + 2);
    if !system_prompt.trim().is_empty() {
        messages.push(Message::system(system_prompt));
    }
    messages.extend(session.api_messages());
    messages.push(Message::user(user_content));
    messages
}
