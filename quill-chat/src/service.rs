//! The chat service: one streaming or blocking turn at a time, with
//! conversation state and retrieval augmentation.

use std::sync::Arc;

use futures::StreamExt;
use quill_model::{ApiError, ChatClient, ChatRequest, ChatTemplateKwargs};
use quill_rag::{DocumentPipeline, Embedder, RagError, TextChunker};
use quill_session::{SessionManager, SessionStats};
use thiserror::Error;
use tracing::{error, info};

use crate::formatter::build_api_messages;
use crate::rag::{attach_document, augment_system_prompt, DEFAULT_TOP_K};

/// Errors surfaced by chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Rag(#[from] RagError),
}

/// Sampling and budget parameters for a turn.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub thinking: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: quill_model::DEFAULT_MODEL.to_string(),
            max_tokens: quill_model::DEFAULT_MAX_TOKENS,
            temperature: quill_model::DEFAULT_TEMPERATURE,
            top_p: quill_model::DEFAULT_TOP_P,
            thinking: true,
        }
    }
}

/// Incremental output from a streaming turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// New reasoning text.
    Thinking(String),
    /// New answer text.
    Content(String),
}

/// Final accumulated output of a streaming turn.
#[derive(Debug, Clone, Default)]
pub struct StreamedReply {
    pub content: String,
    pub thinking: String,
}

/// Chat operations over one [`ChatClient`] and a set of sessions.
pub struct ChatService {
    client: ChatClient,
    pub sessions: SessionManager,
    options: GenerationOptions,
    pipeline: DocumentPipeline,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl ChatService {
    /// Service with the given client, generation options, chunking
    /// parameters, and embedder.
    pub fn new(
        client: ChatClient,
        options: GenerationOptions,
        chunk_size: usize,
        chunk_overlap: usize,
        top_k: usize,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, ChatError> {
        let pipeline = DocumentPipeline::new(TextChunker::new(chunk_size, chunk_overlap)?);
        info!(model = options.model.as_str(), "chat service initialized");
        Ok(Self {
            client,
            sessions: SessionManager::new(),
            options,
            pipeline,
            embedder,
            top_k: if top_k == 0 { DEFAULT_TOP_K } else { top_k },
        })
    }

    /// Current generation options.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Replace the generation options.
    pub fn set_options(&mut self, options: GenerationOptions) {
        self.options = options;
    }

    fn request_for(&self, content: &str, stream: bool) -> ChatRequest {
        let session = self.sessions.current();
        let system_prompt =
            augment_system_prompt(&session.system_prompt, session, content, self.top_k);
        let messages = build_api_messages(session, &system_prompt, content);

        ChatRequest {
            model: self.options.model.clone(),
            messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            top_p: self.options.top_p,
            stream,
            chat_template_kwargs: ChatTemplateKwargs { thinking: self.options.thinking },
        }
    }

    /// Run one streaming turn in the current session.
    ///
    /// `on_event` receives each delta as it arrives. On success the
    /// assistant reply (with any reasoning) is persisted to the session;
    /// on failure an error marker message is persisted and the error is
    /// returned.
    pub async fn stream_turn<F>(
        &mut self,
        content: &str,
        mut on_event: F,
    ) -> Result<StreamedReply, ChatError>
    where
        F: FnMut(StreamEvent),
    {
        let request = self.request_for(content, true);
        self.sessions.current_mut().push_user(content);

        let mut stream = match self.client.complete_stream(request).await {
            Ok(stream) => stream,
            Err(api_error) => {
                self.record_failure(&api_error);
                return Err(api_error.into());
            }
        };

        let mut reply = StreamedReply::default();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(delta) = chunk.delta_reasoning() {
                        reply.thinking.push_str(delta);
                        on_event(StreamEvent::Thinking(delta.to_string()));
                    }
                    if let Some(delta) = chunk.delta_content() {
                        reply.content.push_str(delta);
                        on_event(StreamEvent::Content(delta.to_string()));
                    }
                }
                Err(api_error) => {
                    self.record_failure(&api_error);
                    return Err(api_error.into());
                }
            }
        }

        let thinking = (!reply.thinking.is_empty()).then(|| reply.thinking.clone());
        self.sessions.current_mut().push_assistant(&reply.content, thinking);
        Ok(reply)
    }

    /// Run one blocking (non-streaming) turn in the current session.
    pub async fn send_turn(&mut self, content: &str) -> Result<String, ChatError> {
        let request = self.request_for(content, false);
        self.sessions.current_mut().push_user(content);

        match self.client.complete(request).await {
            Ok(response) => {
                let reply = response.content().unwrap_or_default().to_string();
                self.sessions.current_mut().push_assistant(&reply, None);
                Ok(reply)
            }
            Err(api_error) => {
                self.record_failure(&api_error);
                Err(api_error.into())
            }
        }
    }

    fn record_failure(&mut self, api_error: &ApiError) {
        error!(error = %api_error, "chat turn failed");
        self.sessions.current_mut().push_assistant(format!("Error: {api_error}"), None);
    }

    /// Ingest an uploaded document into the current session.
    pub fn attach_document(&mut self, bytes: &[u8], filename: &str) -> Result<usize, ChatError> {
        let embedder = Arc::clone(&self.embedder);
        let session = self.sessions.current_mut();
        Ok(attach_document(session, &self.pipeline, embedder, bytes, filename)?)
    }

    /// Remove the current session's document and its index.
    pub fn detach_document(&mut self) {
        self.sessions.current_mut().detach_retriever();
    }

    /// Replace the current session's system prompt.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.sessions.current_mut().system_prompt = prompt.into();
    }

    /// Clear the current session's transcript.
    pub fn clear_conversation(&mut self) {
        self.sessions.current_mut().clear_history();
        info!("conversation cleared");
    }

    /// Statistics for the current session.
    pub fn stats(&self) -> SessionStats {
        self.sessions.current().stats()
    }
}
