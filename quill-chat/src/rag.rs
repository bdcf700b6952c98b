//! Retrieval orchestration at the chat boundary.
//!
//! Retrieval failures are contained here: a broken or empty index means
//! the turn proceeds with the unaugmented prompt, never an aborted
//! message.

use std::sync::Arc;

use quill_rag::{create_retriever, DocumentPipeline, Embedder, RagError};
use quill_session::Session;
use tracing::{debug, warn};

/// Retrieved chunks injected per turn unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

const CONTEXT_INSTRUCTION: &str =
    "Use the following context from the uploaded document to answer the question.";
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Ask the session's retriever for context relevant to `query` and fold
/// it into the system prompt.
///
/// Returns the base prompt unchanged when the session has no retriever,
/// when nothing is retrieved, or when retrieval fails (the failure is
/// logged and swallowed).
pub fn augment_system_prompt(base: &str, session: &Session, query: &str, top_k: usize) -> String {
    let Some(retriever) = session.retriever.as_ref() else {
        return base.to_string();
    };

    match retriever.retrieve(query, top_k) {
        Ok(results) if !results.is_empty() => {
            let context: Vec<&str> = results.iter().map(|(doc, _)| doc.text.as_str()).collect();
            debug!(chunks = context.len(), "augmenting system prompt with retrieved context");
            format!("{base}\n\n{CONTEXT_INSTRUCTION}\n\n{}", context.join(CONTEXT_SEPARATOR))
        }
        Ok(_) => base.to_string(),
        Err(error) => {
            warn!(%error, "retrieval failed; continuing without document context");
            base.to_string()
        }
    }
}

/// Ingest an uploaded file into the session, creating its retriever on
/// first use.
///
/// Returns the number of chunks indexed.
pub fn attach_document(
    session: &mut Session,
    pipeline: &DocumentPipeline,
    embedder: Arc<dyn Embedder>,
    bytes: &[u8],
    filename: &str,
) -> Result<usize, RagError> {
    let retriever = session.retriever.get_or_insert_with(|| create_retriever(embedder));
    let count = pipeline.ingest(retriever.as_mut(), bytes, filename)?;
    session.document_name = Some(filename.to_string());
    Ok(count)
}
