//! Document ingestion: extract → chunk → index.

use tracing::info;

use crate::chunker::TextChunker;
use crate::error::Result;
use crate::extract::extract_text;
use crate::retriever::{Metadata, Retriever};

/// Turns an uploaded file into indexed chunks.
///
/// Each stored chunk carries `source` (the filename) and `chunk_index`
/// metadata.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    chunker: TextChunker,
}

impl DocumentPipeline {
    /// Pipeline over an explicit chunker.
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Pipeline with the default chunking parameters (512 characters,
    /// 50 overlap).
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(TextChunker::new(512, 50)?))
    }

    /// Extract, chunk, and add `bytes` to `retriever`.
    ///
    /// Returns the number of chunks stored.
    ///
    /// # Errors
    ///
    /// Extraction errors propagate unchanged (see
    /// [`extract_text`]); embedding and index failures surface from
    /// [`Retriever::add_documents`].
    pub fn ingest(
        &self,
        retriever: &mut dyn Retriever,
        bytes: &[u8],
        filename: &str,
    ) -> Result<usize> {
        let text = extract_text(bytes, filename)?;
        let chunks = self.chunker.chunk(&text);

        let metadata: Vec<Metadata> = (0..chunks.len())
            .map(|i| {
                let mut row = Metadata::new();
                row.insert("source".to_string(), serde_json::Value::String(filename.to_string()));
                row.insert("chunk_index".to_string(), serde_json::Value::from(i));
                row
            })
            .collect();

        retriever.add_documents(&chunks, Some(metadata))?;

        info!(source = filename, chunk_count = chunks.len(), "document ingested");
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flat::FlatRetriever;
    use crate::testing::TokenEmbedder;

    #[test]
    fn ingest_stores_chunks_with_source_metadata() {
        let mut retriever = FlatRetriever::new(Arc::new(TokenEmbedder::new()));
        let pipeline = DocumentPipeline::new(TextChunker::new(32, 8).unwrap());

        let count = pipeline
            .ingest(&mut retriever, b"alpha beta gamma delta epsilon zeta eta theta", "greek.txt")
            .unwrap();

        assert!(count >= 2);
        assert_eq!(retriever.len(), count);

        let results = retriever.retrieve("alpha beta", 1).unwrap();
        let (doc, _) = &results[0];
        assert_eq!(doc.metadata["source"], serde_json::Value::String("greek.txt".to_string()));
        assert!(doc.metadata.contains_key("chunk_index"));
    }

    #[test]
    fn ingest_rejects_unsupported_files_before_touching_the_index() {
        let mut retriever = FlatRetriever::new(Arc::new(TokenEmbedder::new()));
        let pipeline = DocumentPipeline::with_defaults().unwrap();

        let err = pipeline.ingest(&mut retriever, b"bytes", "archive.zip").unwrap_err();
        assert!(err.is_document_error());
        assert!(retriever.is_empty());
    }
}
