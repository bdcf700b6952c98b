//! Plain in-memory retrieval fallback.
//!
//! Keeps every embedding in a single matrix and scores queries by direct
//! dot product against each stored vector. Used when the crate is built
//! without the optimized index; behavior is identical either way.

use std::sync::Arc;

use tracing::debug;

use crate::embedder::Embedder;
use crate::error::Result;
use crate::retriever::{check_dimension, dot, metadata_for, top_k_indices, Document, Metadata, Retriever};

/// Brute-force cosine-similarity retriever.
///
/// Position `i` in the document list always corresponds to row `i` of the
/// embedding matrix.
pub struct FlatRetriever {
    embedder: Arc<dyn Embedder>,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
    dimension: Option<usize>,
}

impl FlatRetriever {
    /// Empty retriever over the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, documents: Vec::new(), vectors: Vec::new(), dimension: None }
    }
}

impl Retriever for FlatRetriever {
    fn add_documents(&mut self, texts: &[String], metadata: Option<Vec<Metadata>>) -> Result<()> {
        if texts.is_empty() {
            return Ok(());
        }

        // Embedding is pure: it either yields the whole batch or fails
        // before any state below is touched.
        let embeddings = self.embedder.embed_documents(texts)?;

        let dimension = self.dimension.unwrap_or_else(|| embeddings[0].len());
        for vector in &embeddings {
            check_dimension(dimension, vector.len())?;
        }
        self.dimension = Some(dimension);

        for (i, text) in texts.iter().enumerate() {
            self.documents.push(Document::with_metadata(text.clone(), metadata_for(i, &metadata)));
        }
        self.vectors.extend(embeddings);

        debug!(added = texts.len(), total = self.documents.len(), "documents added to flat index");
        Ok(())
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>> {
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_query(query)?;
        if let Some(dimension) = self.dimension {
            check_dimension(dimension, query_vec.len())?;
        }

        // All vectors are unit length, so the inner product is the cosine
        // similarity.
        let scores: Vec<f32> = self.vectors.iter().map(|v| dot(v, &query_vec)).collect();

        Ok(top_k_indices(&scores, k)
            .into_iter()
            .map(|i| (self.documents[i].clone(), scores[i]))
            .collect())
    }

    fn clear(&mut self) {
        self.documents.clear();
        self.vectors.clear();
        self.dimension = None;
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
