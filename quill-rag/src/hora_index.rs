//! Optimized retrieval backend on top of the hora inner-product index.
//!
//! This is the exact (brute-force) index, matching the fallback's
//! numerics: hora selects the candidates, and scores are recomputed as
//! inner products against the stored vectors so both backends agree to
//! float precision.

use std::sync::Arc;

use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::bruteforce_idx::BruteForceIndex;
use hora::index::bruteforce_params::BruteForceParams;
use tracing::debug;

use crate::embedder::Embedder;
use crate::error::{RagError, Result};
use crate::retriever::{check_dimension, dot, metadata_for, Document, Metadata, Retriever};

/// Retriever delegating nearest-neighbor selection to a hora
/// inner-product index.
///
/// The index is created lazily on the first non-empty add, sized to the
/// embedder's dimension at that moment. Document `i` is stored under
/// index id `i`.
pub struct HoraRetriever {
    embedder: Arc<dyn Embedder>,
    index: Option<BruteForceIndex<f32, usize>>,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

impl HoraRetriever {
    /// Empty retriever over the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, index: None, documents: Vec::new(), vectors: Vec::new() }
    }

    fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}

impl Retriever for HoraRetriever {
    fn add_documents(&mut self, texts: &[String], metadata: Option<Vec<Metadata>>) -> Result<()> {
        if texts.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_documents(texts)?;

        let dimension = self.dimension().unwrap_or_else(|| embeddings[0].len());
        for vector in &embeddings {
            check_dimension(dimension, vector.len())?;
        }

        let index = self
            .index
            .get_or_insert_with(|| BruteForceIndex::new(dimension, &BruteForceParams::default()));

        for (offset, vector) in embeddings.iter().enumerate() {
            let id = self.documents.len() + offset;
            index.add(vector, id).map_err(|e| RagError::Index(e.to_string()))?;
        }
        index.build(Metric::DotProduct).map_err(|e| RagError::Index(e.to_string()))?;

        for (i, text) in texts.iter().enumerate() {
            self.documents.push(Document::with_metadata(text.clone(), metadata_for(i, &metadata)));
        }
        self.vectors.extend(embeddings);

        debug!(added = texts.len(), total = self.documents.len(), "documents added to hora index");
        Ok(())
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>> {
        let Some(index) = self.index.as_ref() else {
            return Ok(Vec::new());
        };
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_query(query)?;
        if let Some(dimension) = self.dimension() {
            check_dimension(dimension, query_vec.len())?;
        }

        let ids = index.search(&query_vec, k.min(self.documents.len()));

        // hora reports metric distances, not inner products; recompute the
        // scores so both backends agree to float precision.
        let mut scored: Vec<(usize, f32)> = ids
            .into_iter()
            .filter(|&id| id < self.documents.len())
            .map(|id| (id, dot(&self.vectors[id], &query_vec)))
            .collect();
        scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
            b_score.partial_cmp(a_score).unwrap_or(std::cmp::Ordering::Equal).then(a_id.cmp(b_id))
        });

        Ok(scored.into_iter().map(|(id, score)| (self.documents[id].clone(), score)).collect())
    }

    fn clear(&mut self) {
        self.index = None;
        self.documents.clear();
        self.vectors.clear();
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
