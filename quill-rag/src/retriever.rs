//! The retrieval contract: stored documents, nearest-neighbor search, and
//! backend selection.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedder::Embedder;
use crate::error::{RagError, Result};

/// Open-ended per-document metadata (e.g. source filename).
pub type Metadata = HashMap<String, serde_json::Value>;

/// A stored retrieval unit: one chunk of text plus metadata.
///
/// Created by the index when chunks are added and immutable thereafter.
/// Owned exclusively by the index that created it; never shared across
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The chunk's text content.
    pub text: String,
    /// Key-value metadata. Always a fresh map per instance.
    pub metadata: Metadata,
}

impl Document {
    /// Document with empty metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: Metadata::new() }
    }

    /// Document with the given metadata.
    pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// Stores embedded chunks and answers nearest-neighbor similarity queries.
///
/// The two implementations — [`HoraRetriever`](crate::hora_index::HoraRetriever)
/// and [`FlatRetriever`](crate::flat::FlatRetriever) — are interchangeable:
/// identical signatures, identical return shapes, identical ordering and
/// tie-break behavior. Callers hold only `Box<dyn Retriever>` and never
/// branch on which variant is active.
pub trait Retriever: Send {
    /// Embed `texts` in one batch and append them to the index.
    ///
    /// Empty input is a no-op. `metadata` rows pair positionally with
    /// `texts`; missing or short metadata becomes fresh empty maps. The
    /// underlying index structure is created lazily on the first
    /// non-empty call, sized to the embedder's dimension; embeddings of
    /// a different length are rejected afterwards.
    fn add_documents(&mut self, texts: &[String], metadata: Option<Vec<Metadata>>) -> Result<()>;

    /// The `min(k, stored)` highest-scoring documents for `query`, as
    /// `(document, score)` pairs in strictly descending score order,
    /// ties broken by insertion order.
    ///
    /// Scores are inner products of unit vectors, i.e. cosine similarity.
    /// An empty or uninitialized index yields an empty list, never an
    /// error.
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>>;

    /// Drop every stored document and reset the index. Safe to call
    /// repeatedly and before any `add_documents`.
    fn clear(&mut self);

    /// Number of stored documents.
    fn len(&self) -> usize;

    /// True when nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pick the best available backend.
///
/// With the `hora-index` feature compiled in (the default) this returns
/// the hora-accelerated inner-product index; otherwise the plain
/// in-memory fallback. Both honor the same [`Retriever`] contract, so
/// the choice is invisible to callers.
pub fn create_retriever(embedder: Arc<dyn Embedder>) -> Box<dyn Retriever> {
    #[cfg(feature = "hora-index")]
    {
        Box::new(crate::hora_index::HoraRetriever::new(embedder))
    }
    #[cfg(not(feature = "hora-index"))]
    {
        Box::new(crate::flat::FlatRetriever::new(embedder))
    }
}

/// Metadata row for position `index`, or a fresh empty map.
pub(crate) fn metadata_for(index: usize, metadata: &Option<Vec<Metadata>>) -> Metadata {
    metadata.as_ref().and_then(|rows| rows.get(index).cloned()).unwrap_or_default()
}

/// Indices of the `k` highest scores, descending, ties broken by
/// ascending insertion index so results are deterministic.
pub(crate) fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });
    order.truncate(k.min(scores.len()));
    order
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Reject an embedding whose length no longer matches the index.
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RagError::Index(format!(
            "embedding dimension changed from {expected} to {actual} after the index was created"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_rows_pair_positionally_and_default_to_empty() {
        let rows = Some(vec![Metadata::from([(
            "source".to_string(),
            serde_json::Value::String("a.txt".to_string()),
        )])]);
        assert_eq!(metadata_for(0, &rows).len(), 1);
        assert!(metadata_for(1, &rows).is_empty());
        assert!(metadata_for(0, &None).is_empty());
    }

    #[test]
    fn each_document_gets_its_own_metadata_map() {
        let mut a = Document::new("a");
        let b = Document::new("b");
        a.metadata.insert("k".to_string(), serde_json::Value::Bool(true));
        assert!(b.metadata.is_empty());
    }

    #[test]
    fn top_k_sorts_descending_and_clamps() {
        let scores = [0.1, 0.9, 0.5, 0.9];
        assert_eq!(top_k_indices(&scores, 10), vec![1, 3, 2, 0]);
        assert_eq!(top_k_indices(&scores, 2), vec![1, 3]);
        assert_eq!(top_k_indices(&[], 3), Vec::<usize>::new());
    }

    #[test]
    fn top_k_ties_break_by_insertion_order() {
        let scores = [0.5, 0.5, 0.5];
        assert_eq!(top_k_indices(&scores, 3), vec![0, 1, 2]);
    }
}
