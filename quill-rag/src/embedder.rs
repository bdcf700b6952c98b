//! Local text embeddings with lazy loading and model fallback.
//!
//! The primary model is higher quality and task-aware (queries are
//! encoded with a retrieval instruction); the fallback is smaller and
//! widely compatible. Whichever loads first is reused for the lifetime
//! of the [`ModelProvider`].

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{info, warn};

use crate::error::{RagError, Result};

/// BGE encodes queries with a retrieval instruction; documents are plain.
const BGE_QUERY_PREFIX: &str = "Represent this sentence for searching relevant passages: ";

/// Produces fixed-length vectors for queries and documents.
///
/// Query and document encodings from one implementation live in the same
/// vector space and are L2-normalized, so cosine similarity downstream is
/// a plain dot product. All vectors from one instance have length
/// [`dimension`](Embedder::dimension).
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts, one vector per input, in order.
    ///
    /// An empty input returns an empty matrix, not an error.
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector length. Resolves the model if it has not loaded yet.
    fn dimension(&self) -> Result<usize>;

    /// Identifier of the active model. Resolves the model if needed.
    fn model_name(&self) -> Result<String>;
}

/// Static description of an embedding model choice.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Which fastembed model to load.
    pub model: EmbeddingModel,
    /// Canonical model identifier.
    pub name: &'static str,
    /// Embedding dimensionality, fixed at model-load time.
    pub dimension: usize,
    /// Instruction prepended to queries, for models that distinguish
    /// search queries from search documents.
    pub query_prefix: Option<&'static str>,
}

/// Higher-quality primary model with task-aware query encoding.
pub fn primary_model() -> ModelSpec {
    ModelSpec {
        model: EmbeddingModel::BGEBaseENV15,
        name: "BAAI/bge-base-en-v1.5",
        dimension: 768,
        query_prefix: Some(BGE_QUERY_PREFIX),
    }
}

/// Lightweight fallback; encodes queries and documents identically.
pub fn fallback_model() -> ModelSpec {
    ModelSpec {
        model: EmbeddingModel::AllMiniLML6V2,
        name: "sentence-transformers/all-MiniLM-L6-v2",
        dimension: 384,
        query_prefix: None,
    }
}

/// A successfully loaded embedding model.
pub struct LoadedModel {
    model: TextEmbedding,
    name: String,
    dimension: usize,
    query_prefix: Option<&'static str>,
}

impl LoadedModel {
    /// Canonical identifier of the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vector length produced by this model.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embeddings =
            self.model.embed(texts, None).map_err(|e| RagError::Embedding(e.to_string()))?;
        Ok(embeddings.into_iter().map(l2_normalize).collect())
    }
}

/// Scale a vector to unit length. Zero vectors are left unchanged.
pub(crate) fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Process-wide lazy cache for the embedding model.
///
/// The model is not loaded until the first [`resolve`](ModelProvider::resolve)
/// call. Loading tries the primary model, then the fallback; the first
/// success is cached and reused for the provider's lifetime. A failed
/// attempt is not cached, so a later call may retry. Share one provider
/// across sessions with `Arc` — the loaded model is read-only and safe to
/// use as a pure function evaluator.
pub struct ModelProvider {
    primary: ModelSpec,
    fallback: ModelSpec,
    cache: Mutex<Option<Arc<LoadedModel>>>,
}

impl ModelProvider {
    /// Provider over the default primary/fallback pair.
    pub fn new() -> Self {
        Self::with_models(primary_model(), fallback_model())
    }

    /// Provider over an explicit model pair.
    pub fn with_models(primary: ModelSpec, fallback: ModelSpec) -> Self {
        Self { primary, fallback, cache: Mutex::new(None) }
    }

    /// Load-or-return-cached.
    ///
    /// # Errors
    ///
    /// [`RagError::ModelLoad`] when both the primary and the fallback
    /// model fail to load. This is a hard dependency failure: callers
    /// should disable retrieval for the session rather than retry per
    /// request.
    pub fn resolve(&self) -> Result<Arc<LoadedModel>> {
        let mut cache = self.cache.lock().expect("model cache lock poisoned");
        if let Some(model) = cache.as_ref() {
            return Ok(Arc::clone(model));
        }

        let loaded = match Self::load(&self.primary) {
            Ok(model) => model,
            Err(primary_err) => {
                warn!(
                    model = self.primary.name,
                    error = %primary_err,
                    "primary embedding model failed to load, trying fallback"
                );
                Self::load(&self.fallback).map_err(|fallback_err| {
                    RagError::ModelLoad(format!(
                        "primary ({}): {primary_err}; fallback ({}): {fallback_err}",
                        self.primary.name, self.fallback.name
                    ))
                })?
            }
        };

        info!(model = loaded.name.as_str(), dimension = loaded.dimension, "embedding model loaded");
        let loaded = Arc::new(loaded);
        *cache = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    fn load(spec: &ModelSpec) -> anyhow::Result<LoadedModel> {
        let options = InitOptions::new(spec.model.clone()).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)?;
        Ok(LoadedModel {
            model,
            name: spec.name.to_string(),
            dimension: spec.dimension,
            query_prefix: spec.query_prefix,
        })
    }
}

impl Default for ModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Embedder`] backed by a fastembed model resolved through a shared
/// [`ModelProvider`].
pub struct FastembedEmbedder {
    provider: Arc<ModelProvider>,
}

impl FastembedEmbedder {
    /// Wrap a (typically process-wide) provider.
    pub fn new(provider: Arc<ModelProvider>) -> Self {
        Self { provider }
    }
}

impl Embedder for FastembedEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.provider.resolve()?;
        if texts.is_empty() {
            // Zero rows, but the model is resolved so `dimension()` stays
            // consistent for callers sizing downstream structures.
            return Ok(Vec::new());
        }
        model.encode(texts.to_vec())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.provider.resolve()?;
        let input = match model.query_prefix {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        model
            .encode(vec![input])?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("model returned no vector for query".to_string()))
    }

    fn dimension(&self) -> Result<usize> {
        Ok(self.provider.resolve()?.dimension)
    }

    fn model_name(&self) -> Result<String> {
        Ok(self.provider.resolve()?.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let v = l2_normalize(vec![3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_untouched() {
        assert_eq!(l2_normalize(vec![0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    // The tests below exercise the real model stack and download weights
    // on first run.

    #[test]
    #[ignore = "downloads the embedding model"]
    fn loaded_model_dimension_is_consistent() {
        let embedder = FastembedEmbedder::new(Arc::new(ModelProvider::new()));
        let dimension = embedder.dimension().unwrap();

        let query = embedder.embed_query("what is machine learning?").unwrap();
        assert_eq!(query.len(), dimension);

        let docs = embedder
            .embed_documents(&["one".to_string(), "two".to_string(), "three".to_string()])
            .unwrap();
        assert_eq!(docs.len(), 3);
        for doc in &docs {
            assert_eq!(doc.len(), dimension);
        }
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn embeddings_are_unit_normalized() {
        let embedder = FastembedEmbedder::new(Arc::new(ModelProvider::new()));
        let vector = embedder.embed_query("normalization check").unwrap();
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-2);
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn empty_document_batch_returns_zero_rows() {
        let embedder = FastembedEmbedder::new(Arc::new(ModelProvider::new()));
        let docs = embedder.embed_documents(&[]).unwrap();
        assert!(docs.is_empty());
        // The model resolved anyway, so the dimension is queryable.
        assert!(embedder.dimension().unwrap() > 0);
    }
}
