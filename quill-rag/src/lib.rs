//! # quill-rag
//!
//! Per-session retrieval for quill: document text extraction, chunking,
//! local embeddings, and an in-memory vector index with two
//! interchangeable backends.
//!
//! ## Overview
//!
//! A chat session that has a document attached owns exactly one
//! [`Retriever`]. Uploading a file runs the [`DocumentPipeline`]
//! (extract → chunk → embed → index); each user turn then asks the
//! retriever for the top-k most similar chunks and folds them into the
//! outgoing prompt.
//!
//! The index backend is chosen once, at construction, by
//! [`create_retriever`]: the hora-accelerated inner-product index when
//! the crate is compiled with the `hora-index` feature (the default),
//! otherwise the plain in-memory [`FlatRetriever`]. Both backends expose
//! identical behavior; callers hold only `Box<dyn Retriever>`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quill_rag::{create_retriever, DocumentPipeline, FastembedEmbedder, ModelProvider};
//!
//! let provider = Arc::new(ModelProvider::new());
//! let embedder = Arc::new(FastembedEmbedder::new(provider));
//! let mut retriever = create_retriever(embedder);
//!
//! let pipeline = DocumentPipeline::with_defaults()?;
//! pipeline.ingest(retriever.as_mut(), &bytes, "notes.pdf")?;
//!
//! for (doc, score) in retriever.retrieve("what does the report conclude?", 3)? {
//!     println!("{score:.3}  {}", doc.text);
//! }
//! ```

pub mod chunker;
pub mod embedder;
pub mod error;
pub mod extract;
pub mod flat;
#[cfg(feature = "hora-index")]
pub mod hora_index;
pub mod pipeline;
pub mod retriever;
pub mod testing;

pub use chunker::TextChunker;
pub use embedder::{Embedder, FastembedEmbedder, ModelProvider};
pub use error::{RagError, Result};
pub use extract::extract_text;
pub use flat::FlatRetriever;
#[cfg(feature = "hora-index")]
pub use hora_index::HoraRetriever;
pub use pipeline::DocumentPipeline;
pub use retriever::{create_retriever, Document, Metadata, Retriever};
