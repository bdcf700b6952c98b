//! Deterministic embedder for tests and offline development.

use crate::embedder::{l2_normalize, Embedder};
use crate::error::Result;

/// Number of buckets: one per lowercase-letter bigram.
const DIMENSION: usize = 26 * 26;

/// Bag-of-tokens embedder that buckets each token by its first two
/// letters. Crude, but fully deterministic, dependency-free, and fast —
/// texts sharing tokens score higher than texts sharing none, which is
/// all the retrieval tests need.
#[derive(Debug, Clone, Default)]
pub struct TokenEmbedder;

impl TokenEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn encode(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut vector = vec![0.0f32; DIMENSION];
        for token in lowered.split(|c: char| !c.is_ascii_alphabetic()).filter(|t| !t.is_empty()) {
            vector[bucket(token)] += 1.0;
        }
        l2_normalize(vector)
    }
}

fn bucket(token: &str) -> usize {
    let mut letters = token.chars().filter(|c| c.is_ascii_lowercase());
    let first = letters.next().map_or(0, |c| c as usize - 'a' as usize);
    let second = letters.next().map_or(0, |c| c as usize - 'a' as usize);
    first * 26 + second
}

impl Embedder for TokenEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::encode(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::encode(text))
    }

    fn dimension(&self) -> Result<usize> {
        Ok(DIMENSION)
    }

    fn model_name(&self) -> Result<String> {
        Ok("token-bigram".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_normalized_and_deterministic() {
        let a = TokenEmbedder::encode("machine learning");
        let b = TokenEmbedder::encode("machine learning");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        let a = TokenEmbedder::encode("machine learning neural networks");
        let b = TokenEmbedder::encode("I like pizza");
        let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert_eq!(dot, 0.0);
    }
}
