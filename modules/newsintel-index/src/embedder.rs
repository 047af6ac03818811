//! The embedding collaborator boundary (C4's injected dependency) and a
//! deterministic offline implementation so the index is runnable without
//! a network call.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// A pure, deterministic, batchable text-to-vector function. The
/// concrete provider (OpenAI, a local model, ...) is a collaborator
/// supplied at the composition root; C4 and C6 never depend on a
/// specific provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// A deterministic hash-projection embedder: each output dimension is a
/// signed bucket of a rolling hash over the token stream. Not
/// semantically meaningful, but stable, dependency-free, and useful for
/// tests and offline runs; a real provider is swapped in without
/// touching C4/C6.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            let digest = hasher.finalize();
            for (i, chunk) in digest.chunks(4).enumerate() {
                if chunk.len() < 4 {
                    continue;
                }
                let bucket = i % self.dim;
                let magnitude = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                let sign = if magnitude % 2 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign * ((magnitude % 1000) as f32 / 1000.0);
            }
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_one(text).await?);
        }
        Ok(out)
    }
}

/// Returns empty vectors for every input; used when no embedder is
/// configured and dense retrieval should degrade to "no results"
/// without failing the commit.
pub struct NoOpEmbedder {
    dim: usize,
}

impl NoOpEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for NoOpEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_one(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![0.0; self.dim])
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; self.dim]).collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(16);
        let a = embedder.embed_one("quarterly earnings beat").await.unwrap();
        let b = embedder.embed_one("quarterly earnings beat").await.unwrap();
        assert_eq!(a, b);
    }
}
