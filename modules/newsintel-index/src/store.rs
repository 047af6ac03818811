//! The combined dense+sparse store (C4+C5), committed together under a
//! single write-exclusive section so readers never observe one index
//! updated without the other (I3).

use std::sync::RwLock;

use newsintel_common::{Chunk, NewsIntelError, Result, ScoredChunk};

use crate::dense::{self, DenseState};
use crate::embedder::Embedder;
use crate::sparse::{self, SparseState};

struct IndexState {
    dense: DenseState,
    sparse: SparseState,
}

pub struct IndexStore {
    state: RwLock<IndexState>,
    embedder: Box<dyn Embedder>,
}

impl IndexStore {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            state: RwLock::new(IndexState {
                dense: DenseState::default(),
                sparse: SparseState::default(),
            }),
            embedder,
        }
    }

    /// Embeds the batch, then appends it to both indices inside one
    /// write-lock acquisition. The embedding call happens *before* the
    /// lock is taken so the critical section itself never suspends.
    pub async fn commit(&self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| NewsIntelError::Embedding(e.to_string()))?;

        if vectors.len() != chunks.len() {
            return Err(NewsIntelError::Embedding(
                "embedder returned a mismatched batch size".to_string(),
            ));
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| NewsIntelError::Index("index lock poisoned".to_string()))?;
        state.sparse.append(chunks.clone());
        state.dense.append(chunks, vectors);
        Ok(())
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_one(query)
            .await
            .map_err(|e| NewsIntelError::Embedding(e.to_string()))
    }

    pub fn search_dense(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let state = self.state.read().expect("index lock poisoned");
        dense::search(&state.dense, query_vector, k)
    }

    pub fn search_sparse(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let state = self.state.read().expect("index lock poisoned");
        sparse::search(&state.sparse, query, k)
    }

    pub fn size(&self) -> usize {
        let state = self.state.read().expect("index lock poisoned");
        debug_assert_eq!(state.dense.len(), state.sparse.len());
        state.dense.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use chrono::Utc;
    use newsintel_common::Article;

    fn make_chunk(text: &str, index: usize) -> Chunk {
        let now = Utc::now();
        let article = Article {
            id: format!("a{index}"),
            title: "t".into(),
            description: "d".into(),
            content: "c".into(),
            source_name: "s".into(),
            canonical_url: format!("https://x/{index}"),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        };
        Chunk::new(&article, 0, text.into(), vec![])
    }

    #[tokio::test]
    async fn commit_keeps_dense_and_sparse_in_lockstep() {
        let store = IndexStore::new(Box::new(HashEmbedder::new(16)));
        store
            .commit(vec![make_chunk("alpha beta", 0), make_chunk("gamma delta", 1)])
            .await
            .unwrap();
        assert_eq!(store.size(), 2);
    }

    #[tokio::test]
    async fn empty_commit_is_a_no_op() {
        let store = IndexStore::new(Box::new(HashEmbedder::new(16)));
        store.commit(vec![]).await.unwrap();
        assert_eq!(store.size(), 0);
    }
}
