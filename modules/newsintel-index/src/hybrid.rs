//! The hybrid retriever (C6): reciprocal rank fusion over dense + sparse
//! candidate lists, with an optional cross-encoder rerank pass.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use newsintel_common::ScoredChunk;

use crate::store::IndexStore;

pub const DEFAULT_RRF_K: u32 = 60;

/// A cross-encoder (or any pairwise scorer) over `(query, candidate)`
/// pairs. Optional: when absent, the retriever returns the fused
/// ranking unchanged.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rank(&self, query: &str, texts: &[String]) -> anyhow::Result<Vec<f64>>;
}

pub struct HybridRetriever {
    store: Arc<IndexStore>,
    reranker: Option<Box<dyn Reranker>>,
    rrf_k: u32,
}

impl HybridRetriever {
    pub fn new(store: Arc<IndexStore>, reranker: Option<Box<dyn Reranker>>, rrf_k: u32) -> Self {
        Self {
            store,
            reranker,
            rrf_k,
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Clones the shared handle so a caller (the ingest coordinator) can
    /// commit to the same store the retriever reads from.
    pub fn store_handle(&self) -> Arc<IndexStore> {
        Arc::clone(&self.store)
    }

    /// Fetches `2k` from each sub-index, fuses by RRF, and optionally
    /// reranks the fused top `2k` with a cross-encoder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let fetch_n = k.saturating_mul(2).max(1);

        let query_vector = match self.store.embed_query(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed, falling back to sparse-only");
                Vec::new()
            }
        };

        let dense = if query_vector.is_empty() {
            Vec::new()
        } else {
            self.store.search_dense(&query_vector, fetch_n)
        };
        let sparse = self.store.search_sparse(query, fetch_n);

        let fused = reciprocal_rank_fusion(&[dense, sparse], self.rrf_k);

        let candidates: Vec<ScoredChunk> = fused.into_iter().take(fetch_n).collect();

        match &self.reranker {
            Some(reranker) => self.rerank(query, candidates, k, reranker.as_ref()).await,
            None => candidates.into_iter().take(k).collect(),
        }
    }

    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredChunk>,
        k: usize,
        reranker: &dyn Reranker,
    ) -> Vec<ScoredChunk> {
        let texts: Vec<String> = candidates.iter().map(|c| c.chunk.text.clone()).collect();
        match reranker.rank(query, &texts).await {
            Ok(scores) if scores.len() == candidates.len() => {
                let mut reranked: Vec<ScoredChunk> = candidates
                    .into_iter()
                    .zip(scores)
                    .map(|(sc, score)| ScoredChunk { chunk: sc.chunk, score })
                    .collect();
                reranked.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                reranked.truncate(k);
                reranked
            }
            Ok(_) => {
                tracing::warn!("reranker returned a mismatched score count, skipping rerank");
                candidates.into_iter().take(k).collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "rerank failed, returning fused order");
                candidates.into_iter().take(k).collect()
            }
        }
    }
}

/// Combines any number of ranked lists into one, scoring each chunk by
/// `sum(1 / (rrf_k + rank))` over the lists it appears in (1-indexed
/// rank). A chunk absent from a list contributes nothing from it.
pub fn reciprocal_rank_fusion(lists: &[Vec<ScoredChunk>], rrf_k: u32) -> Vec<ScoredChunk> {
    let mut fused: HashMap<String, ScoredChunk> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for list in lists {
        for (i, scored) in list.iter().enumerate() {
            let rank = (i + 1) as f64;
            let contribution = 1.0 / (rrf_k as f64 + rank);
            let id = scored.chunk.chunk_id.clone();
            match fused.get_mut(&id) {
                Some(existing) => existing.score += contribution,
                None => {
                    order.push(id.clone());
                    fused.insert(
                        id,
                        ScoredChunk {
                            chunk: scored.chunk.clone(),
                            score: contribution,
                        },
                    );
                }
            }
        }
    }

    let mut result: Vec<ScoredChunk> = order.into_iter().map(|id| fused.remove(&id).unwrap()).collect();
    result.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newsintel_common::{Article, Chunk};

    fn make_scored(text: &str, index: usize, score: f64) -> ScoredChunk {
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
        ScoredChunk {
            chunk: Chunk::new(&article, 0, text.into(), vec![]),
            score,
        }
    }

    #[test]
    fn fusion_favors_chunks_ranked_highly_in_both_lists() {
        let dense = vec![make_scored("x", 0, 0.9), make_scored("y", 1, 0.5)];
        let sparse = vec![make_scored("y", 1, 10.0), make_scored("x", 0, 1.0)];
        let fused = reciprocal_rank_fusion(&[dense, sparse], DEFAULT_RRF_K);
        // both appear rank 1 + rank 2 across the two lists, so they tie;
        // a chunk appearing in both lists must outscore one appearing in
        // only one.
        assert_eq!(fused.len(), 2);
        let only_dense = reciprocal_rank_fusion(
            &[vec![make_scored("z", 2, 0.9)], Vec::new()],
            DEFAULT_RRF_K,
        );
        assert!(fused[0].score > only_dense[0].score);
    }

    #[test]
    fn fusion_score_is_bounded_by_list_count() {
        let dense = vec![make_scored("x", 0, 0.9)];
        let sparse = vec![make_scored("x", 0, 10.0)];
        let fused = reciprocal_rank_fusion(&[dense, sparse], DEFAULT_RRF_K);
        let max_possible = 2.0 / (DEFAULT_RRF_K as f64 + 1.0);
        assert!(fused[0].score <= max_possible + 1e-9);
    }
}
