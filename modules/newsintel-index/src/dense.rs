//! Dense (embedding/cosine) retrieval — pure functions over an in-memory
//! vector store; concurrency and commit discipline live in [`crate::store`].

use newsintel_common::{Chunk, ScoredChunk};

use crate::embedder::cosine_similarity;

#[derive(Debug, Clone, Default)]
pub struct DenseState {
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
}

impl DenseState {
    pub fn append(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) {
        debug_assert_eq!(chunks.len(), vectors.len());
        self.chunks.extend(chunks);
        self.vectors.extend(vectors);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Top-`k` chunks by cosine similarity to `query_vector`. Ties keep
/// insertion order (stable sort on a descending key).
pub fn search(state: &DenseState, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = state
        .chunks
        .iter()
        .zip(state.vectors.iter())
        .map(|(chunk, vector)| ScoredChunk {
            chunk: chunk.clone(),
            score: cosine_similarity(query_vector, vector),
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newsintel_common::{Article, Chunk};

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

    #[test]
    fn search_ranks_by_cosine_similarity_descending() {
        let mut state = DenseState::default();
        state.append(
            vec![make_chunk("a", 0), make_chunk("b", 1)],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        );
        let results = search(&state, &[0.9, 0.1], 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].chunk.chunk_id, "a0:0");
    }

    #[test]
    fn search_respects_k() {
        let mut state = DenseState::default();
        state.append(
            vec![make_chunk("a", 0), make_chunk("b", 1), make_chunk("c", 2)],
            vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]],
        );
        assert_eq!(search(&state, &[1.0, 0.0], 1).len(), 1);
    }
}
