//! Sparse (BM25) retrieval — pure functions over an in-memory postings
//! index. Parameters and the plus-one-smoothed IDF form are fixed by
//! design; see the module tests for the exact values expected.

use std::collections::HashMap;

use newsintel_common::{Chunk, ScoredChunk};

const K1: f64 = 1.5;
const B: f64 = 0.75;

#[derive(Debug, Clone, Default)]
pub struct SparseState {
    pub chunks: Vec<Chunk>,
    /// term -> (chunk index -> term frequency)
    postings: HashMap<String, HashMap<usize, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

impl SparseState {
    pub fn append(&mut self, chunks: Vec<Chunk>) {
        for chunk in chunks {
            let tokens = tokenize(&chunk.text);
            let doc_len = tokens.len();
            let chunk_index = self.chunks.len();

            let mut term_freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *term_freqs.entry(token).or_insert(0) += 1;
            }
            for (term, tf) in term_freqs {
                self.postings.entry(term).or_default().insert(chunk_index, tf);
            }

            self.doc_lens.push(doc_len);
            self.chunks.push(chunk);
        }

        let total: usize = self.doc_lens.iter().sum();
        self.avg_doc_len = if self.doc_lens.is_empty() {
            0.0
        } else {
            total as f64 / self.doc_lens.len() as f64
        };
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn df(&self, term: &str) -> usize {
        self.postings.get(term).map(|m| m.len()).unwrap_or(0)
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.chunks.len() as f64;
        let df = self.df(term) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

/// Top-`k` chunks by BM25 score against `query`, filtered to positive
/// scores, ties broken by insertion order.
pub fn search(state: &SparseState, query: &str, k: usize) -> Vec<ScoredChunk> {
    if state.is_empty() {
        return Vec::new();
    }

    let query_terms = tokenize(query);
    let mut scores: HashMap<usize, f64> = HashMap::new();

    for term in &query_terms {
        let Some(postings) = state.postings.get(term) else {
            continue;
        };
        let idf = state.idf(term);
        for (&chunk_index, &tf) in postings {
            let doc_len = state.doc_lens[chunk_index] as f64;
            let numerator = idf * (tf as f64) * (K1 + 1.0);
            let denominator =
                tf as f64 + K1 * (1.0 - B + B * (doc_len / state.avg_doc_len.max(1.0)));
            *scores.entry(chunk_index).or_insert(0.0) += numerator / denominator;
        }
    }

    let mut scored: Vec<ScoredChunk> = scores
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .map(|(idx, score)| ScoredChunk {
            chunk: state.chunks[idx].clone(),
            score,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn bm25_ranks_exact_term_match_above_unrelated() {
        let mut state = SparseState::default();
        state.append(vec![
            make_chunk("apple reports record quarterly earnings", 0),
            make_chunk("weather forecast for the weekend", 1),
        ]);
        let results = search(&state, "apple earnings", 5);
        assert_eq!(results[0].chunk.chunk_id, "a0:0");
    }

    #[test]
    fn bm25_returns_no_results_for_unmatched_query() {
        let mut state = SparseState::default();
        state.append(vec![make_chunk("apple reports earnings", 0)]);
        assert!(search(&state, "zzz nonexistent", 5).is_empty());
    }

    #[test]
    fn idf_decreases_as_term_becomes_more_common() {
        let mut state = SparseState::default();
        state.append(vec![
            make_chunk("common word here", 0),
            make_chunk("common word there", 1),
            make_chunk("rare token appears", 2),
        ]);
        assert!(state.idf("common") < state.idf("rare"));
    }
}
