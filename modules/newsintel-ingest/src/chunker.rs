//! The chunker (C3): greedy sentence-packing with a fixed token budget,
//! plus subject-tag extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use newsintel_common::{Article, Chunk};
use regex::Regex;

const DEFAULT_MAX_CHUNK_SIZE: usize = 512;

static SUBJECT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("valid regex"));

static SUBJECT_STOPLIST: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "CEO", "CFO", "CTO", "FY", "Q1", "Q2", "Q3", "Q4", "EPS", "US", "UK", "EU", "AM", "PM",
        "IPO", "USD", "GDP", "ATH",
    ]
    .into_iter()
    .collect()
});

#[derive(Clone)]
pub struct Chunker {
    max_chunk_size: usize,
}

impl Chunker {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE)
    }
}

impl Chunker {
    /// Splits a normalized article into chunks: title + body prepended,
    /// greedily packed by sentence up to `max_chunk_size` whitespace-
    /// estimated tokens, no overlap. A single sentence exceeding the
    /// budget becomes its own oversized chunk.
    pub fn chunk(&self, article: &Article) -> Vec<Chunk> {
        let body = if article.content.is_empty() {
            return Vec::new();
        } else {
            format!("{}\n{}", article.title, article.content)
        };

        let sentences = split_sentences(&body);
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for sentence in &sentences {
            let sentence_tokens = sentence.split_whitespace().count();
            if !current.is_empty() && current_tokens + sentence_tokens > self.max_chunk_size {
                chunks.push(self.flush(article, chunks.len(), &current));
                current.clear();
                current_tokens = 0;
            }
            current.push(sentence);
            current_tokens += sentence_tokens;
        }
        if !current.is_empty() {
            chunks.push(self.flush(article, chunks.len(), &current));
        }
        chunks
    }

    fn flush(&self, article: &Article, index: usize, sentences: &[&str]) -> Chunk {
        let text = sentences.join(" ");
        let subject_tags = extract_subject_tags(&text);
        Chunk::new(article, index, text, subject_tags)
    }
}

/// Splits on `.`/`!`/`?` followed by whitespace; the `regex` crate has
/// no lookbehind, so this walks byte offsets instead of a single regex.
fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        let is_terminator = b == b'.' || b == b'!' || b == b'?';
        if !is_terminator {
            continue;
        }
        let next_is_boundary = bytes
            .get(i + 1)
            .map(|c| c.is_ascii_whitespace())
            .unwrap_or(true);
        if next_is_boundary {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Uppercase alpha tokens of length 2-5, excluding common financial
/// abbreviations, deduplicated but order-preserving.
pub fn extract_subject_tags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for m in SUBJECT_TOKEN.find_iter(text) {
        let token = m.as_str();
        if SUBJECT_STOPLIST.contains(token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            tags.push(token.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_article(content: &str) -> Article {
        let now = Utc::now();
        Article {
            id: "a1".into(),
            title: "AAPL surges on earnings".into(),
            description: "d".into(),
            content: content.into(),
            source_name: "s".into(),
            canonical_url: "https://x/1".into(),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        }
    }

    #[test]
    fn empty_body_produces_no_chunks() {
        let article = make_article("");
        assert!(Chunker::default().chunk(&article).is_empty());
    }

    #[test]
    fn single_oversized_sentence_is_not_split() {
        let long_sentence = format!("{}.", "word ".repeat(600).trim());
        let article = make_article(&long_sentence);
        let chunks = Chunker::new(512).chunk(&article);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn greedy_packing_splits_once_budget_exceeded() {
        let sentence = "AAPL reported strong growth this quarter. ".repeat(40);
        let article = make_article(sentence.trim());
        let chunks = Chunker::new(50).chunk(&article);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 50 + 10);
        }
    }

    #[test]
    fn subject_tags_exclude_stoplist() {
        let tags = extract_subject_tags("AAPL reported EPS above Q3 estimates, per CEO comments. NVDA gained too.");
        assert!(tags.contains(&"AAPL".to_string()));
        assert!(tags.contains(&"NVDA".to_string()));
        assert!(!tags.contains(&"EPS".to_string()));
        assert!(!tags.contains(&"CEO".to_string()));
        assert!(!tags.contains(&"Q3".to_string()));
    }
}
