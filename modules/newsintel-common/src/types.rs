//! Canonical data model shared across the ingestion, indexing, and verdict
//! crates: [`Article`], [`Chunk`], subject state, and the push-channel
//! frame shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A normalized, provider-agnostic news article.
///
/// Identity is the content [`fingerprint`], not a provider-assigned id —
/// the same story republished by two providers must collapse to one
/// [`Article`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub source_name: String,
    pub canonical_url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub first_seen_at: DateTime<Utc>,
}

impl Article {
    /// Stable identity for an article: a hash over title and canonical URL.
    /// Two fetches of the same story, even from different providers,
    /// produce the same fingerprint.
    pub fn fingerprint(title: &str, canonical_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\0");
        hasher.update(canonical_url.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Denormalized article fields carried alongside a [`Chunk`] so retrieval
/// results don't require a join back to the article store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleRef {
    pub article_id: String,
    pub title: String,
    pub source_name: String,
    pub canonical_url: String,
    pub published_at: DateTime<Utc>,
}

/// A bounded-length text segment derived from exactly one article; the
/// unit of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub subject_tags: Vec<String>,
    pub char_length: usize,
    pub token_estimate: usize,
    pub article: ArticleRef,
}

impl Chunk {
    pub fn new(article: &Article, index: usize, text: String, subject_tags: Vec<String>) -> Self {
        let char_length = text.chars().count();
        let token_estimate = text.split_whitespace().count();
        Self {
            chunk_id: format!("{}:{index}", article.id),
            text,
            subject_tags,
            char_length,
            token_estimate,
            article: ArticleRef {
                article_id: article.id.clone(),
                title: article.title.clone(),
                source_name: article.source_name.clone(),
                canonical_url: article.canonical_url.clone(),
                published_at: article.published_at,
            },
        }
    }
}

/// A single row of a chunk plus its retrieval/fusion score, returned by
/// the sparse, dense, and hybrid retrievers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
}

/// Overall directional read on a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Rolling market read for a subject, held by the subject-state registry
/// and broadcast on every update (I4: `last_updated` is monotonic).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectState {
    pub subject: String,
    pub score: f64,
    pub label: SentimentLabel,
    pub last_updated: DateTime<Utc>,
}

/// The assembled, structured output for a subject: the thing a subscriber
/// or a synchronous caller actually receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub technical_score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub key_factors: Vec<String>,
    pub sources: Vec<ArticleRef>,
    pub reasoning: String,
    pub primary_driver: String,
    pub latency_ms: u64,
    pub report: Option<Report>,
}

/// Optional narrative summary rendered from a completed verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub headline: String,
    pub narrative: String,
    pub bullet_points: Vec<String>,
}

/// A frame sent down a subscriber's push channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    Verdict {
        data: Verdict,
    },
    MarketUpdate {
        data: Vec<SubjectState>,
    },
    MetricsUpdate {
        indexing_latency_ms: u64,
        total_docs: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let a = Article::fingerprint("Apple beats earnings", "https://x/a");
        let b = Article::fingerprint("Apple beats earnings", "https://x/a");
        let c = Article::fingerprint("Apple beats earnings", "https://x/b");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn chunk_id_is_scoped_to_article_and_index() {
        let now = Utc::now();
        let article = Article {
            id: "abc".into(),
            title: "t".into(),
            description: "d".into(),
            content: "c".into(),
            source_name: "s".into(),
            canonical_url: "u".into(),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        };
        let chunk = Chunk::new(&article, 2, "hello world".into(), vec![]);
        assert_eq!(chunk.chunk_id, "abc:2");
        assert_eq!(chunk.token_estimate, 2);
    }
}
