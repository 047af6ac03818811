//! The aggregator (C2): fans out to every enabled adapter, unions their
//! results, and deduplicates against a persistent seen-set (I1).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use newsintel_common::Article;
use tokio::sync::Mutex;

use crate::adapter::SourceAdapter;

/// Default high-watermark for the seen-set: at least two orders of
/// magnitude above one tick's expected arrivals.
const DEFAULT_SEEN_SET_CAPACITY: usize = 50_000;

/// How the aggregator combines adapter results.
///
/// The original multi-source aggregator's docstring advertises
/// "automatic failover across sources" even though its actual call
/// path unions every source's results. Both semantics are real and
/// useful, so both are exposed; `Union` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Call every enabled adapter in parallel, concatenate everything.
    Union,
    /// Call adapters in priority order (the order they were registered),
    /// stopping at the first one that returns a non-empty list.
    OrderedFailover,
}

struct SeenSet {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl SeenSet {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    /// Returns `true` if `fingerprint` was newly inserted (i.e. not a
    /// duplicate).
    fn insert(&mut self, fingerprint: String) -> bool {
        if self.members.contains(&fingerprint) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        self.order.push_back(fingerprint.clone());
        self.members.insert(fingerprint);
        true
    }
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    mode: AggregationMode,
    seen: Mutex<SeenSet>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, mode: AggregationMode) -> Self {
        Self {
            adapters,
            mode,
            seen: Mutex::new(SeenSet::new(DEFAULT_SEEN_SET_CAPACITY)),
        }
    }

    /// Fetches from every adapter per `mode`, then deduplicates against
    /// the persistent seen-set. Never fails: an all-empty tick simply
    /// returns an empty list.
    pub async fn fetch_all(&self, query: Option<&str>) -> Vec<Article> {
        let raw = match self.mode {
            AggregationMode::Union => self.fetch_union(query).await,
            AggregationMode::OrderedFailover => self.fetch_ordered_failover(query).await,
        };

        let mut seen = self.seen.lock().await;
        let unique: Vec<Article> = raw
            .into_iter()
            .filter(|article| seen.insert(article.id.clone()))
            .collect();
        drop(seen);

        tracing::info!(
            mode = ?self.mode,
            sources = self.adapters.len(),
            unique = unique.len(),
            "aggregation complete"
        );
        unique
    }

    async fn fetch_union(&self, query: Option<&str>) -> Vec<Article> {
        let tasks = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let query = query.map(|q| q.to_string());
            tokio::spawn(async move { adapter.fetch(query.as_deref()).await })
        });

        let results = futures::future::join_all(tasks).await;
        results
            .into_iter()
            .filter_map(|r| r.ok())
            .flatten()
            .collect()
    }

    async fn fetch_ordered_failover(&self, query: Option<&str>) -> Vec<Article> {
        for adapter in &self.adapters {
            let articles = adapter.fetch(query).await;
            if !articles.is_empty() {
                return articles;
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAdapter {
        name: &'static str,
        articles: Vec<Article>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _query: Option<&str>) -> Vec<Article> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.articles.clone()
        }
    }

    fn make_article(title: &str, url: &str) -> Article {
        let now = chrono::Utc::now();
        Article {
            id: Article::fingerprint(title, url),
            title: title.into(),
            description: String::new(),
            content: String::new(),
            source_name: "test".into(),
            canonical_url: url.into(),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        }
    }

    #[tokio::test]
    async fn union_mode_dedupes_across_sources() {
        let shared = make_article("Shared story", "https://x/shared");
        let a = Arc::new(FixedAdapter {
            name: "a",
            articles: vec![shared.clone(), make_article("Only A", "https://x/a")],
            calls: AtomicUsize::new(0),
        });
        let b = Arc::new(FixedAdapter {
            name: "b",
            articles: vec![shared],
            calls: AtomicUsize::new(0),
        });

        let aggregator = Aggregator::new(vec![a, b], AggregationMode::Union);
        let unique = aggregator.fetch_all(None).await;
        assert_eq!(unique.len(), 2);
    }

    #[tokio::test]
    async fn seen_set_persists_across_ticks() {
        let article = make_article("Repeats", "https://x/repeats");
        let adapter = Arc::new(FixedAdapter {
            name: "a",
            articles: vec![article],
            calls: AtomicUsize::new(0),
        });
        let aggregator = Aggregator::new(vec![adapter], AggregationMode::Union);

        let first = aggregator.fetch_all(None).await;
        let second = aggregator.fetch_all(None).await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 0);
    }

    #[tokio::test]
    async fn ordered_failover_stops_at_first_nonempty() {
        let a = Arc::new(FixedAdapter {
            name: "a",
            articles: vec![],
            calls: AtomicUsize::new(0),
        });
        let b = Arc::new(FixedAdapter {
            name: "b",
            articles: vec![make_article("From b", "https://x/b")],
            calls: AtomicUsize::new(0),
        });
        let c = Arc::new(FixedAdapter {
            name: "c",
            articles: vec![make_article("From c", "https://x/c")],
            calls: AtomicUsize::new(0),
        });

        let aggregator = Aggregator::new(vec![a, b, c.clone()], AggregationMode::OrderedFailover);
        let result = aggregator.fetch_all(None).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "From b");
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);
    }
}
