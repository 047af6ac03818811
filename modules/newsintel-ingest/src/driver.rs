//! The streaming driver (C7): a long-lived task that polls the
//! aggregator on a fixed interval and emits admitted articles onto the
//! ingest coordinator's queue.

use std::sync::Arc;
use std::time::Duration;

use newsintel_adapters::Aggregator;
use newsintel_common::Article;
use tokio::sync::mpsc;

/// One admitted article, tagged with a monotonic sequence number used
/// downstream for at-most-once delivery accounting (C11).
#[derive(Debug, Clone)]
pub struct ArticleAdmitted {
    pub sequence: u64,
    pub article: Article,
    pub admitted_at: chrono::DateTime<chrono::Utc>,
}

pub struct StreamingDriver {
    aggregator: Arc<Aggregator>,
    refresh_interval: Duration,
    sink: mpsc::Sender<ArticleAdmitted>,
}

impl StreamingDriver {
    pub fn new(
        aggregator: Arc<Aggregator>,
        refresh_interval: Duration,
        sink: mpsc::Sender<ArticleAdmitted>,
    ) -> Self {
        Self {
            aggregator,
            refresh_interval,
            sink,
        }
    }

    /// Runs until `shutdown` fires. Any failure within a tick is logged
    /// and the loop continues at the next interval; the driver itself
    /// never exits except on cooperative shutdown.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut sequence = 0u64;
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sequence = self.tick(sequence).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("streaming driver received shutdown signal");
                        break;
                    }
                }
            }
        }
    }

    async fn tick(&self, mut sequence: u64) -> u64 {
        let articles = self.aggregator.fetch_all(None).await;
        if articles.is_empty() {
            return sequence;
        }

        for article in articles {
            sequence += 1;
            let event = ArticleAdmitted {
                sequence,
                article,
                admitted_at: chrono::Utc::now(),
            };
            if self.sink.send(event).await.is_err() {
                tracing::warn!("ingest coordinator channel closed, dropping remaining tick");
                break;
            }
        }
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsintel_adapters::{AggregationMode, SourceAdapter};

    struct OnceAdapter {
        article: Article,
    }

    #[async_trait]
    impl SourceAdapter for OnceAdapter {
        fn name(&self) -> &str {
            "once"
        }

        async fn fetch(&self, _query: Option<&str>) -> Vec<Article> {
            vec![self.article.clone()]
        }
    }

    fn make_article(id: &str) -> Article {
        let now = chrono::Utc::now();
        Article {
            id: id.into(),
            title: "t".into(),
            description: "d".into(),
            content: "c".into(),
            source_name: "s".into(),
            canonical_url: format!("https://x/{id}"),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        }
    }

    #[tokio::test]
    async fn tick_emits_one_event_per_article_with_increasing_sequence() {
        let adapter = Arc::new(OnceAdapter {
            article: make_article("a1"),
        });
        let aggregator = Arc::new(Aggregator::new(vec![adapter], AggregationMode::Union));
        let (tx, mut rx) = mpsc::channel(8);
        let driver = StreamingDriver::new(aggregator, Duration::from_secs(60), tx);

        let next = driver.tick(0).await;
        assert_eq!(next, 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.sequence, 1);
        assert_eq!(event.article.id, "a1");
    }
}
