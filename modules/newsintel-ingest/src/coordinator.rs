//! The ingest coordinator (C8): drains admitted articles into bounded
//! micro-batches, chunks them, and commits the batch to the index store
//! under one write-exclusive section (I3), then hands it to whatever
//! consumes committed batches (the subject router, C9).

use std::time::Duration;

use chrono::Utc;
use newsintel_common::Chunk;
use newsintel_index::IndexStore;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::chunker::Chunker;
use crate::driver::ArticleAdmitted;

const MAX_BATCH_SIZE: usize = 64;
const MAX_BATCH_WINDOW: Duration = Duration::from_millis(50);

/// A batch of chunks that was just committed to the index store,
/// together with the per-article ingestion latency observed.
#[derive(Debug, Clone)]
pub struct CommittedBatch {
    pub chunks: Vec<Chunk>,
    pub max_latency_ms: u64,
}

pub struct IngestCoordinator {
    rx: mpsc::Receiver<ArticleAdmitted>,
    store: std::sync::Arc<IndexStore>,
    chunker: Chunker,
    out: mpsc::Sender<CommittedBatch>,
}

impl IngestCoordinator {
    pub fn new(
        rx: mpsc::Receiver<ArticleAdmitted>,
        store: std::sync::Arc<IndexStore>,
        chunker: Chunker,
        out: mpsc::Sender<CommittedBatch>,
    ) -> Self {
        Self {
            rx,
            store,
            chunker,
            out,
        }
    }

    pub async fn run(mut self) {
        loop {
            let Some(first) = self.rx.recv().await else {
                tracing::info!("ingest coordinator channel closed, stopping");
                return;
            };
            let batch = self.drain_batch(first).await;
            self.commit(batch).await;
        }
    }

    async fn drain_batch(&mut self, first: ArticleAdmitted) -> Vec<ArticleAdmitted> {
        let mut batch = vec![first];
        let deadline = Instant::now() + MAX_BATCH_WINDOW;

        while batch.len() < MAX_BATCH_SIZE {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.rx.recv()).await {
                Ok(Some(event)) => batch.push(event),
                Ok(None) => break,
                Err(_elapsed) => break,
            }
        }
        batch
    }

    async fn commit(&self, batch: Vec<ArticleAdmitted>) {
        if batch.is_empty() {
            return;
        }

        let max_latency_ms = batch
            .iter()
            .map(|e| (Utc::now() - e.admitted_at).num_milliseconds().max(0) as u64)
            .max()
            .unwrap_or(0);

        let chunks: Vec<Chunk> = batch
            .iter()
            .flat_map(|e| self.chunker.chunk(&e.article))
            .collect();

        if chunks.is_empty() {
            tracing::debug!(articles = batch.len(), "batch produced no chunks, skipping commit");
            return;
        }

        match self.store.commit(chunks.clone()).await {
            Ok(()) => {
                tracing::info!(
                    articles = batch.len(),
                    chunks = chunks.len(),
                    latency_ms = max_latency_ms,
                    "batch committed"
                );
                let committed = CommittedBatch {
                    chunks,
                    max_latency_ms,
                };
                if self.out.send(committed).await.is_err() {
                    tracing::warn!("subject router channel closed, dropping committed batch notice");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, articles = batch.len(), "batch commit failed, dropping batch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsintel_common::Article;
    use newsintel_index::HashEmbedder;
    use std::sync::Arc;

    fn make_event(id: &str, sequence: u64) -> ArticleAdmitted {
        let now = chrono::Utc::now();
        ArticleAdmitted {
            sequence,
            article: Article {
                id: id.into(),
                title: "Apple surges".into(),
                description: "d".into(),
                content: "Apple reported strong growth. Investors cheered.".into(),
                source_name: "s".into(),
                canonical_url: format!("https://x/{id}"),
                published_at: now,
                image_url: None,
                first_seen_at: now,
            },
            admitted_at: now,
        }
    }

    #[tokio::test]
    async fn commits_batch_and_notifies_downstream() {
        let store = Arc::new(IndexStore::new(Box::new(HashEmbedder::new(16))));
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let coordinator = IngestCoordinator::new(rx, store.clone(), Chunker::default(), out_tx);

        tx.send(make_event("a1", 1)).await.unwrap();
        drop(tx);

        tokio::spawn(coordinator.run());
        let committed = out_rx.recv().await.unwrap();
        assert!(!committed.chunks.is_empty());
        assert_eq!(store.size(), committed.chunks.len());
    }

    #[tokio::test]
    async fn empty_chunk_batch_is_never_committed() {
        let store = Arc::new(IndexStore::new(Box::new(HashEmbedder::new(16))));
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let mut event = make_event("a1", 1);
        event.article.content = String::new();
        event.article.description = String::new();
        let coordinator = IngestCoordinator::new(rx, store.clone(), Chunker::default(), out_tx);

        tx.send(event).await.unwrap();
        drop(tx);

        tokio::spawn(coordinator.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.size(), 0);
        assert!(out_rx.try_recv().is_err());
    }
}
