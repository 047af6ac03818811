//! The push hub (C11): a subject-keyed subscriber registry with
//! per-sink FIFO delivery and drop-oldest backpressure.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use newsintel_common::PushFrame;
use tokio::sync::Notify;

const DEFAULT_HIGH_WATERMARK: usize = 256;

/// A per-sink bounded ring buffer. Pushing past capacity drops the
/// oldest pending frame rather than blocking the broadcaster —
/// dashboard semantics, not an audit log (I5: best-effort, no replay).
struct FrameQueue {
    inner: std::sync::Mutex<VecDeque<PushFrame>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
}

impl FrameQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: std::sync::Mutex::new(VecDeque::new()),
            capacity,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn push(&self, frame: PushFrame) {
        let mut queue = self.inner.lock().expect("frame queue lock poisoned");
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(frame);
        drop(queue);
        self.notify.notify_one();
    }

    async fn recv(&self) -> Option<PushFrame> {
        loop {
            {
                let mut queue = self.inner.lock().expect("frame queue lock poisoned");
                if let Some(frame) = queue.pop_front() {
                    return Some(frame);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

type SubjectRegistry = RwLock<HashMap<String, Vec<(u64, Arc<FrameQueue>)>>>;

pub struct PushHub {
    by_subject: SubjectRegistry,
    next_id: AtomicU64,
    high_watermark: usize,
}

impl PushHub {
    pub fn new() -> Self {
        Self::with_high_watermark(DEFAULT_HIGH_WATERMARK)
    }

    pub fn with_high_watermark(high_watermark: usize) -> Self {
        Self {
            by_subject: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            high_watermark,
        }
    }

    /// Registers a new sink for `subject`, returning a handle that
    /// unsubscribes when dropped.
    pub fn subscribe(self: &Arc<Self>, subject: &str) -> SinkHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(FrameQueue::new(self.high_watermark));

        let mut registry = self.by_subject.write().expect("push hub lock poisoned");
        registry
            .entry(subject.to_string())
            .or_default()
            .push((id, Arc::clone(&queue)));

        SinkHandle {
            hub: Arc::clone(self),
            subject: subject.to_string(),
            id,
            queue,
        }
    }

    fn unsubscribe(&self, subject: &str, id: u64) {
        let mut registry = self.by_subject.write().expect("push hub lock poisoned");
        if let Some(sinks) = registry.get_mut(subject) {
            sinks.retain(|(sink_id, _)| *sink_id != id);
            if sinks.is_empty() {
                registry.remove(subject);
            }
        }
    }

    /// Delivers `frame` to every sink registered for `subject`. A full
    /// sink queue silently drops its oldest pending frame; a delivery
    /// never blocks the broadcaster.
    pub fn broadcast_subject(&self, subject: &str, frame: PushFrame) {
        let registry = self.by_subject.read().expect("push hub lock poisoned");
        let Some(sinks) = registry.get(subject) else {
            return;
        };
        for (_, queue) in sinks {
            queue.push(frame.clone());
        }
    }

    /// Delivers `frame` to every sink across every subject.
    pub fn broadcast_global(&self, frame: PushFrame) {
        let registry = self.by_subject.read().expect("push hub lock poisoned");
        for sinks in registry.values() {
            for (_, queue) in sinks {
                queue.push(frame.clone());
            }
        }
    }

    /// Subjects with at least one live subscriber — what the subject
    /// router (C9) intersects against to decide what's worth
    /// recomputing.
    pub fn active_subjects(&self) -> HashSet<String> {
        self.by_subject
            .read()
            .expect("push hub lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.by_subject
            .read()
            .expect("push hub lock poisoned")
            .get(subject)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription. Dropping it unregisters the sink from the hub.
pub struct SinkHandle {
    hub: Arc<PushHub>,
    subject: String,
    id: u64,
    queue: Arc<FrameQueue>,
}

impl SinkHandle {
    pub async fn recv(&self) -> Option<PushFrame> {
        self.queue.recv().await
    }
}

impl Drop for SinkHandle {
    fn drop(&mut self) {
        self.queue.close();
        self.hub.unsubscribe(&self.subject, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsintel_common::SubjectState;

    fn market_frame() -> PushFrame {
        PushFrame::MarketUpdate { data: vec![] }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber_on_subject() {
        let hub = Arc::new(PushHub::new());
        let sink1 = hub.subscribe("AAPL");
        let sink2 = hub.subscribe("AAPL");

        hub.broadcast_subject("AAPL", market_frame());

        assert!(sink1.recv().await.is_some());
        assert!(sink2.recv().await.is_some());
    }

    #[tokio::test]
    async fn unsubscribe_on_drop_removes_from_active_subjects() {
        let hub = Arc::new(PushHub::new());
        {
            let _sink = hub.subscribe("AAPL");
            assert!(hub.active_subjects().contains("AAPL"));
        }
        assert!(!hub.active_subjects().contains("AAPL"));
    }

    #[tokio::test]
    async fn backpressure_drops_oldest_once_watermark_exceeded() {
        let hub = Arc::new(PushHub::with_high_watermark(2));
        let sink = hub.subscribe("AAPL");

        for i in 0..5 {
            hub.broadcast_subject(
                "AAPL",
                PushFrame::MarketUpdate {
                    data: vec![SubjectState {
                        subject: "AAPL".into(),
                        score: i as f64,
                        label: newsintel_common::SentimentLabel::Neutral,
                        last_updated: chrono::Utc::now(),
                    }],
                },
            );
        }

        let first = sink.recv().await.unwrap();
        if let PushFrame::MarketUpdate { data } = first {
            // Only the two most recent frames survive the watermark.
            assert_eq!(data[0].score, 3.0);
        } else {
            panic!("wrong frame type");
        }
    }
}
