//! The subject router (C9): maps a committed chunk batch to affected
//! subjects and schedules at most one in-flight recomputation per
//! subject, coalescing concurrent triggers into a single queued
//! follow-up (P5).

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use newsintel_common::Chunk;

const MARKET_SUBJECT: &str = "*market*";

type RecomputeFn = Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Default)]
struct Flight {
    running: bool,
    pending: bool,
}

/// Schedules subject recomputations with single-flight coalescing.
/// Generic over the recompute callback so this crate never depends on
/// the verdict assembler's concrete type, or on the push hub for
/// subscription membership.
///
/// Spawns its own background tasks, so callers hold it behind an `Arc`
/// and call [`SubjectRouter::route`]/[`SubjectRouter::trigger`] through
/// that `Arc` rather than a bare reference.
pub struct SubjectRouter {
    flights: Mutex<HashMap<String, Flight>>,
    recompute: RecomputeFn,
}

impl SubjectRouter {
    pub fn new<F, Fut>(recompute: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            flights: Mutex::new(HashMap::new()),
            recompute: Arc::new(move |subject| Box::pin(recompute(subject))),
        }
    }

    /// Computes the union of subject tags in `chunks` (plus the
    /// pseudo-subject for a literal `MARKET` mention), intersects with
    /// `active_subjects`, and triggers each.
    pub fn route(self: &Arc<Self>, chunks: &[Chunk], active_subjects: &HashSet<String>) {
        let mut affected: HashSet<String> = HashSet::new();
        for chunk in chunks {
            for tag in &chunk.subject_tags {
                affected.insert(tag.clone());
            }
            if chunk.text.contains("MARKET") {
                affected.insert(MARKET_SUBJECT.to_string());
            }
        }

        for subject in affected.intersection(active_subjects) {
            self.trigger(subject.clone());
        }
    }

    /// Triggers a recomputation for `subject`. If one is already
    /// running, coalesces into a single queued follow-up; further
    /// triggers while a follow-up is already queued are no-ops.
    pub fn trigger(self: &Arc<Self>, subject: String) {
        let mut flights = self.flights.lock().expect("subject router lock poisoned");
        let flight = flights.entry(subject.clone()).or_default();
        if flight.running {
            flight.pending = true;
            return;
        }
        flight.running = true;
        drop(flights);

        let router = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                (router.recompute)(subject.clone()).await;

                let mut table = router.flights.lock().expect("subject router lock poisoned");
                let Some(flight) = table.get_mut(&subject) else {
                    return;
                };
                if flight.pending {
                    flight.pending = false;
                    continue;
                }
                table.remove(&subject);
                return;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_triggers_coalesce_into_one_followup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let router = Arc::new(SubjectRouter::new(move |_subject| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
        }));

        router.trigger("AAPL".to_string());
        tokio::time::sleep(Duration::from_millis(5)).await;
        router.trigger("AAPL".to_string());
        router.trigger("AAPL".to_string());
        router.trigger("AAPL".to_string());

        tokio::time::sleep(Duration::from_millis(100)).await;
        // First run picks up the burst as exactly one coalesced follow-up.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn route_only_triggers_active_subjects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let router = Arc::new(SubjectRouter::new(move |_subject| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let article = {
            let now = chrono::Utc::now();
            newsintel_common::Article {
                id: "a1".into(),
                title: "t".into(),
                description: "d".into(),
                content: "c".into(),
                source_name: "s".into(),
                canonical_url: "https://x/1".into(),
                published_at: now,
                image_url: None,
                first_seen_at: now,
            }
        };
        let chunk = Chunk::new(&article, 0, "AAPL and NVDA rally".into(), vec!["AAPL".into(), "NVDA".into()]);

        let mut active = HashSet::new();
        active.insert("AAPL".to_string());
        router.route(&[chunk], &active);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
