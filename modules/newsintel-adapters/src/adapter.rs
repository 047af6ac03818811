//! The [`SourceAdapter`] trait and the shared rate-limiting / normalization
//! helpers every concrete adapter builds on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsintel_common::Article;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A single news provider. Adapters never propagate transport errors —
/// a failed or rate-limited fetch returns an empty list, and the
/// aggregator (C2) treats that the same as "nothing new this tick".
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// `query` is typically a subject symbol; adapters that require one
    /// fall back to a default rotation when it's absent.
    async fn fetch(&self, query: Option<&str>) -> Vec<Article>;
}

/// Enforces a minimum interval between calls. Shared state behind a
/// mutex since adapters are held as `Arc<dyn SourceAdapter>` and called
/// from the aggregator's worker pool.
pub struct RateLimiter {
    min_interval: std::time::Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: std::time::Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until the minimum interval has elapsed since the last call,
    /// then records this call's timestamp.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// A monthly/daily call-count cap that denies once exhausted. Adapters
/// reset it themselves (no wall-clock awareness here); this mirrors the
/// source cap used by quota-limited providers.
pub struct CallBudget {
    max_calls: u64,
    used: std::sync::atomic::AtomicU64,
}

impl CallBudget {
    pub fn new(max_calls: u64) -> Self {
        Self {
            max_calls,
            used: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Returns `true` and consumes one call if budget remains.
    pub fn try_consume(&self) -> bool {
        use std::sync::atomic::Ordering;
        let mut current = self.used.load(Ordering::Relaxed);
        loop {
            if current >= self.max_calls {
                return false;
            }
            match self.used.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Truncates, defaults, and fills gaps the way every concrete adapter's
/// conversion function needs to: description capped at 500 chars,
/// content falls back to description, source name falls back to the
/// adapter's own name.
pub fn normalize(
    adapter_name: &str,
    title: String,
    description: Option<String>,
    content: Option<String>,
    source_name: Option<String>,
    canonical_url: String,
    published_at: Option<DateTime<Utc>>,
    image_url: Option<String>,
) -> Article {
    let now = Utc::now();
    let description = description.unwrap_or_default();
    let description: String = description.chars().take(500).collect();
    let content = content.filter(|c| !c.is_empty()).unwrap_or_else(|| description.clone());
    let source_name = source_name
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| adapter_name.to_string());
    let published_at = published_at.unwrap_or(now);
    let id = Article::fingerprint(&title, &canonical_url);

    Article {
        id,
        title,
        description,
        content,
        source_name,
        canonical_url,
        published_at,
        image_url,
        first_seen_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_truncates_description_and_fills_content() {
        let long_desc = "x".repeat(600);
        let article = normalize(
            "TestAdapter",
            "Title".into(),
            Some(long_desc.clone()),
            None,
            None,
            "https://x/a".into(),
            None,
            None,
        );
        assert_eq!(article.description.len(), 500);
        assert_eq!(article.content, article.description);
        assert_eq!(article.source_name, "TestAdapter");
    }

    #[tokio::test]
    async fn call_budget_denies_once_exhausted() {
        let budget = CallBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
    }
}
