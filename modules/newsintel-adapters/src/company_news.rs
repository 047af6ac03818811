//! `company-news` adapter: per-symbol company news, fast free-tier rate
//! limit (grounded on Finnhub's `/company-news` contract).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsintel_common::Article;
use serde::Deserialize;

use crate::adapter::{normalize, RateLimiter, SourceAdapter};

const BASE_URL: &str = "https://finnhub.io/api/v1/company-news";

/// Queries outside the adapter's symbol shape (1-5 uppercase letters) fall
/// back to rotating through this list rather than any single default.
const DEFAULT_SYMBOL_ROTATION: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA"];

#[derive(Debug, Deserialize)]
struct RawArticle {
    headline: Option<String>,
    summary: Option<String>,
    source: Option<String>,
    url: Option<String>,
    datetime: Option<i64>,
    image: Option<String>,
}

pub struct CompanyNewsAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    limiter: RateLimiter,
    rotation_cursor: AtomicUsize,
}

impl CompanyNewsAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            limiter: RateLimiter::new(Duration::from_secs(1)),
            rotation_cursor: AtomicUsize::new(0),
        }
    }

    /// `query` is only usable as a Finnhub `symbol` when it looks like a
    /// ticker; anything else (a company name, a free-text headline) rotates
    /// through a small default list instead of being sent verbatim.
    fn resolve_symbol(&self, query: Option<&str>) -> String {
        let valid = query
            .map(|q| q.to_uppercase())
            .filter(|q| (1..=5).contains(&q.len()) && q.chars().all(|c| c.is_ascii_alphabetic()));
        match valid {
            Some(symbol) => symbol,
            None => {
                let i = self.rotation_cursor.fetch_add(1, Ordering::Relaxed) % DEFAULT_SYMBOL_ROTATION.len();
                DEFAULT_SYMBOL_ROTATION[i].to_string()
            }
        }
    }

    fn convert(&self, raw: RawArticle) -> Article {
        let published_at = raw
            .datetime
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
        normalize(
            self.name(),
            raw.headline.unwrap_or_default(),
            raw.summary.clone(),
            raw.summary,
            raw.source,
            raw.url.unwrap_or_default(),
            published_at,
            raw.image,
        )
    }
}

#[async_trait]
impl SourceAdapter for CompanyNewsAdapter {
    fn name(&self) -> &str {
        "company-news"
    }

    async fn fetch(&self, query: Option<&str>) -> Vec<Article> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(adapter = self.name(), "api key not configured");
            return Vec::new();
        };

        self.limiter.acquire().await;

        let symbol = self.resolve_symbol(query);
        let to = Utc::now();
        let from = to - chrono::Duration::days(7);

        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("symbol", symbol.as_str()),
                ("from", &from.format("%Y-%m-%d").to_string()),
                ("to", &to.format("%Y-%m-%d").to_string()),
                ("token", api_key),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(adapter = self.name(), status = %r.status(), "non-success response");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(adapter = self.name(), error = %e, "request failed");
                return Vec::new();
            }
        };

        let raw: Vec<RawArticle> = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(adapter = self.name(), error = %e, "failed to parse response");
                return Vec::new();
            }
        };

        let articles: Vec<Article> = raw.into_iter().take(20).map(|a| self.convert(a)).collect();
        tracing::info!(adapter = self.name(), count = articles.len(), "fetch complete");
        articles
    }
}
