//! `sentiment-tagged-news` adapter: a provider that ships a sentiment
//! score alongside each article (grounded on Alpha Vantage's
//! `NEWS_SENTIMENT` endpoint). The sentiment field itself is not
//! currently consumed by the core (C10 computes its own), but the
//! adapter preserves the provider's raw feed shape for normalization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use newsintel_common::Article;
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{normalize, SourceAdapter};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Queries outside the adapter's symbol shape (1-5 uppercase letters) fall
/// back to rotating through this list rather than any single default.
const DEFAULT_TICKER_ROTATION: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA"];

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    summary: Option<String>,
    source: Option<String>,
    url: Option<String>,
    time_published: Option<String>,
    banner_image: Option<String>,
}

pub struct SentimentTaggedAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    rotation_cursor: AtomicUsize,
}

impl SentimentTaggedAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            rotation_cursor: AtomicUsize::new(0),
        }
    }

    /// `query` is only usable as an Alpha Vantage `tickers` value when it
    /// looks like a ticker; anything else rotates through a small default
    /// list instead of being sent verbatim.
    fn resolve_tickers(&self, query: Option<&str>) -> String {
        let valid = query
            .map(|q| q.to_uppercase())
            .filter(|q| (1..=5).contains(&q.len()) && q.chars().all(|c| c.is_ascii_alphabetic()));
        match valid {
            Some(tickers) => tickers,
            None => {
                let i = self.rotation_cursor.fetch_add(1, Ordering::Relaxed) % DEFAULT_TICKER_ROTATION.len();
                DEFAULT_TICKER_ROTATION[i].to_string()
            }
        }
    }

    fn convert(&self, raw: RawArticle) -> Article {
        // Provider format: `20240102T153000`.
        let published_at = raw.time_published.as_deref().and_then(|s| {
            NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                .ok()
                .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        });
        normalize(
            self.name(),
            raw.title.unwrap_or_default(),
            raw.summary.clone(),
            raw.summary,
            raw.source,
            raw.url.unwrap_or_default(),
            published_at,
            raw.banner_image,
        )
    }
}

#[async_trait]
impl SourceAdapter for SentimentTaggedAdapter {
    fn name(&self) -> &str {
        "sentiment-tagged-news"
    }

    async fn fetch(&self, query: Option<&str>) -> Vec<Article> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(adapter = self.name(), "api key not configured");
            return Vec::new();
        };

        let tickers = self.resolve_tickers(query);

        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", tickers.as_str()),
                ("apikey", api_key),
                ("limit", "50"),
            ])
            .timeout(Duration::from_secs(15))
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

        let data: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(adapter = self.name(), error = %e, "failed to parse response");
                return Vec::new();
            }
        };

        // The provider signals rate limiting with a `Note` or
        // `Information` field instead of a non-200 status.
        if data.get("Note").is_some() || data.get("Information").is_some() {
            tracing::warn!(adapter = self.name(), "rate limited");
            return Vec::new();
        }

        let raw: Vec<RawArticle> = data
            .get("feed")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .unwrap_or_default()
            .unwrap_or_default();

        let articles: Vec<Article> = raw.into_iter().take(20).map(|a| self.convert(a)).collect();
        tracing::info!(adapter = self.name(), count = articles.len(), "fetch complete");
        articles
    }
}
