//! `breaking-news` adapter: general-purpose everything-search, the
//! highest-priority source in `AggregationMode::OrderedFailover`
//! (grounded on NewsAPI.org's `/v2/everything` contract).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsintel_common::Article;
use serde::Deserialize;

use crate::adapter::{normalize, SourceAdapter};

const BASE_URL: &str = "https://newsapi.org/v2/everything";
const DEFAULT_QUERY: &str = "stock market";

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    status: String,
    articles: Option<Vec<RawArticle>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    source: Option<RawSource>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
}

pub struct BreakingNewsAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl BreakingNewsAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    fn convert(&self, raw: RawArticle) -> Article {
        normalize(
            self.name(),
            raw.title.unwrap_or_default(),
            raw.description.clone(),
            raw.content.or(raw.description),
            raw.source.and_then(|s| s.name),
            raw.url.unwrap_or_default(),
            raw.published_at,
            raw.url_to_image,
        )
    }
}

#[async_trait]
impl SourceAdapter for BreakingNewsAdapter {
    fn name(&self) -> &str {
        "breaking-news"
    }

    async fn fetch(&self, query: Option<&str>) -> Vec<Article> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(adapter = self.name(), "api key not configured");
            return Vec::new();
        };

        let q = query.unwrap_or(DEFAULT_QUERY);

        let response = self
            .client
            .get(BASE_URL)
            .query(&[("q", q), ("language", "en"), ("sortBy", "publishedAt")])
            .header("X-Api-Key", api_key)
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

        let envelope: RawEnvelope = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(adapter = self.name(), error = %e, "failed to parse response");
                return Vec::new();
            }
        };

        if envelope.status != "ok" {
            tracing::warn!(adapter = self.name(), status = %envelope.status, "provider reported non-ok status");
            return Vec::new();
        }

        let articles: Vec<Article> = envelope
            .articles
            .unwrap_or_default()
            .into_iter()
            .take(20)
            .map(|a| self.convert(a))
            .collect();
        tracing::info!(adapter = self.name(), count = articles.len(), "fetch complete");
        articles
    }
}
