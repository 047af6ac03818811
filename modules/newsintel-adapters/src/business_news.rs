//! `business-news` adapter: keyword-driven business category search with
//! a hard monthly call cap (grounded on MediaStack's free tier).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsintel_common::Article;
use serde::Deserialize;

use crate::adapter::{normalize, CallBudget, SourceAdapter};

const BASE_URL: &str = "http://api.mediastack.com/v1/news";
const DEFAULT_KEYWORDS: &str = "stock market finance trading";
const MONTHLY_CALL_CAP: u64 = 500;

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    data: Option<Vec<RawArticle>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    source: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    image: Option<String>,
}

pub struct BusinessNewsAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    budget: CallBudget,
}

impl BusinessNewsAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            budget: CallBudget::new(MONTHLY_CALL_CAP),
        }
    }

    fn convert(&self, raw: RawArticle) -> Article {
        normalize(
            self.name(),
            raw.title.unwrap_or_default(),
            raw.description.clone(),
            raw.description,
            raw.source,
            raw.url.unwrap_or_default(),
            raw.published_at,
            raw.image,
        )
    }
}

#[async_trait]
impl SourceAdapter for BusinessNewsAdapter {
    fn name(&self) -> &str {
        "business-news"
    }

    async fn fetch(&self, query: Option<&str>) -> Vec<Article> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(adapter = self.name(), "api key not configured");
            return Vec::new();
        };

        if !self.budget.try_consume() {
            tracing::warn!(adapter = self.name(), "monthly call cap reached");
            return Vec::new();
        }

        let keywords = query.unwrap_or(DEFAULT_KEYWORDS);

        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("access_key", api_key),
                ("keywords", keywords),
                ("categories", "business"),
                ("languages", "en"),
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

        let envelope: RawEnvelope = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(adapter = self.name(), error = %e, "failed to parse response");
                return Vec::new();
            }
        };

        if let Some(err) = envelope.error {
            tracing::warn!(adapter = self.name(), error = %err, "provider returned error");
            return Vec::new();
        }

        let articles: Vec<Article> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .take(20)
            .map(|a| self.convert(a))
            .collect();
        tracing::info!(adapter = self.name(), count = articles.len(), "fetch complete");
        articles
    }
}
