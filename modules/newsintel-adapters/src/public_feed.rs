//! `public-feed` adapter: RSS/Atom, the always-available, unlimited
//! fallback source. Needs no credential.

use std::time::Duration;

use async_trait::async_trait;
use newsintel_common::Article;

use crate::adapter::{normalize, SourceAdapter};

pub struct PublicFeedAdapter {
    client: reqwest::Client,
    feed_urls: Vec<String>,
}

impl PublicFeedAdapter {
    pub fn new(feed_urls: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build RSS HTTP client");
        Self { client, feed_urls }
    }

    async fn fetch_one(&self, feed_url: &str) -> Vec<Article> {
        let response = match self
            .client
            .get(feed_url)
            .header("User-Agent", "newsintel/0.1")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(adapter = self.name(), feed_url, error = %e, "fetch failed");
                return Vec::new();
            }
        };

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(adapter = self.name(), feed_url, error = %e, "failed to read body");
                return Vec::new();
            }
        };

        let feed = match feed_rs::parser::parse(&bytes[..]) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(adapter = self.name(), feed_url, error = %e, "failed to parse feed");
                return Vec::new();
            }
        };

        feed.entries
            .into_iter()
            .filter_map(|entry| {
                let url = entry.links.first().map(|l| l.href.clone())?;
                let title = entry.title.map(|t| t.content).unwrap_or_default();
                let description = entry.summary.map(|s| s.content);
                let content = entry.content.and_then(|c| c.body);
                let published_at = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&chrono::Utc));
                let source_name = feed.title.as_ref().map(|t| t.content.clone());

                Some(normalize(
                    self.name(),
                    title,
                    description,
                    content,
                    source_name,
                    url,
                    published_at,
                    None,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for PublicFeedAdapter {
    fn name(&self) -> &str {
        "public-feed"
    }

    async fn fetch(&self, _query: Option<&str>) -> Vec<Article> {
        let mut all = Vec::new();
        for feed_url in &self.feed_urls {
            all.extend(self.fetch_one(feed_url).await);
        }
        tracing::info!(adapter = self.name(), count = all.len(), "fetch complete");
        all
    }
}
