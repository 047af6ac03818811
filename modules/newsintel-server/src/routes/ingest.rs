use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use newsintel_adapters::adapter::normalize;
use newsintel_common::PushFrame;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub source_name: Option<String>,
    pub canonical_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub article_id: String,
    pub chunks_indexed: usize,
}

/// Admits an externally supplied article through the same chunk/commit/
/// route path the streaming driver uses, bypassing the source adapters
/// and aggregator (C1/C2).
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, StatusCode> {
    let article = normalize(
        "external-ingest",
        req.title,
        req.description,
        req.content,
        req.source_name,
        req.canonical_url,
        req.published_at,
        req.image_url,
    );

    let chunks = state.chunker.chunk(&article);
    if chunks.is_empty() {
        return Ok(Json(IngestResponse {
            article_id: article.id,
            chunks_indexed: 0,
        }));
    }

    if state.retriever.store().commit(chunks.clone()).await.is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let active = state.hub.active_subjects();
    state.router.route(&chunks, &active);
    state.hub.broadcast_global(PushFrame::MetricsUpdate {
        indexing_latency_ms: 0,
        total_docs: state.retriever.store().size(),
    });

    Ok(Json(IngestResponse {
        article_id: article.id,
        chunks_indexed: chunks.len(),
    }))
}
