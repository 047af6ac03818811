use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use newsintel_adapters::{
    AggregationMode, Aggregator, BreakingNewsAdapter, BusinessNewsAdapter, CompanyNewsAdapter,
    PublicFeedAdapter, SentimentTaggedAdapter, SourceAdapter,
};
use newsintel_common::AppConfig;
use newsintel_hub::PushHub;
use newsintel_index::{HashEmbedder, HybridRetriever, IndexStore};
use newsintel_ingest::{Chunker, IngestCoordinator, StreamingDriver};
use newsintel_verdict::{
    HeuristicDecisionAdapter, LexiconSentimentAdapter, OpenRouterDecisionAdapter,
    SubjectRouter, SubjectStateRegistry, SyntheticRiskAdapter, SyntheticTechnicalAdapter,
    TemplateReportAdapter, VerdictAssembler,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

const PUBLIC_FEEDS: &[&str] = &[
    "https://feeds.a.dj.com/rss/RSSMarketsMain.xml",
    "https://www.cnbc.com/id/10000664/device/rss/rss.html",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newsintel=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(CompanyNewsAdapter::new(config.finnhub_api_key.clone())),
        Arc::new(SentimentTaggedAdapter::new(config.alphavantage_api_key.clone())),
        Arc::new(BusinessNewsAdapter::new(config.mediastack_api_key.clone())),
        Arc::new(BreakingNewsAdapter::new(config.newsapi_api_key.clone())),
        Arc::new(PublicFeedAdapter::new(
            PUBLIC_FEEDS.iter().map(|s| s.to_string()).collect(),
        )),
    ];
    let aggregator = Arc::new(Aggregator::new(adapters, AggregationMode::Union));

    let store = Arc::new(IndexStore::new(Box::new(HashEmbedder::default())));
    let retriever = Arc::new(HybridRetriever::new(Arc::clone(&store), None, config.rrf_k));

    let chunker = Chunker::new(config.max_chunk_size);
    let hub = Arc::new(PushHub::new());
    let subject_state = Arc::new(SubjectStateRegistry::new());

    let decision_adapter: Arc<dyn newsintel_verdict::DecisionAdapter> =
        match &config.openrouter_api_key {
            Some(key) => {
                tracing::info!(model = %config.llm_model, "LLM decision adapter configured");
                Arc::new(OpenRouterDecisionAdapter::new(
                    key.clone(),
                    config.openrouter_base_url.clone(),
                    config.llm_model.clone(),
                ))
            }
            None => {
                tracing::info!("no OPENROUTER_API_KEY, decision adapter falls back to heuristic");
                Arc::new(HeuristicDecisionAdapter)
            }
        };

    let assembler = Arc::new(VerdictAssembler::new(
        Arc::clone(&retriever),
        Arc::new(LexiconSentimentAdapter),
        Arc::new(SyntheticTechnicalAdapter),
        Arc::new(SyntheticRiskAdapter),
        decision_adapter,
        Some(Arc::new(TemplateReportAdapter)),
        Arc::clone(&subject_state),
    ));

    let hub_for_router = Arc::clone(&hub);
    let assembler_for_router = Arc::clone(&assembler);
    let router = Arc::new(SubjectRouter::new(move |subject| {
        let assembler = Arc::clone(&assembler_for_router);
        let hub = Arc::clone(&hub_for_router);
        async move {
            let verdict = assembler.assemble(&subject).await;
            hub.broadcast_subject(&subject, newsintel_common::PushFrame::Verdict { data: verdict });
        }
    }));

    let state = Arc::new(AppState {
        config: config.clone(),
        retriever: Arc::clone(&retriever),
        chunker: chunker.clone(),
        assembler: Arc::clone(&assembler),
        router: Arc::clone(&router),
        hub: Arc::clone(&hub),
        subject_state: Arc::clone(&subject_state),
    });

    let (admitted_tx, admitted_rx) = tokio::sync::mpsc::channel(256);
    let (committed_tx, mut committed_rx) = tokio::sync::mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let driver = StreamingDriver::new(
        Arc::clone(&aggregator),
        Duration::from_secs(config.refresh_interval_secs),
        admitted_tx,
    );
    tokio::spawn(driver.run(shutdown_rx));

    let coordinator = IngestCoordinator::new(
        admitted_rx,
        Arc::clone(&store),
        chunker.clone(),
        committed_tx,
    );
    tokio::spawn(coordinator.run());

    let router_for_batches = Arc::clone(&router);
    let hub_for_batches = Arc::clone(&hub);
    let store_for_batches = Arc::clone(&store);
    tokio::spawn(async move {
        while let Some(batch) = committed_rx.recv().await {
            let active = hub_for_batches.active_subjects();
            router_for_batches.route(&batch.chunks, &active);
            hub_for_batches.broadcast_global(newsintel_common::PushFrame::MetricsUpdate {
                indexing_latency_ms: batch.max_latency_ms,
                total_docs: store_for_batches.size(),
            });
        }
    });

    let app = Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/api/ingest", post(routes::ingest::ingest))
        .route("/api/recommend/{subject}", get(routes::recommend::recommend))
        .route("/api/subjects/{subject}/stream", get(routes::stream::subject_stream))
        .with_state(state)
        .layer(if cfg!(debug_assertions) {
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        } else {
            let origins: Vec<HeaderValue> = std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "https://newsintel.app".to_string())
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            tower_http::cors::CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        })
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static("default-src 'none'"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    tracing::info!(addr = %config.bind_addr, "newsintel server starting");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    let _ = shutdown_tx.send(true);
    Ok(())
}
