use anyhow::Result;

/// Process-wide configuration loaded from the environment. Missing
/// provider keys disable that adapter rather than failing startup —
/// only the server bind address is required.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Provider credentials (missing => adapter disabled)
    pub finnhub_api_key: Option<String>,
    pub alphavantage_api_key: Option<String>,
    pub mediastack_api_key: Option<String>,
    pub newsapi_api_key: Option<String>,

    // LLM verdict adapters
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub llm_model: String,

    // Pipeline tuning
    pub refresh_interval_secs: u64,
    pub max_chunk_size: usize,
    pub rrf_k: u32,
    pub rerank_enabled: bool,

    // Server
    pub bind_addr: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            finnhub_api_key: std::env::var("FINNHUB_API_KEY").ok(),
            alphavantage_api_key: std::env::var("ALPHAVANTAGE_API_KEY").ok(),
            mediastack_api_key: std::env::var("MEDIASTACK_API_KEY").ok(),
            newsapi_api_key: std::env::var("NEWS_API_KEY").ok(),
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            openrouter_base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3.5-sonnet".to_string()),
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            max_chunk_size: std::env::var("MAX_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(512),
            rrf_k: std::env::var("RRF_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            rerank_enabled: std::env::var("RERANK_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.len().min(5);
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("config loaded:");
        tracing::info!("  FINNHUB_API_KEY: {}", preview_opt(&self.finnhub_api_key));
        tracing::info!(
            "  ALPHAVANTAGE_API_KEY: {}",
            preview_opt(&self.alphavantage_api_key)
        );
        tracing::info!(
            "  MEDIASTACK_API_KEY: {}",
            preview_opt(&self.mediastack_api_key)
        );
        tracing::info!("  NEWS_API_KEY: {}", preview_opt(&self.newsapi_api_key));
        tracing::info!(
            "  OPENROUTER_API_KEY: {}",
            preview_opt(&self.openrouter_api_key)
        );
        tracing::info!(
            "  refresh_interval={}s rrf_k={} rerank_enabled={}",
            self.refresh_interval_secs,
            self.rrf_k,
            self.rerank_enabled
        );
    }
}
