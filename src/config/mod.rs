use std::env;
use std::str::FromStr;

const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_XAI_MODEL: &str = "grok-4";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,

    // LLM judge (optional at startup, required when classifying)
    pub xai_api_key: Option<String>,
    pub xai_base_url: String,
    pub xai_model: String,
    pub judge_timeout_secs: u64,

    // Chain
    pub evm_rpc_url: Option<String>,
    pub chain_id: i64,
    pub token_decimals: u32,
    pub block_time_secs: u64,
    pub scan_window_blocks: u64,
    pub log_chunk_blocks: u64,

    // Settlement backend (unset → dry run)
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub backend_max_retry_secs: u64,

    // Sweep
    pub sweep_batch_size: i64,
    pub claim_page_size: i64,
    pub sweep_interval_secs: u64,

    // Follow-up worker
    pub followup_poll_secs: u64,
    pub followup_max_attempts: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: non_empty("API_TOKEN"),

            xai_api_key: non_empty("XAI_API_KEY"),
            xai_base_url: env::var("XAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_XAI_BASE_URL.into()),
            xai_model: env::var("XAI_MODEL").unwrap_or_else(|_| DEFAULT_XAI_MODEL.into()),
            judge_timeout_secs: parse_or("JUDGE_TIMEOUT_SECS", 60),

            evm_rpc_url: non_empty("EVM_RPC_URL"),
            chain_id: parse_or("CHAIN_ID", 56),
            token_decimals: parse_or("TOKEN_DECIMALS", 18),
            block_time_secs: parse_or("BLOCK_TIME_SECS", 3).max(1),
            scan_window_blocks: parse_or("SCAN_WINDOW_BLOCKS", 25_000),
            log_chunk_blocks: parse_or("LOG_CHUNK_BLOCKS", 128).max(1),

            backend_url: non_empty("BACKEND_URL"),
            backend_api_key: non_empty("BACKEND_API_KEY"),
            backend_max_retry_secs: parse_or("BACKEND_MAX_RETRY_SECS", 30),

            sweep_batch_size: parse_or("SWEEP_BATCH_SIZE", 10),
            claim_page_size: parse_or("CLAIM_PAGE_SIZE", 20),
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 0),

            followup_poll_secs: parse_or("FOLLOWUP_POLL_SECS", 5).max(1),
            followup_max_attempts: parse_or("FOLLOWUP_MAX_ATTEMPTS", 8),
        })
    }

    /// Config for tests and local tooling: every optional integration off.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            api_token: None,
            xai_api_key: None,
            xai_base_url: DEFAULT_XAI_BASE_URL.into(),
            xai_model: DEFAULT_XAI_MODEL.into(),
            judge_timeout_secs: 60,
            evm_rpc_url: None,
            chain_id: 56,
            token_decimals: 18,
            block_time_secs: 3,
            scan_window_blocks: 25_000,
            log_chunk_blocks: 128,
            backend_url: None,
            backend_api_key: None,
            backend_max_retry_secs: 30,
            sweep_batch_size: 10,
            claim_page_size: 20,
            sweep_interval_secs: 0,
            followup_poll_secs: 5,
            followup_max_attempts: 8,
        }
    }

    /// Returns true if the settlement backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend_url.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
