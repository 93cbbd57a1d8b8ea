pub mod api;
pub mod backend;
pub mod chain;
pub mod config;
pub mod db;
pub mod errors;
pub mod judge;
pub mod metrics;
pub mod models;
pub mod services;

use std::time::Duration;

use crate::backend::SettlementBackend;
use crate::chain::{RpcClient, ScanParams};
use crate::config::AppConfig;
use crate::judge::XaiClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    /// The classifier, if an xAI key is configured.
    pub fn judge(&self) -> Option<XaiClient> {
        let key = self.config.xai_api_key.as_deref()?;
        Some(XaiClient::new(
            self.http.clone(),
            &self.config.xai_base_url,
            key,
            &self.config.xai_model,
            Duration::from_secs(self.config.judge_timeout_secs),
        ))
    }

    pub fn rpc(&self) -> Option<RpcClient> {
        let url = self.config.evm_rpc_url.as_deref()?;
        Some(RpcClient::new(self.http.clone(), url))
    }

    /// Settlement backend; `None` means follow-ups run in dry-run mode.
    pub fn backend(&self) -> Option<SettlementBackend> {
        SettlementBackend::from_config(self.http.clone(), &self.config)
    }

    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            block_time_secs: self.config.block_time_secs,
            window_blocks: self.config.scan_window_blocks,
            chunk_blocks: self.config.log_chunk_blocks,
            token_decimals: self.config.token_decimals,
        }
    }
}
