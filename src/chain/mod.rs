pub mod bought;
pub mod range;
pub mod rpc_client;
pub mod scan;

pub use rpc_client::RpcClient;
pub use scan::{scan_bought_logs, ScanParams, ScanResult};

use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed RPC response: {0}")]
    Malformed(String),
}

/// Number and timestamp of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
}

/// Raw log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
}

/// Read access to an EVM chain's blocks and logs.
pub trait LogSource {
    fn latest_block(&self) -> impl Future<Output = Result<BlockHeader, RpcError>> + Send;

    /// Logs emitted by `address` with `topic0`, in the inclusive block range.
    fn get_logs(
        &self,
        address: &str,
        topic0: &str,
        from_block: u64,
        to_block: u64,
    ) -> impl Future<Output = Result<Vec<RpcLog>, RpcError>> + Send;
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(hex: &str) -> Option<u64> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
