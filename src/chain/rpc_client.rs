use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_quantity, BlockHeader, LogSource, RpcError, RpcLog};

/// Minimal JSON-RPC client over HTTP for an EVM node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: Client,
    url: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RawBlock {
    number: String,
    timestamp: String,
}

impl RpcClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = resp.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        resp.result
            .ok_or_else(|| RpcError::Malformed(format!("{method}: missing result")))
    }
}

impl LogSource for RpcClient {
    async fn latest_block(&self) -> Result<BlockHeader, RpcError> {
        let block: RawBlock = self
            .call("eth_getBlockByNumber", json!(["latest", false]))
            .await?;

        let number = parse_quantity(&block.number)
            .ok_or_else(|| RpcError::Malformed(format!("block number {}", block.number)))?;
        let timestamp = parse_quantity(&block.timestamp)
            .ok_or_else(|| RpcError::Malformed(format!("block timestamp {}", block.timestamp)))?;

        Ok(BlockHeader { number, timestamp })
    }

    async fn get_logs(
        &self,
        address: &str,
        topic0: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RpcLog>, RpcError> {
        let filter = json!({
            "address": address,
            "topics": [topic0],
            "fromBlock": format!("0x{from_block:x}"),
            "toBlock": format!("0x{to_block:x}"),
        });

        self.call("eth_getLogs", json!([filter])).await
    }
}
