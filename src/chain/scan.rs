use super::bought::{bought_topic, decode_bought};
use super::range::{estimate_block, outward_chunks, scan_window, BlockRange};
use super::{LogSource, RpcError};
use crate::models::BoughtEvent;

/// Tuning for a Bought-log scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    pub block_time_secs: u64,
    pub window_blocks: u64,
    pub chunk_blocks: u64,
    pub token_decimals: u32,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub events: Vec<BoughtEvent>,
    /// Logs returned by the node, including ones that failed to decode.
    pub raw_logs: usize,
    pub skipped: usize,
    pub window: BlockRange,
    pub rpc_calls: usize,
}

/// Collect every decodable `Bought` log for `market_address` in the window
/// around the block estimated for `target_ts`.
///
/// Chunks are fetched sequentially. A log that fails to decode is skipped;
/// an RPC failure aborts the scan.
pub async fn scan_bought_logs<S: LogSource>(
    source: &S,
    market_address: &str,
    target_ts: u64,
    params: ScanParams,
) -> Result<ScanResult, RpcError> {
    let latest = source.latest_block().await?;
    let center = estimate_block(latest, target_ts, params.block_time_secs);
    let window = scan_window(center, params.window_blocks, latest.number);
    let chunks = outward_chunks(center, params.window_blocks, params.chunk_blocks, latest.number);

    tracing::debug!(
        market = %market_address,
        latest = latest.number,
        center,
        from = window.from,
        to = window.to,
        chunks = chunks.len(),
        "Scanning Bought logs"
    );

    let topic = bought_topic();
    let mut events = Vec::new();
    let mut raw_logs = 0usize;
    let mut skipped = 0usize;

    for range in &chunks {
        let logs = source
            .get_logs(market_address, topic, range.from, range.to)
            .await?;
        raw_logs += logs.len();

        for log in &logs {
            match decode_bought(log, params.token_decimals) {
                Ok(event) => events.push(event),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        error = %e,
                        tx = log.transaction_hash.as_deref().unwrap_or("?"),
                        "Skipping undecodable Bought log"
                    );
                }
            }
        }
    }

    Ok(ScanResult {
        events,
        raw_logs,
        skipped,
        window,
        rpc_calls: chunks.len(),
    })
}
