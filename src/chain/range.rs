//! Block-range heuristics for locating a market's logs.
//!
//! There is no stored index of which blocks hold a market's trades, so the
//! scan projects a block number from a timestamp using a fixed average block
//! time and then walks outward from it. If the chain's real block time drifts
//! from the configured constant, events near the window edges can be missed.

use super::BlockHeader;

/// Inclusive block range for a single `eth_getLogs` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    pub fn block_count(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Estimate the block produced at `target_ts`.
///
/// Targets in the future clamp to the latest block; targets older than the
/// chain clamp to genesis.
pub fn estimate_block(latest: BlockHeader, target_ts: u64, block_time_secs: u64) -> u64 {
    if target_ts >= latest.timestamp {
        return latest.number;
    }
    let blocks_back = (latest.timestamp - target_ts) / block_time_secs.max(1);
    latest.number.saturating_sub(blocks_back)
}

/// The full window `[center - window, min(center + window, latest)]`.
pub fn scan_window(center: u64, window: u64, latest: u64) -> BlockRange {
    let center = center.min(latest);
    BlockRange {
        from: center.saturating_sub(window),
        to: center.saturating_add(window).min(latest),
    }
}

/// Split the scan window into chunks, alternating outward from `center`:
/// first the chunk starting at `center`, then the chunk just below it, and
/// so on until both directions are exhausted or genesis is reached.
pub fn outward_chunks(center: u64, window: u64, chunk: u64, latest: u64) -> Vec<BlockRange> {
    let chunk = chunk.max(1);
    let bounds = scan_window(center, window, latest);
    let center = center.min(latest);

    let mut forward = Vec::new();
    let mut start = center;
    while start <= bounds.to {
        let end = start.saturating_add(chunk - 1).min(bounds.to);
        forward.push(BlockRange { from: start, to: end });
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }

    let mut backward = Vec::new();
    if center > bounds.from {
        let mut end = center - 1;
        loop {
            let from = end.saturating_sub(chunk - 1).max(bounds.from);
            backward.push(BlockRange { from, to: end });
            if from == bounds.from {
                break;
            }
            end = from - 1;
        }
    }

    let mut chunks = Vec::with_capacity(forward.len() + backward.len());
    let mut fwd = forward.into_iter();
    let mut bwd = backward.into_iter();
    loop {
        match (fwd.next(), bwd.next()) {
            (None, None) => break,
            (f, b) => {
                chunks.extend(f);
                chunks.extend(b);
            }
        }
    }
    chunks
}
