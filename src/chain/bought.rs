use alloy::primitives::{hex, keccak256};
use rust_decimal::Decimal;
use std::sync::OnceLock;
use thiserror::Error;

use super::{parse_quantity, RpcLog};
use crate::models::{BoughtEvent, Side};

/// Solidity signature of the market contract's stake event.
pub const BOUGHT_SIGNATURE: &str = "Bought(address,bool,uint256)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected topic count {0}")]
    Topics(usize),

    #[error("topic0 is not Bought")]
    Signature,

    #[error("data too short: {0} hex chars")]
    DataLength(usize),

    #[error("invalid hex in {0}")]
    Hex(&'static str),

    #[error("side flag is neither 0 nor 1")]
    SideFlag,

    #[error("amount does not fit")]
    Amount,
}

/// `topic0` for `Bought`, as a 0x-prefixed lowercase hex string.
pub fn bought_topic() -> &'static str {
    static TOPIC: OnceLock<String> = OnceLock::new();
    TOPIC.get_or_init(|| hex::encode_prefixed(keccak256(BOUGHT_SIGNATURE.as_bytes())))
}

/// Decode a `Bought(address indexed user, bool isYes, uint256 amount)` log.
///
/// The wallet comes from topic1; `data` holds two 32-byte words: the side
/// flag and the staked amount in base units, scaled down by `decimals`.
pub fn decode_bought(log: &RpcLog, decimals: u32) -> Result<BoughtEvent, DecodeError> {
    if log.topics.len() != 2 {
        return Err(DecodeError::Topics(log.topics.len()));
    }
    if !log.topics[0].eq_ignore_ascii_case(bought_topic()) {
        return Err(DecodeError::Signature);
    }

    let wallet = extract_address(&log.topics[1]).ok_or(DecodeError::Hex("topic1"))?;

    let data = log.data.strip_prefix("0x").unwrap_or(&log.data);
    if data.len() < 128 {
        // 2 * 64 hex chars
        return Err(DecodeError::DataLength(data.len()));
    }

    let side = match parse_word_u128(&data[0..64]).ok_or(DecodeError::Hex("side"))? {
        1 => Side::Yes,
        0 => Side::No,
        _ => return Err(DecodeError::SideFlag),
    };

    let raw_amount = parse_word_u128(&data[64..128]).ok_or(DecodeError::Amount)?;
    let amount = scale_amount(raw_amount, decimals).ok_or(DecodeError::Amount)?;

    Ok(BoughtEvent {
        wallet,
        side,
        amount,
        tx_hash: log.transaction_hash.clone(),
        block_number: log.block_number.as_deref().and_then(parse_quantity),
    })
}

/// Extract a 20-byte address from a 32-byte zero-padded hex topic, lowercased.
fn extract_address(topic: &str) -> Option<String> {
    let hex = topic.strip_prefix("0x").unwrap_or(topic);
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    // Take last 40 hex chars (20 bytes)
    let addr = &hex[hex.len() - 40..];
    Some(format!("0x{addr}").to_lowercase())
}

/// Parse a 64-char hex word that must fit in a u128.
fn parse_word_u128(word: &str) -> Option<u128> {
    if !word.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits = word.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > 32 {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

/// Convert base units to a token amount with `decimals` places.
fn scale_amount(raw: u128, decimals: u32) -> Option<Decimal> {
    let raw = i128::try_from(raw).ok()?;
    let mut amount = Decimal::try_from_i128_with_scale(raw, decimals).ok()?;
    amount.normalize_assign();
    Some(amount)
}
