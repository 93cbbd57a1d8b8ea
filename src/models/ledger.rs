use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Side;

/// A decoded `Bought(address indexed user, bool isYes, uint256 amount)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoughtEvent {
    pub wallet: String,
    pub side: Side,
    pub amount: Decimal,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
}

/// Database row for win_loss_events table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WinLossEvent {
    pub id: Uuid,
    pub pick_id: Uuid,
    pub wallet: String,
    pub side: String,
    pub outcome: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A ledger row before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWinLossEvent {
    pub wallet: String,
    pub side: Side,
    pub outcome: &'static str,
    pub amount: Decimal,
}
