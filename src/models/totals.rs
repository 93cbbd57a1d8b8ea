use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for user_totals table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserTotals {
    pub wallet: String,
    pub win_count: i64,
    pub loss_count: i64,
    pub win_amount: Decimal,
    pub loss_amount: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserTotals {
    pub fn zero(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            win_count: 0,
            loss_count: 0,
            win_amount: Decimal::ZERO,
            loss_amount: Decimal::ZERO,
            updated_at: None,
        }
    }
}
