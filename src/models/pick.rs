use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Outcome;

/// Database row for picks table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pick {
    pub id: Uuid,
    pub name: String,
    pub line: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub result: Option<String>,
    pub confidence: Option<Decimal>,
    pub reason: Option<String>,
    pub market_address: Option<String>,
    pub chain_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Pick {
    /// Parsed outcome, if the pick has been resolved.
    pub fn outcome(&self) -> Option<Outcome> {
        self.result.as_deref().and_then(Outcome::from_db_str)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Market contract address, if it was deployed.
    pub fn contract(&self) -> Option<&str> {
        self.market_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}
