use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Work dispatched after a verdict is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    /// Tell the settlement backend to resolve the market on-chain.
    Settle,
    /// Rebuild the win/loss ledger from chain logs.
    BuildLedger,
    /// Recompute user totals for wallets in the pick's ledger.
    RefreshTotals,
    /// Ask the settlement backend to process payouts.
    Claim,
}

impl FollowUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpKind::Settle => "settle",
            FollowUpKind::BuildLedger => "build_ledger",
            FollowUpKind::RefreshTotals => "refresh_totals",
            FollowUpKind::Claim => "claim",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "settle" => Some(FollowUpKind::Settle),
            "build_ledger" => Some(FollowUpKind::BuildLedger),
            "refresh_totals" => Some(FollowUpKind::RefreshTotals),
            "claim" => Some(FollowUpKind::Claim),
            _ => None,
        }
    }
}

impl fmt::Display for FollowUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for follow_up_tasks table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowUpTask {
    pub id: Uuid,
    pub pick_id: Uuid,
    pub kind: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub run_after: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Follow-up status constants.
pub mod follow_up_status {
    pub const PENDING: &str = "pending";
    pub const RUNNING: &str = "running";
    pub const DONE: &str = "done";
    pub const FAILED: &str = "failed";
}
