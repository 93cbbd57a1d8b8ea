pub mod follow_up;
pub mod ledger;
pub mod pick;
pub mod totals;

pub use follow_up::{FollowUpKind, FollowUpTask};
pub use ledger::{BoughtEvent, NewWinLossEvent, WinLossEvent};
pub use pick::Pick;
pub use totals::UserTotals;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side: which side of a binary market a stake or verdict is on
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    /// Exact match only: "yes" or "no".
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Side::Yes),
            "no" => Some(Side::No),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome: the resolved result of a pick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
    Void,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
            Outcome::Void => "void",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Outcome::Yes),
            "no" => Some(Outcome::No),
            "void" => Some(Outcome::Void),
            _ => None,
        }
    }

    /// The side that wins under this outcome; `None` for a voided market.
    pub fn winning_side(&self) -> Option<Side> {
        match self {
            Outcome::Yes => Some(Side::Yes),
            Outcome::No => Some(Side::No),
            Outcome::Void => None,
        }
    }
}

impl From<Side> for Outcome {
    fn from(side: Side) -> Self {
        match side {
            Side::Yes => Outcome::Yes,
            Side::No => Outcome::No,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick lifecycle status constants.
pub mod pick_status {
    pub const OPEN: &str = "open";
    pub const CLOSED: &str = "closed";
    pub const CLAIMING: &str = "claiming";
    pub const SETTLED: &str = "settled";
}

/// Ledger outcome constants.
pub mod ledger_outcome {
    pub const WIN: &str = "win";
    pub const LOSS: &str = "loss";
}
