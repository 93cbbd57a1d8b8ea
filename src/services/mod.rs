pub mod claim_cycle;
pub mod follow_up;
pub mod ledger;
pub mod resolver;
pub mod sweep;
pub mod totals;
