use std::collections::BTreeMap;

use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::chain::{scan_bought_logs, LogSource, RpcError, ScanParams};
use crate::db::{ledger_repo, pick_repo, totals_repo};
use crate::errors::AppError;
use crate::models::ledger_outcome;
use crate::models::{BoughtEvent, NewWinLossEvent, Pick, Side};
use crate::services::totals::aggregate_totals;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node returned nothing for the whole window; the logs may not be
    /// indexed yet. Distinct from "nobody traded".
    #[error("no Bought logs found in blocks {from_block}..={to_block}, retry later")]
    NotFoundYet { from_block: u64, to_block: u64 },

    #[error("pick {0} has no yes/no result")]
    Unresolved(Uuid),

    #[error("pick {0} has no market contract")]
    NoMarketAddress(Uuid),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Per-wallet stake totals for each side of a market.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Positions {
    pub yes: BTreeMap<String, Decimal>,
    pub no: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub pick_id: Uuid,
    pub winners: usize,
    pub losers: usize,
}

/// Sum stakes per wallet per side. A wallet's position is the sum of all of
/// its Bought amounts on that side, however many transactions it took.
pub fn aggregate_positions(events: &[BoughtEvent]) -> Positions {
    let mut positions = Positions::default();
    for event in events {
        let book = match event.side {
            Side::Yes => &mut positions.yes,
            Side::No => &mut positions.no,
        };
        *book.entry(event.wallet.to_lowercase()).or_insert(Decimal::ZERO) += event.amount;
    }
    positions
}

/// Ledger rows for a resolved market: the winning side's wallets win, the
/// other side's lose.
pub fn ledger_rows(positions: &Positions, winning: Side) -> Vec<NewWinLossEvent> {
    let outcome_for = |side: Side| {
        if side == winning {
            ledger_outcome::WIN
        } else {
            ledger_outcome::LOSS
        }
    };

    let yes = positions.yes.iter().map(|(w, a)| (Side::Yes, w, a));
    let no = positions.no.iter().map(|(w, a)| (Side::No, w, a));

    yes.chain(no)
        .map(|(side, wallet, amount)| NewWinLossEvent {
            wallet: wallet.clone(),
            side,
            outcome: outcome_for(side),
            amount: *amount,
        })
        .collect()
}

/// Scan the chain for a pick's Bought logs and derive its ledger rows.
pub async fn compute_ledger<S: LogSource>(
    source: &S,
    pick: &Pick,
    params: ScanParams,
) -> Result<(Positions, Vec<NewWinLossEvent>), LedgerError> {
    let winning = pick
        .outcome()
        .and_then(|o| o.winning_side())
        .ok_or(LedgerError::Unresolved(pick.id))?;
    let address = pick.contract().ok_or(LedgerError::NoMarketAddress(pick.id))?;

    let target_ts = u64::try_from(pick.expires_at.timestamp()).unwrap_or(0);
    let scan = scan_bought_logs(source, address, target_ts, params).await?;

    tracing::info!(
        pick_id = %pick.id,
        market = %address,
        raw_logs = scan.raw_logs,
        decoded = scan.events.len(),
        skipped = scan.skipped,
        rpc_calls = scan.rpc_calls,
        "Bought log scan finished"
    );

    if scan.events.is_empty() {
        counter!("ledger_logs_not_found_total").increment(1);
        return Err(LedgerError::NotFoundYet {
            from_block: scan.window.from,
            to_block: scan.window.to,
        });
    }

    let positions = aggregate_positions(&scan.events);
    let rows = ledger_rows(&positions, winning);
    Ok((positions, rows))
}

/// Write a pick's ledger rows, replacing the old ones.
///
/// Wallets that drop out of the ledger get their totals recomputed in the
/// same transaction; a later refresh only visits wallets still in it.
pub async fn store_ledger(
    pool: &PgPool,
    pick_id: Uuid,
    rows: &[NewWinLossEvent],
) -> anyhow::Result<Vec<String>> {
    let mut tx = pool.begin().await?;

    let dropped = ledger_repo::replace_for_pick(&mut tx, pick_id, rows).await?;
    if !dropped.is_empty() {
        let events = ledger_repo::get_events_for_wallets(&mut *tx, &dropped).await?;
        totals_repo::upsert_totals(&mut tx, &aggregate_totals(&dropped, &events)).await?;
        tracing::info!(
            pick_id = %pick_id,
            wallets = dropped.len(),
            "Recomputed totals for wallets dropped from ledger"
        );
    }

    tx.commit().await?;

    Ok(dropped)
}

/// Rebuild a pick's win/loss ledger from chain logs (full replace).
pub async fn build_ledger<S: LogSource>(
    pool: &PgPool,
    source: &S,
    params: ScanParams,
    pick_id: Uuid,
) -> Result<LedgerSummary, AppError> {
    let pick = pick_repo::get_pick(pool, pick_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pick {pick_id}")))?;

    let (positions, rows) = compute_ledger(source, &pick, params).await?;

    let dropped = store_ledger(pool, pick_id, &rows).await?;
    counter!("ledger_builds_total").increment(1);

    let (winners, losers) = match pick.outcome().and_then(|o| o.winning_side()) {
        Some(Side::Yes) => (positions.yes.len(), positions.no.len()),
        _ => (positions.no.len(), positions.yes.len()),
    };

    tracing::info!(
        pick_id = %pick_id,
        winners,
        losers,
        rows = rows.len(),
        dropped = dropped.len(),
        "Win/loss ledger rebuilt"
    );

    Ok(LedgerSummary {
        pick_id,
        winners,
        losers,
    })
}
