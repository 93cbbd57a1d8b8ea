use std::collections::BTreeMap;

use metrics::counter;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{ledger_repo, totals_repo};
use crate::models::ledger_outcome;
use crate::models::{UserTotals, WinLossEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSummary {
    pub pick_id: Uuid,
    pub users_updated: usize,
}

/// Recompute totals from scratch for `wallets` using every event they have.
///
/// Every wallet gets a row, starting from zero, even if it has no events.
/// Events for wallets outside the list are ignored.
pub fn aggregate_totals(wallets: &[String], events: &[WinLossEvent]) -> Vec<UserTotals> {
    let mut totals: BTreeMap<&str, UserTotals> = wallets
        .iter()
        .map(|w| (w.as_str(), UserTotals::zero(w.as_str())))
        .collect();

    for event in events {
        let Some(t) = totals.get_mut(event.wallet.as_str()) else {
            continue;
        };
        match event.outcome.as_str() {
            ledger_outcome::WIN => {
                t.win_count += 1;
                t.win_amount += event.amount;
            }
            ledger_outcome::LOSS => {
                t.loss_count += 1;
                t.loss_amount += event.amount;
            }
            other => {
                tracing::warn!(outcome = other, wallet = %event.wallet, "Ignoring unknown ledger outcome");
            }
        }
    }

    totals.into_values().collect()
}

/// Refresh rolling totals for every wallet in a pick's ledger.
pub async fn refresh_totals(pool: &PgPool, pick_id: Uuid) -> anyhow::Result<TotalsSummary> {
    let wallets = ledger_repo::get_wallets_for_pick(pool, pick_id).await?;
    let events = ledger_repo::get_events_for_wallets(pool, &wallets).await?;
    let totals = aggregate_totals(&wallets, &events);

    let mut tx = pool.begin().await?;
    totals_repo::upsert_totals(&mut tx, &totals).await?;
    tx.commit().await?;
    counter!("totals_users_updated_total").increment(totals.len() as u64);

    tracing::info!(
        pick_id = %pick_id,
        users = totals.len(),
        events = events.len(),
        "User totals recomputed"
    );

    Ok(TotalsSummary {
        pick_id,
        users_updated: totals.len(),
    })
}
