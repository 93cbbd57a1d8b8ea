use std::collections::BTreeSet;

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{NewWinLossEvent, WinLossEvent};

/// Replace a pick's ledger: delete every existing row, then insert the new set.
/// Rebuilding with the same input yields the same rows.
///
/// Runs on the caller's connection so it can share a transaction. Returns the
/// wallets that had rows before and have none now.
pub async fn replace_for_pick(
    conn: &mut PgConnection,
    pick_id: Uuid,
    events: &[NewWinLossEvent],
) -> anyhow::Result<Vec<String>> {
    let previous: Vec<(String,)> =
        sqlx::query_as("DELETE FROM win_loss_events WHERE pick_id = $1 RETURNING wallet")
            .bind(pick_id)
            .fetch_all(&mut *conn)
            .await?;

    for event in events {
        sqlx::query(
            r#"
            INSERT INTO win_loss_events (pick_id, wallet, side, outcome, amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(pick_id)
        .bind(&event.wallet)
        .bind(event.side.as_str())
        .bind(event.outcome)
        .bind(event.amount)
        .execute(&mut *conn)
        .await?;
    }

    let current: BTreeSet<&str> = events.iter().map(|e| e.wallet.as_str()).collect();
    let dropped: BTreeSet<String> = previous
        .into_iter()
        .map(|(wallet,)| wallet)
        .filter(|wallet| !current.contains(wallet.as_str()))
        .collect();

    Ok(dropped.into_iter().collect())
}

/// All ledger rows for a pick, in a stable order.
pub async fn get_events_for_pick(pool: &PgPool, pick_id: Uuid) -> anyhow::Result<Vec<WinLossEvent>> {
    let rows = sqlx::query_as::<_, WinLossEvent>(
        "SELECT * FROM win_loss_events WHERE pick_id = $1 ORDER BY wallet, side",
    )
    .bind(pick_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct wallets that appear in a pick's ledger.
pub async fn get_wallets_for_pick(pool: &PgPool, pick_id: Uuid) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT wallet FROM win_loss_events WHERE pick_id = $1 ORDER BY wallet",
    )
    .bind(pick_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Every ledger row, across all picks, for the given wallets.
pub async fn get_events_for_wallets<'e, E: PgExecutor<'e>>(
    executor: E,
    wallets: &[String],
) -> anyhow::Result<Vec<WinLossEvent>> {
    if wallets.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, WinLossEvent>(
        "SELECT * FROM win_loss_events WHERE wallet = ANY($1)",
    )
    .bind(wallets)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
