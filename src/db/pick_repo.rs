use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::pick_status;
use crate::models::{Outcome, Pick};

/// Get a single pick by id.
pub async fn get_pick(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Pick>> {
    let row = sqlx::query_as::<_, Pick>("SELECT * FROM picks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Transition every open pick whose deadline has passed to `closed`.
///
/// The `status = 'open'` guard makes overlapping sweeps safe: a pick is
/// only ever moved once. Returns the ids that were closed by this call.
pub async fn close_expired(pool: &PgPool, now: DateTime<Utc>) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE picks
        SET status = $1, updated_at = NOW()
        WHERE status = $2 AND expires_at <= $3
        RETURNING id
        "#,
    )
    .bind(pick_status::CLOSED)
    .bind(pick_status::OPEN)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Closed picks without a result, soonest-expired first.
pub async fn get_unresolved_closed(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<Pick>> {
    let rows = sqlx::query_as::<_, Pick>(
        r#"
        SELECT * FROM picks
        WHERE status = $1 AND result IS NULL
        ORDER BY expires_at ASC
        LIMIT $2
        "#,
    )
    .bind(pick_status::CLOSED)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Write a verdict only if no result is stored yet.
///
/// Returns the updated row, or `None` if another invocation already
/// resolved the pick.
pub async fn set_result_if_unset(
    pool: &PgPool,
    id: Uuid,
    outcome: Outcome,
    confidence: Decimal,
    reason: &str,
) -> anyhow::Result<Option<Pick>> {
    let row = sqlx::query_as::<_, Pick>(
        r#"
        UPDATE picks
        SET result = $2, confidence = $3, reason = $4, resolved_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND result IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(outcome.as_str())
    .bind(confidence)
    .bind(reason)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Conditionally move a pick between lifecycle states.
/// Returns true if the pick was in `from` and is now in `to`.
pub async fn transition_status(
    pool: &PgPool,
    id: Uuid,
    from: &str,
    to: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE picks
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        "#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Count picks awaiting payout processing.
pub async fn count_claiming(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM picks WHERE status = $1")
        .bind(pick_status::CLAIMING)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// A stable page of picks awaiting payout processing.
pub async fn get_claiming_page(
    pool: &PgPool,
    offset: i64,
    limit: i64,
) -> anyhow::Result<Vec<Pick>> {
    let rows = sqlx::query_as::<_, Pick>(
        r#"
        SELECT * FROM picks
        WHERE status = $1
        ORDER BY expires_at ASC, id ASC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(pick_status::CLAIMING)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
