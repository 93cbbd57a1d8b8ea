use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::follow_up::follow_up_status;
use crate::models::{FollowUpKind, FollowUpTask};

/// Queue a follow-up for a pick. Skips the insert when an identical task is
/// already pending or running, so repeated verdict writes do not pile up work.
pub async fn enqueue(pool: &PgPool, pick_id: Uuid, kind: FollowUpKind) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO follow_up_tasks (pick_id, kind)
        SELECT $1, $2
        WHERE NOT EXISTS (
            SELECT 1 FROM follow_up_tasks
            WHERE pick_id = $1 AND kind = $2 AND status IN ($3, $4)
        )
        "#,
    )
    .bind(pick_id)
    .bind(kind.as_str())
    .bind(follow_up_status::PENDING)
    .bind(follow_up_status::RUNNING)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Claim up to `limit` due tasks, marking them running and bumping attempts.
/// `SKIP LOCKED` keeps concurrent workers from claiming the same row.
pub async fn claim_due(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: i64,
) -> anyhow::Result<Vec<FollowUpTask>> {
    let rows = sqlx::query_as::<_, FollowUpTask>(
        r#"
        UPDATE follow_up_tasks
        SET status = $1, attempts = attempts + 1, updated_at = NOW()
        WHERE id IN (
            SELECT id FROM follow_up_tasks
            WHERE status = $2 AND run_after <= $3
            ORDER BY run_after ASC
            LIMIT $4
            FOR UPDATE SKIP LOCKED
        )
        RETURNING *
        "#,
    )
    .bind(follow_up_status::RUNNING)
    .bind(follow_up_status::PENDING)
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn mark_done(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE follow_up_tasks SET status = $2, last_error = NULL, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(follow_up_status::DONE)
    .execute(pool)
    .await?;

    Ok(())
}

/// Put a task back in the queue to run again after `run_after`.
pub async fn reschedule(
    pool: &PgPool,
    id: Uuid,
    error: &str,
    run_after: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE follow_up_tasks
        SET status = $2, last_error = $3, run_after = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(follow_up_status::PENDING)
    .bind(error)
    .bind(run_after)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE follow_up_tasks SET status = $2, last_error = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(follow_up_status::FAILED)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Return tasks stuck in `running` (worker died mid-task) to the queue.
pub async fn requeue_stale(pool: &PgPool, older_than: DateTime<Utc>) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE follow_up_tasks
        SET status = $1, updated_at = NOW()
        WHERE status = $2 AND updated_at < $3
        "#,
    )
    .bind(follow_up_status::PENDING)
    .bind(follow_up_status::RUNNING)
    .bind(older_than)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Tasks for a pick, oldest first.
pub async fn get_tasks_for_pick(pool: &PgPool, pick_id: Uuid) -> anyhow::Result<Vec<FollowUpTask>> {
    let rows = sqlx::query_as::<_, FollowUpTask>(
        "SELECT * FROM follow_up_tasks WHERE pick_id = $1 ORDER BY created_at ASC",
    )
    .bind(pick_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
