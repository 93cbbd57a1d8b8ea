use chrono::{Duration as ChronoDuration, Utc};
use metrics::counter;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{follow_up_repo, pick_repo};
use crate::models::pick_status;
use crate::models::{FollowUpKind, FollowUpTask};
use crate::services::{ledger, totals};
use crate::AppState;

const BATCH_SIZE: i64 = 10;
const STALE_RUNNING_MINS: i64 = 10;
const BASE_RETRY_SECS: i64 = 30;
const MAX_RETRY_SECS: i64 = 30 * 60;

/// Poll the outbox and execute due follow-ups until shutdown.
///
/// Delivery is at-least-once: a task is only marked done after its handler
/// succeeds, so every handler must be safe to run twice.
pub async fn run_follow_up_worker(state: AppState, shutdown: CancellationToken) {
    let mut ticker = interval(Duration::from_secs(state.config.followup_poll_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Follow-up worker stopping");
                return;
            }
        }

        match process_due(&state).await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(count = n, "Processed follow-ups"),
            Err(e) => tracing::error!(error = %e, "Follow-up poll failed"),
        }
    }
}

/// Claim and run every due task once. Returns how many were attempted.
pub async fn process_due(state: &AppState) -> anyhow::Result<usize> {
    let now = Utc::now();
    let requeued =
        follow_up_repo::requeue_stale(&state.db, now - ChronoDuration::minutes(STALE_RUNNING_MINS))
            .await?;
    if requeued > 0 {
        tracing::warn!(count = requeued, "Requeued stale follow-ups");
    }

    let tasks = follow_up_repo::claim_due(&state.db, now, BATCH_SIZE).await?;
    for task in &tasks {
        match execute(state, task).await {
            Ok(()) => {
                follow_up_repo::mark_done(&state.db, task.id).await?;
                counter!("followups_completed_total").increment(1);
                tracing::info!(task_id = %task.id, pick_id = %task.pick_id, kind = %task.kind, "Follow-up done");
            }
            Err(e) => {
                let error = format!("{e:#}");
                if task.attempts >= state.config.followup_max_attempts {
                    follow_up_repo::mark_failed(&state.db, task.id, &error).await?;
                    counter!("followups_failed_total").increment(1);
                    tracing::error!(
                        task_id = %task.id,
                        pick_id = %task.pick_id,
                        kind = %task.kind,
                        attempts = task.attempts,
                        error = %error,
                        "Follow-up failed permanently, operator action needed"
                    );
                } else {
                    let run_after = Utc::now() + retry_delay(task.attempts);
                    follow_up_repo::reschedule(&state.db, task.id, &error, run_after).await?;
                    tracing::warn!(
                        task_id = %task.id,
                        pick_id = %task.pick_id,
                        kind = %task.kind,
                        attempts = task.attempts,
                        error = %error,
                        "Follow-up failed, rescheduled"
                    );
                }
            }
        }
    }

    Ok(tasks.len())
}

async fn execute(state: &AppState, task: &FollowUpTask) -> anyhow::Result<()> {
    let kind = FollowUpKind::from_db_str(&task.kind)
        .ok_or_else(|| anyhow::anyhow!("unknown follow-up kind {}", task.kind))?;

    match kind {
        FollowUpKind::Settle => settle(state, task.pick_id).await,
        FollowUpKind::BuildLedger => {
            let rpc = state
                .rpc()
                .ok_or_else(|| anyhow::anyhow!("EVM_RPC_URL is not set"))?;
            ledger::build_ledger(&state.db, &rpc, state.scan_params(), task.pick_id).await?;
            follow_up_repo::enqueue(&state.db, task.pick_id, FollowUpKind::RefreshTotals).await?;
            Ok(())
        }
        FollowUpKind::RefreshTotals => {
            totals::refresh_totals(&state.db, task.pick_id).await?;
            Ok(())
        }
        FollowUpKind::Claim => claim(state, task.pick_id).await,
    }
}

/// Resolve the market on-chain through the backend, then mark it claiming.
async fn settle(state: &AppState, pick_id: Uuid) -> anyhow::Result<()> {
    let pick = pick_repo::get_pick(&state.db, pick_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("pick {pick_id} not found"))?;
    let outcome = pick
        .outcome()
        .ok_or_else(|| anyhow::anyhow!("pick {pick_id} is not resolved"))?;
    let address = pick
        .contract()
        .ok_or_else(|| anyhow::anyhow!("pick {pick_id} has no market contract"))?;

    let Some(backend) = state.backend() else {
        tracing::info!(pick_id = %pick_id, result = %outcome, "DRY RUN: would resolve market on-chain");
        return Ok(());
    };

    let chain_id = pick.chain_id.unwrap_or(state.config.chain_id);
    backend.resolve_market(address, chain_id, outcome).await?;

    let moved = pick_repo::transition_status(&state.db, pick_id, pick_status::CLOSED, pick_status::CLAIMING).await?
        || pick_repo::transition_status(&state.db, pick_id, pick_status::OPEN, pick_status::CLAIMING).await?;

    tracing::info!(pick_id = %pick_id, result = %outcome, moved, "Market resolved on-chain");
    Ok(())
}

/// Ask the backend to pay out; mark settled once it reports completion.
async fn claim(state: &AppState, pick_id: Uuid) -> anyhow::Result<()> {
    let pick = pick_repo::get_pick(&state.db, pick_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("pick {pick_id} not found"))?;
    let address = pick
        .contract()
        .ok_or_else(|| anyhow::anyhow!("pick {pick_id} has no market contract"))?;

    let Some(backend) = state.backend() else {
        tracing::info!(pick_id = %pick_id, "DRY RUN: would process claims");
        return Ok(());
    };

    let chain_id = pick.chain_id.unwrap_or(state.config.chain_id);
    let resp = backend.claim(address, chain_id).await?;

    if resp.settled {
        pick_repo::transition_status(&state.db, pick_id, pick_status::CLAIMING, pick_status::SETTLED)
            .await?;
    }

    tracing::info!(
        pick_id = %pick_id,
        settled = resp.settled,
        claimed = resp.claimed.unwrap_or(0),
        "Claim cycle visited market"
    );
    Ok(())
}

/// Delay before retry number `attempts + 1`: 30s doubling, capped at 30 min.
fn retry_delay(attempts: i32) -> ChronoDuration {
    let exp = u32::try_from(attempts.saturating_sub(1)).unwrap_or(0).min(16);
    let secs = BASE_RETRY_SECS.saturating_mul(1i64 << exp).min(MAX_RETRY_SECS);
    ChronoDuration::seconds(secs)
}
