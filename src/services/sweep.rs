use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::db::pick_repo;
use crate::errors::AppError;
use crate::judge::VerdictSource;
use crate::services::{claim_cycle, resolver};
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub run_id: Uuid,
    /// Picks moved from open to closed by this run.
    pub closed: usize,
    /// Closed, unresolved picks picked up for classification.
    pub scanned: usize,
    /// Picks classified successfully (including already-resolved ones).
    pub processed: usize,
    pub skipped: usize,
    /// Claim follow-ups queued from the claim cycle.
    pub claimed: usize,
}

/// One sweep with the configured xAI judge. Fails before any write when no
/// API key is set.
pub async fn run_sweep(state: &AppState, cancel: &CancellationToken) -> Result<SweepReport, AppError> {
    let judge = state
        .judge()
        .ok_or_else(|| AppError::Config("XAI_API_KEY is not set".into()))?;

    run_sweep_with(state, &judge, cancel).await
}

/// One sweep: close expired picks, classify a batch of unresolved ones
/// (soonest-expired first), and advance the claim cycle. A failure on one pick
/// never blocks the others; it is logged and the pick is revisited next sweep.
pub async fn run_sweep_with<V: VerdictSource>(
    state: &AppState,
    judge: &V,
    cancel: &CancellationToken,
) -> Result<SweepReport, AppError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("sweep", run_id = %run_id);

    async move {
        counter!("sweep_runs_total").increment(1);

        let closed = pick_repo::close_expired(&state.db, Utc::now()).await?;
        counter!("markets_closed_total").increment(closed.len() as u64);
        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "Closed expired picks");
        }

        let batch = pick_repo::get_unresolved_closed(&state.db, state.config.sweep_batch_size).await?;
        let scanned = batch.len();
        let mut processed = 0;
        let mut skipped = 0;

        for pick in &batch {
            if cancel.is_cancelled() {
                tracing::warn!("Sweep cancelled, leaving remaining picks for the next run");
                break;
            }
            match resolver::resolve_pick(&state.db, Some(judge), pick.id, cancel).await {
                Ok(resolution) => {
                    processed += 1;
                    tracing::info!(
                        pick_id = %pick.id,
                        result = %resolution.result,
                        already = resolution.already,
                        "Sweep classified pick"
                    );
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, pick_id = %pick.id, "Classification failed, skipping");
                    continue;
                }
            }
        }

        let claimed = match claim_cycle::run_claim_cycle(&state.db, state.config.claim_page_size).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Claim cycle failed");
                0
            }
        };

        tracing::info!(
            closed = closed.len(),
            scanned,
            processed,
            skipped,
            claimed,
            "Sweep finished"
        );

        Ok::<_, AppError>(SweepReport {
            run_id,
            closed: closed.len(),
            scanned,
            processed,
            skipped,
            claimed,
        })
    }
    .instrument(span)
    .await
}

/// In-process alternative to an external cron: sweep every `interval_secs`.
pub async fn run_sweep_ticker(state: AppState, interval_secs: u64, shutdown: CancellationToken) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Sweep ticker stopping");
                return;
            }
        }

        if let Err(e) = run_sweep(&state, &shutdown).await {
            tracing::error!(error = %e, "Scheduled sweep failed");
        }
    }
}
