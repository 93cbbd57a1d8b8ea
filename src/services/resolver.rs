use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{follow_up_repo, pick_repo};
use crate::errors::AppError;
use crate::judge::{build_prompt, parse_verdict, VerdictSource};
use crate::models::{FollowUpKind, Outcome, Pick};

/// Result of a classification request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub pick_id: Uuid,
    pub result: Outcome,
    /// True when the pick was already resolved and nothing was written.
    pub already: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Resolution {
    fn already(pick: &Pick, result: Outcome) -> Self {
        Self {
            pick_id: pick.id,
            result,
            already: true,
            confidence: pick.confidence,
            reason: pick.reason.clone(),
        }
    }
}

/// Classify a pick's outcome with the judge and store it, at most once.
///
/// An already-resolved pick returns its stored result without consulting the
/// judge, so `judge` may be `None` (unconfigured) for such picks. On a fresh
/// write, settlement and ledger follow-ups are queued; queueing failures are
/// logged and do not fail the classification.
pub async fn resolve_pick<V: VerdictSource>(
    pool: &PgPool,
    judge: Option<&V>,
    pick_id: Uuid,
    cancel: &CancellationToken,
) -> Result<Resolution, AppError> {
    let pick = pick_repo::get_pick(pool, pick_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pick {pick_id}")))?;

    if let Some(outcome) = pick.outcome() {
        tracing::debug!(pick_id = %pick_id, result = %outcome, "Pick already resolved");
        return Ok(Resolution::already(&pick, outcome));
    }

    if !pick.is_expired(Utc::now()) {
        return Err(AppError::BadRequest(format!(
            "pick {pick_id} does not expire until {}",
            pick.expires_at
        )));
    }

    let judge = judge.ok_or_else(|| AppError::Config("XAI_API_KEY is not set".into()))?;

    let prompt = build_prompt(&pick);
    let started = Instant::now();
    let raw = judge.ask(&prompt, cancel).await;
    histogram!("judge_latency_seconds").record(started.elapsed().as_secs_f64());
    let raw = raw?;

    let verdict = match parse_verdict(&raw) {
        Ok(v) => v,
        Err(e) => {
            counter!("verdict_parse_failures_total").increment(1);
            return Err(e.into());
        }
    };
    let outcome = Outcome::from(verdict.result);

    let Some(stored) =
        pick_repo::set_result_if_unset(pool, pick_id, outcome, verdict.confidence, &verdict.reason)
            .await?
    else {
        // Another invocation resolved it between our read and write.
        let current = pick_repo::get_pick(pool, pick_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pick {pick_id}")))?;
        let result = current.outcome().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("pick {pick_id} lost its result"))
        })?;
        return Ok(Resolution::already(&current, result));
    };

    counter!("verdicts_total", "result" => outcome.as_str()).increment(1);
    tracing::info!(
        pick_id = %pick_id,
        result = %outcome,
        confidence = %verdict.confidence,
        "Pick resolved"
    );

    queue_follow_ups(pool, &stored).await;

    Ok(Resolution {
        pick_id,
        result: outcome,
        already: false,
        confidence: Some(verdict.confidence),
        reason: Some(verdict.reason),
    })
}

/// Queue settlement and ledger work for a freshly resolved pick.
async fn queue_follow_ups(pool: &PgPool, pick: &Pick) {
    if pick.contract().is_none() {
        tracing::warn!(pick_id = %pick.id, "Resolved pick has no market contract, nothing to settle");
        return;
    }

    for kind in [FollowUpKind::Settle, FollowUpKind::BuildLedger] {
        if let Err(e) = follow_up_repo::enqueue(pool, pick.id, kind).await {
            tracing::error!(error = %e, pick_id = %pick.id, kind = %kind, "Failed to queue follow-up");
        }
    }
}
