use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::PickRequest;
use crate::errors::AppError;
use crate::services::ledger::{build_ledger, LedgerSummary};
use crate::services::totals::refresh_totals;
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    success: bool,
    #[serde(flatten)]
    summary: LedgerSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    users_updated: Option<usize>,
}

/// POST /api/win-loss: rebuild a pick's ledger from chain, then its totals.
pub async fn build(
    State(state): State<AppState>,
    body: Result<Json<PickRequest>, JsonRejection>,
) -> Result<Json<LedgerResponse>, AppError> {
    let Json(req) = body?;
    let rpc = state
        .rpc()
        .ok_or_else(|| AppError::Config("EVM_RPC_URL is not set".into()))?;

    let summary = build_ledger(&state.db, &rpc, state.scan_params(), req.pick_id).await?;

    // The ledger is already committed; a totals failure is recoverable via /api/totals.
    let users_updated = match refresh_totals(&state.db, req.pick_id).await {
        Ok(t) => Some(t.users_updated),
        Err(e) => {
            tracing::error!(error = %e, pick_id = %req.pick_id, "Inline totals refresh failed");
            None
        }
    };

    Ok(Json(LedgerResponse {
        success: true,
        summary,
        users_updated,
    }))
}
