use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::PickRequest;
use crate::db::pick_repo;
use crate::errors::AppError;
use crate::services::totals::{refresh_totals, TotalsSummary};
use crate::AppState;

#[derive(Serialize)]
pub struct TotalsResponse {
    success: bool,
    #[serde(flatten)]
    summary: TotalsSummary,
}

/// POST /api/totals: recompute totals for every wallet in a pick's ledger.
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<PickRequest>, JsonRejection>,
) -> Result<Json<TotalsResponse>, AppError> {
    let Json(req) = body?;
    if pick_repo::get_pick(&state.db, req.pick_id).await?.is_none() {
        return Err(AppError::NotFound(format!("pick {}", req.pick_id)));
    }

    let summary = refresh_totals(&state.db, req.pick_id).await?;
    Ok(Json(TotalsResponse {
        success: true,
        summary,
    }))
}
