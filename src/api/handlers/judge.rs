use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::PickRequest;
use crate::errors::AppError;
use crate::services::resolver::{resolve_pick, Resolution};
use crate::AppState;

#[derive(Serialize)]
pub struct JudgeResponse {
    success: bool,
    #[serde(flatten)]
    resolution: Resolution,
}

/// POST /api/judge: classify one expired pick.
pub async fn classify(
    State(state): State<AppState>,
    body: Result<Json<PickRequest>, JsonRejection>,
) -> Result<Json<JudgeResponse>, AppError> {
    let Json(req) = body?;
    let judge = state.judge();
    let resolution =
        resolve_pick(&state.db, judge.as_ref(), req.pick_id, &CancellationToken::new()).await?;

    Ok(Json(JudgeResponse {
        success: true,
        resolution,
    }))
}
