use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::AppError;
use crate::services::sweep::{run_sweep, SweepReport};
use crate::AppState;

#[derive(Serialize)]
pub struct SweepResponse {
    success: bool,
    #[serde(flatten)]
    report: SweepReport,
}

/// POST /api/sweep: close expired picks, classify a batch, advance claims.
pub async fn run(State(state): State<AppState>) -> Result<Json<SweepResponse>, AppError> {
    let report = run_sweep(&state, &CancellationToken::new()).await?;
    Ok(Json(SweepResponse {
        success: true,
        report,
    }))
}
