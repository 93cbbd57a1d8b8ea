pub mod health;
pub mod judge;
pub mod ledger;
pub mod metrics;
pub mod sweep;
pub mod totals;

use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

/// Body shared by the per-pick endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickRequest {
    pub pick_id: Uuid,
}

/// OPTIONS without `Access-Control-Request-Method`. Real preflights never get
/// here; the CORS layer answers them first.
pub async fn options() -> StatusCode {
    StatusCode::NO_CONTENT
}
