use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    let integrations = json!({
        "judge": state.config.xai_api_key.is_some(),
        "rpc": state.config.evm_rpc_url.is_some(),
        "backend": state.config.has_backend(),
    });

    if db_ok {
        (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "integrations": integrations })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "db": "disconnected", "integrations": integrations })),
        )
    }
}
