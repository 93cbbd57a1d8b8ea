use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chain::RpcError;
use crate::judge::JudgeError;
use crate::services::ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Data not available yet; the caller should retry later.
    #[error("Not available yet: {0}")]
    NotYetAvailable(String),

    #[error("Unparseable verdict: {message}")]
    Unparseable { message: String, raw: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotYetAvailable(_) => StatusCode::CONFLICT,
            AppError::Unparseable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, raw) = match self {
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {msg}");
                (msg, None)
            }
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::NotYetAvailable(msg) => (msg, None),
            AppError::Unauthorized => ("Unauthorized".into(), None),
            AppError::Unparseable { message, raw } => {
                tracing::warn!(raw = %raw, "Unparseable verdict: {message}");
                (message, Some(raw))
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (msg, None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("Internal server error".into(), None)
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                raw,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<JudgeError> for AppError {
    fn from(e: JudgeError) -> Self {
        match e {
            JudgeError::Parse { message, raw } => AppError::Unparseable { message, raw },
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<RpcError> for AppError {
    fn from(e: RpcError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFoundYet { .. } => AppError::NotYetAvailable(e.to_string()),
            LedgerError::Unresolved(_) | LedgerError::NoMarketAddress(_) => {
                AppError::BadRequest(e.to_string())
            }
            LedgerError::Rpc(rpc) => rpc.into(),
        }
    }
}
