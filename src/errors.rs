use crate::{
    contract::ContractError,
    crypto::{cipher::CipherError, shamir::SharingError},
    ledger::LedgerError,
    services::{content_store::ContentError, vault_service::VaultError},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict { .. } => AppError::new(StatusCode::CONFLICT, err.to_string()),
            LedgerError::Sqlx(inner) => {
                tracing::error!("ledger error: {inner:?}");
                AppError::internal("ledger unavailable")
            }
        }
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        let status = match &err {
            ContractError::NotFound(_) => StatusCode::NOT_FOUND,
            ContractError::AlreadyExists(_) | ContractError::ConcurrentModification(_) => {
                StatusCode::CONFLICT
            }
            ContractError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            ContractError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ContractError::UnknownFunction(_) => StatusCode::BAD_REQUEST,
            ContractError::Ledger(_) => {
                tracing::error!("contract ledger error: {err:?}");
                return AppError::internal("ledger unavailable");
            }
        };
        AppError::new(status, err.to_string())
    }
}

impl From<SharingError> for AppError {
    fn from(err: SharingError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<CipherError> for AppError {
    fn from(err: CipherError) -> Self {
        AppError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(_) => AppError::new(StatusCode::NOT_FOUND, err.to_string()),
            ContentError::InvalidAddress(_) => {
                AppError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ContentError::Io(inner) => {
                tracing::error!("content store error: {inner:?}");
                AppError::internal("content store unavailable")
            }
        }
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InsufficientShares { .. } | VaultError::InvalidParameters(_) => {
                AppError::bad_request(err.to_string())
            }
            VaultError::Contract(inner) => inner.into(),
            VaultError::Sharing(inner) => inner.into(),
            VaultError::Cipher(inner) => inner.into(),
            VaultError::Content(inner) => inner.into(),
        }
    }
}
