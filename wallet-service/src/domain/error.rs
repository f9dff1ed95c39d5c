use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::domain::wallet::ErrorResponse;

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";
pub const WALLET_NOT_FOUND_MESSAGE: &str = "Wallet not found";

/// Failures raised by a balance store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("balance overflow for wallet {0}")]
    Overflow(String),
}

/// Main error type for wallet operations
#[derive(Debug, Error)]
pub enum WalletError {
    /// Malformed or missing input. Never reaches the store.
    #[error("{0}")]
    Validation(String),

    /// A withdrawal would take the balance below zero.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The wallet is absent on read, or vanished between lock and write.
    #[error("wallet not found")]
    NotFound,

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl WalletError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a store failure with the operation that hit it.
    pub fn store(context: impl Into<String>, source: impl Into<StoreError>) -> Self {
        Self::Store {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Status code and client-facing message. Store internals are never exposed.
    pub fn to_http_response(&self) -> (StatusCode, String) {
        match self {
            WalletError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WalletError::InsufficientFunds => (StatusCode::BAD_REQUEST, self.to_string()),
            WalletError::NotFound => (StatusCode::NOT_FOUND, WALLET_NOT_FOUND_MESSAGE.to_string()),
            WalletError::Store { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl ResponseError for WalletError {
    fn status_code(&self) -> StatusCode {
        self.to_http_response().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, message) = self.to_http_response();
        HttpResponse::build(status_code).json(ErrorResponse::new(message))
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
