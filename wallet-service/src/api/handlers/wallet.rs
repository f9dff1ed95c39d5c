use actix_web::{web, HttpResponse};

use crate::app::wallet_service::WalletOperations;
use crate::domain::error::{WalletError, INTERNAL_SERVER_ERROR_MESSAGE};
use crate::domain::wallet::{BalanceResponse, ErrorResponse, WalletRequest};
use crate::validators::wallet_validator::{validate_request, validate_wallet_id, WALLET_ID_REQUIRED};

pub const INVALID_REQUEST_BODY: &str = "Invalid request body";

/// `POST /api/v1/wallet`
///
/// The body is decoded as JSON whatever its declared content type.
pub async fn apply_operation(
    service: web::Data<dyn WalletOperations>,
    body: web::Bytes,
) -> Result<HttpResponse, WalletError> {
    let request: WalletRequest = serde_json::from_slice(&body).map_err(|e| {
        log::debug!("Rejected request body: {e}");
        WalletError::validation(INVALID_REQUEST_BODY)
    })?;
    let operation = validate_request(&request)?;

    match service
        .apply(&operation.wallet_id, operation.operation_type, operation.amount)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().finish()),
        // Vanished between lock and write.
        Err(WalletError::NotFound) => {
            log::error!("Wallet {} disappeared during {}", operation.wallet_id, operation.operation_type);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse::new(INTERNAL_SERVER_ERROR_MESSAGE)))
        }
        Err(e @ WalletError::Store { .. }) => {
            log::error!("Failed to apply {} to wallet {}: {e}", operation.operation_type, operation.wallet_id);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// `GET /api/v1/wallets/{wallet_id}`
pub async fn get_balance(
    service: web::Data<dyn WalletOperations>,
    path: web::Path<String>,
) -> Result<HttpResponse, WalletError> {
    let wallet_id = path.into_inner();
    validate_wallet_id(&wallet_id)?;

    let balance = service.get_balance(&wallet_id).await.map_err(|e| {
        if matches!(e, WalletError::Store { .. }) {
            log::error!("Failed to read wallet {wallet_id}: {e}");
        }
        e
    })?;

    Ok(HttpResponse::Ok().json(BalanceResponse { wallet_id, balance }))
}

/// `GET /api/v1/wallets/` with no ID segment.
pub async fn missing_wallet_id() -> Result<HttpResponse, WalletError> {
    Err(WalletError::validation(WALLET_ID_REQUIRED))
}
