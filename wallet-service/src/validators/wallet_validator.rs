use crate::domain::error::{WalletError, WalletResult};
use crate::domain::wallet::{OperationType, WalletRequest};

pub const WALLET_ID_REQUIRED: &str = "Wallet ID is required";
pub const INVALID_OPERATION_TYPE: &str = "Operation type must be DEPOSIT or WITHDRAW";
pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be more than 0";

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOperation {
    pub wallet_id: String,
    pub operation_type: OperationType,
    pub amount: i64,
}

/// Checks are applied in order and the first failure is reported.
pub fn validate_request(request: &WalletRequest) -> WalletResult<ValidatedOperation> {
    validate_wallet_id(&request.wallet_id)?;
    let operation_type = request
        .operation_type
        .parse::<OperationType>()
        .map_err(|_| WalletError::validation(INVALID_OPERATION_TYPE))?;
    validate_amount(request.amount)?;

    Ok(ValidatedOperation {
        wallet_id: request.wallet_id.clone(),
        operation_type,
        amount: request.amount,
    })
}

pub fn validate_wallet_id(wallet_id: &str) -> WalletResult<()> {
    if wallet_id.is_empty() {
        return Err(WalletError::validation(WALLET_ID_REQUIRED));
    }
    Ok(())
}

pub fn validate_amount(amount: i64) -> WalletResult<()> {
    if amount <= 0 {
        return Err(WalletError::validation(AMOUNT_NOT_POSITIVE));
    }
    Ok(())
}
