use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of balance mutation requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "DEPOSIT",
            OperationType::Withdraw => "WITHDRAW",
        }
    }

    /// Signed delta for `amount`: positive for deposits, negative for withdrawals.
    pub fn delta(&self, amount: i64) -> i64 {
        match self {
            OperationType::Deposit => amount,
            OperationType::Withdraw => -amount,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    /// Exact, case-sensitive match on the wire value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(OperationType::Deposit),
            "WITHDRAW" => Ok(OperationType::Withdraw),
            other => Err(format!("unknown operation type: {other}")),
        }
    }
}

/// Body of `POST /api/v1/wallet`.
///
/// Missing and `null` fields both take their zero value so that they are
/// reported by validation rather than by the JSON decoder. `operation_type`
/// stays a raw string for the same reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub wallet_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub operation_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub wallet_id: String,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
