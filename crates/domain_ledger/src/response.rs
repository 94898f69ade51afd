//! Boundary envelope for callers outside the ledger
//!
//! Callers render `error` to users and branch on `code`; nothing crosses the
//! boundary as a panic or a raw error type.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Success-or-failure result handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(error: &LedgerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.code().to_string()),
        }
    }

    /// Maps the payload of a successful response
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResponse<U> {
        ActionResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            code: self.code,
        }
    }
}

impl<T> From<Result<T, LedgerError>> for ActionResponse<T> {
    fn from(result: Result<T, LedgerError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failure(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_success_envelope() {
        let response: ActionResponse<u32> = Ok(7).into();
        assert!(response.success);
        assert_eq!(response.data, Some(7));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_carries_discrepancy() {
        let error = LedgerError::Corruption {
            debits: dec!(1100),
            credits: dec!(1000),
            difference: dec!(100),
        };
        let response: ActionResponse<()> = Err(error).into();
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("corruption"));
        assert!(response.error.unwrap().contains("100"));
    }
}
