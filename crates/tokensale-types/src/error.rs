//! Error types for the token sale ledger.
//!
//! All errors use the `TS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Construction errors
//! - 2xx: Access-control errors
//! - 3xx: Purchase errors
//! - 4xx: Lifecycle errors
//! - 5xx: Ledger / withdrawal errors
//! - 6xx: Invariant errors
//! - 9xx: Configuration / general errors
//!
//! Every variant is a precondition rejection: the call that produced it
//! left the ledger unchanged.

use thiserror::Error;

use crate::{TokenAmount, Wei};

/// Central error enum for all sale operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    // =================================================================
    // Construction Errors (1xx)
    // =================================================================
    /// Sale start is not in the future, or sale end does not follow it.
    #[error("TS_ERR_100: Invalid sale timing: {reason}")]
    InvalidTiming { reason: String },

    /// Total supply is zero or its value capacity is not representable.
    #[error("TS_ERR_101: Invalid supply: {reason}")]
    InvalidSupply { reason: String },

    /// Unit price is zero.
    #[error("TS_ERR_102: Price of the token must be more than 0")]
    InvalidPrice,

    // =================================================================
    // Access-Control Errors (2xx)
    // =================================================================
    /// Caller is not the owner.
    #[error("TS_ERR_200: Caller is not the owner")]
    Unauthorized,

    /// Caller is not on the allow-list.
    #[error("TS_ERR_201: Caller is not whitelisted")]
    NotAllowed,

    // =================================================================
    // Purchase Errors (3xx)
    // =================================================================
    /// The sale window has not opened yet.
    #[error("TS_ERR_300: Sale has not started")]
    NotStarted,

    /// The sale window has closed.
    #[error("TS_ERR_301: Sale has ended")]
    Ended,

    /// A purchase was attempted with no value attached.
    #[error("TS_ERR_302: Sent amount should be above 0")]
    ZeroAmount,

    /// Remaining value capacity is smaller than the purchase amount.
    #[error("TS_ERR_303: The supply was depleted: requested {requested} wei, remaining {remaining} wei")]
    SupplyDepleted { requested: Wei, remaining: Wei },

    // =================================================================
    // Lifecycle Errors (4xx)
    // =================================================================
    /// The sale has not reached the state this operation requires.
    #[error("TS_ERR_400: Sale is not over yet")]
    NotOver,

    /// `end_sale` was already called.
    #[error("TS_ERR_401: The sale is already over")]
    AlreadyEnded,

    // =================================================================
    // Ledger / Withdrawal Errors (5xx)
    // =================================================================
    /// Token transfer was attempted on behalf of another principal.
    #[error("TS_ERR_500: Caller is not the sender of the transfer")]
    WrongSender,

    /// Token balance too small for the transfer.
    #[error("TS_ERR_501: Insufficient token balance: need {needed}, have {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    /// No refund is owed to the caller.
    #[error("TS_ERR_502: Nothing to withdraw")]
    NothingToWithdraw,

    /// The host rejected an ether transfer.
    #[error("TS_ERR_503: Value transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // Invariant Errors (6xx)
    // =================================================================
    /// Token or ether conservation invariant violated; critical alert.
    #[error("TS_ERR_600: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// An amount computation overflowed `u128`.
    #[error("TS_ERR_601: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Configuration / General (9xx)
    // =================================================================
    /// Configuration error (invalid config file, bad price, etc.).
    #[error("TS_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("TS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (reading config or scenario files).
    #[error("TS_ERR_902: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SaleError>;

impl From<std::io::Error> for SaleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SaleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let msg = format!("{}", SaleError::NotStarted);
        assert!(msg.starts_with("TS_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn supply_depleted_display() {
        let err = SaleError::SupplyDepleted {
            requested: 1_100,
            remaining: 1_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TS_ERR_303"));
        assert!(msg.contains("1100"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = SaleError::InsufficientBalance {
            needed: 10,
            available: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TS_ERR_501"));
        assert!(msg.contains("need 10"));
        assert!(msg.contains("have 3"));
    }

    #[test]
    fn all_errors_have_ts_err_prefix() {
        let errors = vec![
            SaleError::InvalidPrice,
            SaleError::Unauthorized,
            SaleError::NotAllowed,
            SaleError::Ended,
            SaleError::ZeroAmount,
            SaleError::NotOver,
            SaleError::AlreadyEnded,
            SaleError::WrongSender,
            SaleError::NothingToWithdraw,
            SaleError::ArithmeticOverflow,
            SaleError::Configuration("bad".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TS_ERR_"),
                "Error missing TS_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: SaleError = io.into();
        assert!(matches!(err, SaleError::Io(ref m) if m.contains("missing.json")));
    }
}
