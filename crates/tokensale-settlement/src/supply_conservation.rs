//! Token and ether conservation checker.
//!
//! Mathematical invariants enforced after settlement:
//! ```text
//! tokens: Σ(holder balances) + issuer_holding == minted - burned
//! ether:  proceeds_owed + Σ(refunds_owed)   == received - disbursed
//! ```
//!
//! Minted is the pre-loaded supply, burned is the unsold remainder at
//! distribution. Received is every accepted purchase, disbursed is every
//! completed payout. If either equation breaks, settlement has created or
//! destroyed value and the sale must not pay anything else out.

use tokensale_types::{Result, SaleError, TokenAmount, Wei};

/// Tracks what entered and left the sale and validates the balances held.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    /// Tokens created at deployment.
    minted: TokenAmount,
    /// Tokens destroyed at distribution.
    burned: TokenAmount,
    /// Wei accepted by purchases.
    received: Wei,
    /// Wei sent out by withdrawals.
    disbursed: Wei,
}

impl SupplyConservation {
    /// Create a tracker for a sale that pre-mints `minted` tokens.
    #[must_use]
    pub fn new(minted: TokenAmount) -> Self {
        Self {
            minted,
            ..Self::default()
        }
    }

    /// Record tokens destroyed.
    pub fn record_burn(&mut self, amount: TokenAmount) {
        self.burned += amount;
    }

    /// Record wei accepted into the sale.
    pub fn record_receipt(&mut self, amount: Wei) {
        self.received += amount;
    }

    /// Record wei paid out of the sale.
    pub fn record_disbursement(&mut self, amount: Wei) {
        self.disbursed += amount;
    }

    /// Tokens that should exist: minted - burned.
    #[must_use]
    pub fn expected_tokens(&self) -> TokenAmount {
        self.minted - self.burned
    }

    /// Wei that should still be held: received - disbursed.
    #[must_use]
    pub fn expected_ether(&self) -> Wei {
        self.received - self.disbursed
    }

    /// Verify that all token balances sum to the expected supply.
    ///
    /// # Errors
    /// Returns [`SaleError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify_tokens(&self, actual: TokenAmount) -> Result<()> {
        let expected = self.expected_tokens();
        if actual != expected {
            tracing::error!(actual, expected, "Token conservation violated");
            return Err(SaleError::SupplyInvariantViolation {
                reason: format!(
                    "tokens: actual {actual} != expected {expected} \
                     (minted={}, burned={})",
                    self.minted, self.burned
                ),
            });
        }
        Ok(())
    }

    /// Verify that ether still owed matches ether still held.
    ///
    /// # Errors
    /// Returns [`SaleError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify_ether(&self, actual: Wei) -> Result<()> {
        let expected = self.expected_ether();
        if actual != expected {
            tracing::error!(actual, expected, "Ether conservation violated");
            return Err(SaleError::SupplyInvariantViolation {
                reason: format!(
                    "ether: owed {actual} != held {expected} \
                     (received={}, disbursed={})",
                    self.received, self.disbursed
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn minted(&self) -> TokenAmount {
        self.minted
    }

    #[must_use]
    pub fn burned(&self) -> TokenAmount {
        self.burned
    }

    #[must_use]
    pub fn received(&self) -> Wei {
        self.received
    }

    #[must_use]
    pub fn disbursed(&self) -> Wei {
        self.disbursed
    }
}
