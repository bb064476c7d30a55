//! Amount types and per-buyer settlement lines.
//!
//! All amounts are unsigned integers: ether in wei, tokens as whole units.
//! There is no fractional token.

use serde::{Deserialize, Serialize};

use crate::Principal;

/// Ether amount in wei (10^18 wei = 1 ether).
pub type Wei = u128;

/// Whole-token count.
pub type TokenAmount = u128;

/// The outcome of settling one buyer.
///
/// Invariant: `cost + refund == contribution` and
/// `cost == granted_tokens * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// The buyer this line settles.
    pub buyer: Principal,
    /// Cumulative wei the buyer sent during the sale.
    pub contribution: Wei,
    /// Whole tokens credited to the buyer.
    pub granted_tokens: TokenAmount,
    /// Wei routed to the issuer for those tokens.
    pub cost: Wei,
    /// Wei owed back to the buyer.
    pub refund: Wei,
}

impl Allocation {
    /// Whether this buyer is owed anything back.
    #[must_use]
    pub fn has_refund(&self) -> bool {
        self.refund > 0
    }

    /// Whether the line balances: every wei is either cost or refund.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.cost.checked_add(self.refund) == Some(self.contribution)
    }
}
