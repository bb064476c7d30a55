//! Ordered contribution ledger and purchase acceptance.
//!
//! The ledger keeps two views of the same data:
//! - `contributions`: principal → cumulative wei paid (keyed lookup)
//! - `buyers`: distinct principals in first-purchase order
//!
//! First-seen order is the allocation tie-break in settlement, so a
//! principal is appended exactly once and never moved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokensale_types::{Principal, Result, SaleError, SalePhase, SaleTerms, Wei};

use crate::allow_list::AllowListCapability;

/// Per-buyer cumulative contributions in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SaleLedger {
    /// Distinct buyers in insertion order.
    buyers: Vec<Principal>,
    /// Cumulative contribution per buyer.
    contributions: HashMap<Principal, Wei>,
    /// Sum of every accepted purchase.
    total_contributed: Wei,
}

impl SaleLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record a purchase.
    ///
    /// Checks run in order, first failure wins:
    /// 1. `NotAllowed`: buyer is not on the allow-list
    /// 2. `NotStarted`: `now < sale_start`
    /// 3. `Ended`: `now > sale_end`, or the sale was explicitly ended
    /// 4. `ZeroAmount`: `amount == 0`
    /// 5. `SupplyDepleted`: remaining value capacity `< amount`
    ///
    /// Returns the buyer's new cumulative contribution. On error the ledger
    /// is unchanged.
    pub fn purchase<A: AllowListCapability + ?Sized>(
        &mut self,
        access: &A,
        terms: &SaleTerms,
        phase: SalePhase,
        now: DateTime<Utc>,
        buyer: Principal,
        amount: Wei,
    ) -> Result<Wei> {
        access.require_allowed(&buyer)?;
        if now < terms.sale_start {
            return Err(SaleError::NotStarted);
        }
        if now > terms.sale_end || phase.is_closed() {
            return Err(SaleError::Ended);
        }
        if amount == 0 {
            return Err(SaleError::ZeroAmount);
        }
        let remaining = self.remaining_capacity(terms);
        if remaining < amount {
            return Err(SaleError::SupplyDepleted {
                requested: amount,
                remaining,
            });
        }

        Ok(self.record(buyer, amount))
    }

    /// Append-or-accumulate without validation. Callers must have checked
    /// capacity, which also bounds every sum below `u128::MAX`.
    fn record(&mut self, buyer: Principal, amount: Wei) -> Wei {
        let entry = self.contributions.entry(buyer).or_insert_with(|| {
            self.buyers.push(buyer);
            0
        });
        *entry += amount;
        self.total_contributed += amount;

        tracing::debug!(
            buyer = %buyer,
            amount,
            contribution = *entry,
            total = self.total_contributed,
            "Purchase accepted"
        );
        *entry
    }

    /// Wei the sale can still absorb: `unit_price * total_supply - total_contributed`.
    #[must_use]
    pub fn remaining_capacity(&self, terms: &SaleTerms) -> Wei {
        terms.value_capacity().saturating_sub(self.total_contributed)
    }

    /// The buyer at `index` in first-purchase order.
    #[must_use]
    pub fn buyer_at(&self, index: usize) -> Option<Principal> {
        self.buyers.get(index).copied()
    }

    /// All buyers in first-purchase order.
    #[must_use]
    pub fn buyers(&self) -> &[Principal] {
        &self.buyers
    }

    /// Cumulative contribution of `buyer` (zero if never purchased).
    #[must_use]
    pub fn contribution_of(&self, buyer: &Principal) -> Wei {
        self.contributions.get(buyer).copied().unwrap_or(0)
    }

    /// `(buyer, contribution)` pairs in first-purchase order.
    pub fn iter(&self) -> impl Iterator<Item = (Principal, Wei)> + '_ {
        self.buyers
            .iter()
            .map(|b| (*b, self.contribution_of(b)))
    }

    /// Sum of every accepted purchase.
    #[must_use]
    pub fn total_contributed(&self) -> Wei {
        self.total_contributed
    }

    /// Number of distinct buyers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buyers.len()
    }

    /// Whether nobody has bought.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buyers.is_empty()
    }
}
