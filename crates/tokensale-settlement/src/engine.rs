//! Settlement engine: closing the sale and converting contributions into
//! allocations.
//!
//! Distribution runs exactly once, after `end_sale`:
//! 1. `remaining = total_supply`
//! 2. For each buyer in first-purchase order:
//!    `granted = min(contribution / unit_price, remaining)`,
//!    `cost = granted * unit_price`, `refund = contribution - cost`
//! 3. Credit tokens, set the refund, add cost to proceeds
//! 4. Burn everything the issuer holds: the unsold remainder plus any
//!    tokens the issuer bought for itself
//!
//! Allocation lines are computed and checked in full before any ledger is
//! written, so a failure leaves the sale `Ended` with nothing half-applied.
//!
//! Purchases are reported with [`SettlementEngine::record_receipt`] as they
//! are accepted. Until distribution that ether sits in escrow, and
//! conservation compares escrow plus the withdrawal book against the
//! tracker at every phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokensale_ingress::SaleLedger;
use tokensale_types::{
    Allocation, Principal, Result, SaleError, SalePhase, SaleTerms, TokenAmount, Wei,
};

use crate::digest::compute_settlement_digest;
use crate::supply_conservation::SupplyConservation;
use crate::token_ledger::TokenLedger;
use crate::withdraw::{Payout, ValueTransfer, WithdrawalBook};

/// Totals produced by one distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Buyers settled.
    pub buyers: usize,
    /// Tokens credited to buyers.
    pub tokens_granted: TokenAmount,
    /// Tokens destroyed: the unsold remainder plus the issuer's own grant.
    pub tokens_burned: TokenAmount,
    /// Wei routed to the issuer.
    pub proceeds: Wei,
    /// Wei owed back to buyers in total.
    pub refunds: Wei,
}

/// Owns every ledger written at or after the end of the sale.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    /// Last explicit phase write; `None` while the sale is time-driven.
    recorded: Option<SalePhase>,
    /// Allocation lines in buyer order, filled by `distribute`.
    allocations: Vec<Allocation>,
    /// Digest over `allocations`, set by `distribute`.
    digest: Option<[u8; 32]>,
    /// Token balances and the issuer's escrowed holding.
    tokens: TokenLedger,
    /// Proceeds and refunds owed.
    book: WithdrawalBook,
    /// Wei accepted by purchases and not yet split by `distribute`.
    escrowed: Wei,
    /// Conservation tracker.
    supply: SupplyConservation,
}

impl SettlementEngine {
    /// Create an engine whose issuer holds the full supply.
    #[must_use]
    pub fn new(issuer: Principal, terms: &SaleTerms) -> Self {
        Self {
            recorded: None,
            allocations: Vec::new(),
            digest: None,
            tokens: TokenLedger::new(issuer, terms.total_supply),
            book: WithdrawalBook::new(),
            escrowed: 0,
            supply: SupplyConservation::new(terms.total_supply),
        }
    }

    /// Current phase at `now`.
    #[must_use]
    pub fn phase(&self, terms: &SaleTerms, now: DateTime<Utc>) -> SalePhase {
        SalePhase::resolve(now, terms, self.recorded)
    }

    /// Close the sale for good.
    ///
    /// # Errors
    /// - `NotOver` if `now <= sale_end`
    /// - `AlreadyEnded` if the sale was already ended or distributed
    pub fn end_sale(&mut self, terms: &SaleTerms, now: DateTime<Utc>) -> Result<()> {
        if now <= terms.sale_end {
            return Err(SaleError::NotOver);
        }
        let current = self.phase(terms, now);
        if current.is_closed() {
            return Err(SaleError::AlreadyEnded);
        }
        debug_assert!(current.can_advance_to(SalePhase::Ended));
        self.recorded = Some(SalePhase::Ended);

        tracing::info!(from = %current, to = %SalePhase::Ended, "Sale ended");
        Ok(())
    }

    /// Hold `amount` wei accepted by a purchase until distribution.
    pub fn record_receipt(&mut self, amount: Wei) {
        self.escrowed += amount;
        self.supply.record_receipt(amount);
    }

    /// Settle every buyer in `ledger` and burn what the issuer holds.
    ///
    /// # Errors
    /// - `NotOver` unless the phase is exactly `Ended`
    /// - `SupplyInvariantViolation` if the computed lines do not conserve
    ///   tokens or ether, or `ledger` disagrees with the receipts recorded
    ///   here (nothing is written and the phase stays `Ended`)
    pub fn distribute(
        &mut self,
        terms: &SaleTerms,
        ledger: &SaleLedger,
    ) -> Result<DistributionSummary> {
        if self.recorded != Some(SalePhase::Ended) {
            return Err(SaleError::NotOver);
        }

        let issuer = self.tokens.issuer();
        let allocations = allocate(terms, ledger);
        let summary = summarize(terms, issuer, &allocations);
        check_lines(terms, ledger, &allocations, &summary)?;
        if ledger.total_contributed() != self.escrowed {
            return Err(SaleError::SupplyInvariantViolation {
                reason: format!(
                    "ledger holds {} wei but {} wei were received",
                    ledger.total_contributed(),
                    self.escrowed
                ),
            });
        }

        for line in &allocations {
            self.tokens.credit(line.buyer, line.granted_tokens);
            self.book.set_refund(line.buyer, line.refund);
            self.book.credit_proceeds(line.cost);
        }
        let burned = self.tokens.burn_issuer_holding();
        debug_assert_eq!(burned, summary.tokens_burned);
        self.book.open();
        self.escrowed = 0;
        self.supply.record_burn(burned);

        let digest = compute_settlement_digest(&allocations);
        self.digest = Some(digest);
        self.allocations = allocations;
        self.recorded = Some(SalePhase::Distributed);

        tracing::info!(
            buyers = summary.buyers,
            tokens_granted = summary.tokens_granted,
            tokens_burned = summary.tokens_burned,
            proceeds = summary.proceeds,
            refunds = summary.refunds,
            digest = hex::encode(digest),
            "Distribution complete"
        );

        // Already applied; a mismatch here is only logged.
        if let Err(err) = self.verify_conservation() {
            tracing::error!(error = %err, "Conservation broken after distribution");
        }
        Ok(summary)
    }

    /// Take the issuer's proceeds. See [`WithdrawalBook::take_proceeds`].
    pub fn take_issuer_proceeds(&mut self, issuer: Principal) -> Result<Payout> {
        self.book.take_proceeds(issuer)
    }

    /// Take a buyer's refund. See [`WithdrawalBook::take_refund`].
    pub fn take_refund(&mut self, buyer: Principal) -> Result<Payout> {
        self.book.take_refund(buyer)
    }

    /// Send a taken payout; restore it on failure, record it on success.
    pub fn pay_out<T: ValueTransfer + ?Sized>(
        &mut self,
        payout: Payout,
        transfer: &mut T,
    ) -> Result<Wei> {
        let sent = self.book.settle(payout, transfer)?;
        self.supply.record_disbursement(sent);
        Ok(sent)
    }

    /// Move tokens between holders. See [`TokenLedger::transfer`].
    pub fn transfer(
        &mut self,
        terms: &SaleTerms,
        now: DateTime<Utc>,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: TokenAmount,
    ) -> Result<()> {
        let phase = self.phase(terms, now);
        self.tokens.transfer(phase, caller, from, to, amount)
    }

    /// Check token and ether conservation against the tracker.
    ///
    /// Ether held is escrow before distribution and the withdrawal book
    /// after it.
    pub fn verify_conservation(&self) -> Result<()> {
        self.supply.verify_tokens(self.tokens.total())?;
        self.supply.verify_ether(self.book.total_owed() + self.escrowed)
    }

    /// Wei received and not yet distributed.
    #[must_use]
    pub fn escrowed(&self) -> Wei {
        self.escrowed
    }

    /// Allocation lines in buyer order (empty before distribution).
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Digest over the allocation lines, once distributed.
    #[must_use]
    pub fn settlement_digest(&self) -> Option<[u8; 32]> {
        self.digest
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    #[must_use]
    pub fn book(&self) -> &WithdrawalBook {
        &self.book
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }
}

/// Compute one allocation line per buyer, in first-purchase order.
fn allocate(terms: &SaleTerms, ledger: &SaleLedger) -> Vec<Allocation> {
    let mut remaining = terms.total_supply;
    let mut lines = Vec::with_capacity(ledger.len());

    for (buyer, contribution) in ledger.iter() {
        let requested = contribution / terms.unit_price;
        let granted = requested.min(remaining);
        // granted <= total_supply, and price * total_supply fits by construction.
        let cost = granted * terms.unit_price;
        let refund = contribution - cost;
        remaining -= granted;

        tracing::debug!(
            buyer = %buyer,
            contribution,
            requested,
            granted,
            refund,
            "Allocation computed"
        );

        lines.push(Allocation {
            buyer,
            contribution,
            granted_tokens: granted,
            cost,
            refund,
        });
    }
    lines
}

fn summarize(terms: &SaleTerms, issuer: Principal, lines: &[Allocation]) -> DistributionSummary {
    let tokens_granted: TokenAmount = lines.iter().map(|l| l.granted_tokens).sum();
    let issuer_granted: TokenAmount = lines
        .iter()
        .filter(|l| l.buyer == issuer)
        .map(|l| l.granted_tokens)
        .sum();
    DistributionSummary {
        buyers: lines.len(),
        tokens_granted,
        tokens_burned: terms.total_supply.saturating_sub(tokens_granted) + issuer_granted,
        proceeds: lines.iter().map(|l| l.cost).sum(),
        refunds: lines.iter().map(|l| l.refund).sum(),
    }
}

/// Reject lines that would create tokens or lose ether.
fn check_lines(
    terms: &SaleTerms,
    ledger: &SaleLedger,
    lines: &[Allocation],
    summary: &DistributionSummary,
) -> Result<()> {
    if summary.tokens_granted > terms.total_supply {
        return Err(SaleError::SupplyInvariantViolation {
            reason: format!(
                "granted {} tokens of a {} supply",
                summary.tokens_granted, terms.total_supply
            ),
        });
    }
    if let Some(bad) = lines.iter().find(|l| !l.is_balanced()) {
        return Err(SaleError::SupplyInvariantViolation {
            reason: format!("allocation for {} does not balance", bad.buyer),
        });
    }
    if summary.proceeds + summary.refunds != ledger.total_contributed() {
        return Err(SaleError::SupplyInvariantViolation {
            reason: format!(
                "proceeds {} + refunds {} != received {}",
                summary.proceeds,
                summary.refunds,
                ledger.total_contributed()
            ),
        });
    }
    Ok(())
}
