//! Post-settlement token balances.
//!
//! Before distribution the whole supply sits in the issuer's holding (an
//! escrow of unsold allotment). Distribution credits buyers and burns
//! everything the issuer holds; afterwards holders can move tokens among
//! themselves.

use std::collections::HashMap;

use tokensale_types::{Principal, Result, SaleError, SalePhase, TokenAmount};

/// Per-principal whole-token balances plus the issuer's escrowed holding.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    /// The principal that pre-loaded the supply.
    issuer: Principal,
    /// Unsold allotment held for the issuer until distribution.
    issuer_holding: TokenAmount,
    /// Balances credited by distribution and moved by transfer.
    balances: HashMap<Principal, TokenAmount>,
}

impl TokenLedger {
    /// Create a ledger with the full supply in the issuer's holding.
    #[must_use]
    pub fn new(issuer: Principal, total_supply: TokenAmount) -> Self {
        Self {
            issuer,
            issuer_holding: total_supply,
            balances: HashMap::new(),
        }
    }

    /// Credit `amount` tokens to `holder` (settlement, receiving side).
    pub fn credit(&mut self, holder: Principal, amount: TokenAmount) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(holder).or_default() += amount;
    }

    /// Zero every token the issuer holds: the unsold escrow and anything
    /// credited to the issuer as a buyer. Returns the amount destroyed.
    pub fn burn_issuer_holding(&mut self) -> TokenAmount {
        let credited = self.balances.remove(&self.issuer).unwrap_or(0);
        std::mem::take(&mut self.issuer_holding) + credited
    }

    /// Move tokens between holders.
    ///
    /// # Errors
    /// - `NotOver` unless `phase` is `Distributed`
    /// - `WrongSender` unless `caller == from`
    /// - `InsufficientBalance` if `from` holds fewer than `amount`
    pub fn transfer(
        &mut self,
        phase: SalePhase,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: TokenAmount,
    ) -> Result<()> {
        if phase != SalePhase::Distributed {
            return Err(SaleError::NotOver);
        }
        if caller != from {
            return Err(SaleError::WrongSender);
        }
        let available = self.balance_of(&from);
        if available < amount {
            return Err(SaleError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        if let Some(entry) = self.balances.get_mut(&from) {
            *entry -= amount;
            if *entry == 0 {
                self.balances.remove(&from);
            }
        }
        *self.balances.entry(to).or_default() += amount;

        tracing::debug!(from = %from, to = %to, amount, "Tokens transferred");
        Ok(())
    }

    /// Token balance of `holder`, counting the issuer's escrow for the issuer.
    #[must_use]
    pub fn balance_of(&self, holder: &Principal) -> TokenAmount {
        let held = self.balances.get(holder).copied().unwrap_or(0);
        if *holder == self.issuer {
            held + self.issuer_holding
        } else {
            held
        }
    }

    #[must_use]
    pub fn issuer(&self) -> Principal {
        self.issuer
    }

    /// The issuer's escrowed, unsold allotment.
    #[must_use]
    pub fn issuer_holding(&self) -> TokenAmount {
        self.issuer_holding
    }

    /// Tokens held outside the issuer's escrow.
    #[must_use]
    pub fn circulating(&self) -> TokenAmount {
        self.balances.values().sum()
    }

    /// Every token that exists: circulating plus the issuer's holding.
    #[must_use]
    pub fn total(&self) -> TokenAmount {
        self.circulating() + self.issuer_holding
    }

    /// Number of principals holding a non-zero circulating balance.
    #[must_use]
    pub fn holders(&self) -> usize {
        self.balances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distributed_ledger() -> (Principal, Principal, TokenLedger) {
        let issuer = Principal::random();
        let alice = Principal::random();
        let mut ledger = TokenLedger::new(issuer, 1_000);
        ledger.credit(alice, 300);
        ledger.burn_issuer_holding();
        (issuer, alice, ledger)
    }

    #[test]
    fn supply_starts_in_issuer_holding() {
        let issuer = Principal::random();
        let ledger = TokenLedger::new(issuer, 10_000);
        assert_eq!(ledger.balance_of(&issuer), 10_000);
        assert_eq!(ledger.issuer_holding(), 10_000);
        assert_eq!(ledger.circulating(), 0);
    }

    #[test]
    fn burn_zeroes_holding() {
        let issuer = Principal::random();
        let mut ledger = TokenLedger::new(issuer, 10_000);
        assert_eq!(ledger.burn_issuer_holding(), 10_000);
        assert_eq!(ledger.balance_of(&issuer), 0);
        assert_eq!(ledger.burn_issuer_holding(), 0);
    }

    #[test]
    fn burn_includes_tokens_credited_to_issuer() {
        let issuer = Principal::random();
        let mut ledger = TokenLedger::new(issuer, 1_000);
        ledger.credit(issuer, 10);
        ledger.credit(Principal::repeat(1), 5);
        assert_eq!(ledger.burn_issuer_holding(), 1_010);
        assert_eq!(ledger.balance_of(&issuer), 0);
        assert_eq!(ledger.total(), 5);
    }

    #[test]
    fn transfer_before_distribution_fails() {
        let (_, alice, mut ledger) = distributed_ledger();
        for phase in [SalePhase::NotStarted, SalePhase::Active, SalePhase::Ended] {
            let err = ledger
                .transfer(phase, alice, alice, Principal::random(), 1)
                .unwrap_err();
            assert_eq!(err, SaleError::NotOver);
        }
    }

    #[test]
    fn transfer_from_other_sender_fails() {
        let (_, alice, mut ledger) = distributed_ledger();
        let mallory = Principal::random();
        let err = ledger
            .transfer(SalePhase::Distributed, mallory, alice, mallory, 1)
            .unwrap_err();
        assert_eq!(err, SaleError::WrongSender);
        assert_eq!(ledger.balance_of(&alice), 300);
    }

    #[test]
    fn transfer_more_than_balance_fails() {
        let (_, alice, mut ledger) = distributed_ledger();
        let err = ledger
            .transfer(SalePhase::Distributed, alice, alice, Principal::random(), 301)
            .unwrap_err();
        assert_eq!(
            err,
            SaleError::InsufficientBalance {
                needed: 301,
                available: 300,
            }
        );
    }

    #[test]
    fn transfer_moves_exact_amount_and_preserves_total() {
        let (_, alice, mut ledger) = distributed_ledger();
        let bob = Principal::random();
        let before = ledger.total();
        ledger
            .transfer(SalePhase::Distributed, alice, alice, bob, 120)
            .unwrap();
        assert_eq!(ledger.balance_of(&alice), 180);
        assert_eq!(ledger.balance_of(&bob), 120);
        assert_eq!(ledger.total(), before);
        assert_eq!(ledger.holders(), 2);
    }

    #[test]
    fn full_transfer_drops_empty_holder() {
        let (_, alice, mut ledger) = distributed_ledger();
        let bob = Principal::random();
        ledger
            .transfer(SalePhase::Distributed, alice, alice, bob, 300)
            .unwrap();
        assert_eq!(ledger.balance_of(&alice), 0);
        assert_eq!(ledger.holders(), 1);
    }

    #[test]
    fn self_transfer_is_noop() {
        let (_, alice, mut ledger) = distributed_ledger();
        ledger
            .transfer(SalePhase::Distributed, alice, alice, alice, 300)
            .unwrap();
        assert_eq!(ledger.balance_of(&alice), 300);
    }
}
