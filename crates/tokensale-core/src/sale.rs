//! The sale facade.

use chrono::{DateTime, Utc};
use tokensale_ingress::{AllowList, AllowListCapability, OwnerCapability, SaleLedger, SingleOwner};
use tokensale_settlement::{DistributionSummary, SettlementEngine, ValueTransfer};
use tokensale_types::{
    Allocation, Principal, Result, SaleConfig, SaleEvent, SaleEventKind, SaleId, SalePhase,
    SaleTerms, TokenAmount, Wei,
};

use crate::clock::Clock;
use crate::events::EventSink;
use crate::report::SaleReport;

/// One fixed-supply token sale.
///
/// `C`, `T` and `E` are the host seams (time, ether transfer, notifications).
/// `O` and `A` are the owner and allow-list capabilities the sale consults.
pub struct TokenSale<C, T, E, O = SingleOwner, A = AllowList<O>>
where
    C: Clock,
    T: ValueTransfer,
    E: EventSink,
    O: OwnerCapability,
    A: AllowListCapability,
{
    id: SaleId,
    terms: SaleTerms,
    owner: O,
    access: A,
    ledger: SaleLedger,
    engine: SettlementEngine,
    clock: C,
    transfer: T,
    events: E,
}

impl<C, T, E> TokenSale<C, T, E>
where
    C: Clock,
    T: ValueTransfer,
    E: EventSink,
{
    /// Deploy a sale from `config`, owned by `owner`, at the clock's `now`.
    ///
    /// # Errors
    /// Any construction error of [`SaleTerms::new`], or `Configuration` for
    /// an unrepresentable price.
    pub fn deploy(
        config: &SaleConfig,
        owner: Principal,
        clock: C,
        transfer: T,
        events: E,
    ) -> Result<Self> {
        let terms = config.terms_at(clock.now())?;
        let owner = SingleOwner::new(owner);
        Ok(Self::with_capabilities(
            terms,
            owner,
            AllowList::new(owner),
            clock,
            transfer,
            events,
        ))
    }
}

impl<C, T, E, O, A> TokenSale<C, T, E, O, A>
where
    C: Clock,
    T: ValueTransfer,
    E: EventSink,
    O: OwnerCapability,
    A: AllowListCapability,
{
    /// Assemble a sale from already validated terms and explicit capabilities.
    pub fn with_capabilities(
        terms: SaleTerms,
        owner: O,
        access: A,
        clock: C,
        transfer: T,
        events: E,
    ) -> Self {
        let id = SaleId::new();
        let engine = SettlementEngine::new(owner.owner(), &terms);
        tracing::info!(
            sale = %id,
            owner = %owner.owner(),
            sale_start = %terms.sale_start,
            sale_end = %terms.sale_end,
            total_supply = terms.total_supply,
            unit_price = terms.unit_price,
            "Sale deployed"
        );
        Self {
            id,
            terms,
            owner,
            access,
            ledger: SaleLedger::new(),
            engine,
            clock,
            transfer,
            events,
        }
    }

    // ---------------------------------------------------------------------
    // Calls
    // ---------------------------------------------------------------------

    /// Add or remove `principal` from the allow-list. Owner only.
    pub fn set_allowed(
        &mut self,
        caller: Principal,
        principal: Principal,
        allowed: bool,
    ) -> Result<()> {
        self.access.set_allowed(caller, principal, allowed)?;
        self.emit(SaleEventKind::AllowListUpdated { principal, allowed });
        Ok(())
    }

    /// Pay `amount` wei into the sale. Returns the caller's new contribution.
    pub fn purchase(&mut self, caller: Principal, amount: Wei) -> Result<Wei> {
        let now = self.clock.now();
        let phase = self.engine.phase(&self.terms, now);
        let contribution = self
            .ledger
            .purchase(&self.access, &self.terms, phase, now, caller, amount)?;
        self.engine.record_receipt(amount);
        self.emit(SaleEventKind::Purchased {
            buyer: caller,
            amount,
            contribution,
        });
        Ok(contribution)
    }

    /// Close the sale. Anyone may call once the window has passed.
    pub fn end_sale(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.engine.end_sale(&self.terms, now)?;
        self.emit(SaleEventKind::SaleEnded);
        Ok(())
    }

    /// Allocate tokens, refunds and proceeds; burn the unsold holding.
    pub fn distribute(&mut self) -> Result<DistributionSummary> {
        let summary = self.engine.distribute(&self.terms, &self.ledger)?;
        self.emit(SaleEventKind::Distributed {
            buyers: summary.buyers,
            tokens_granted: summary.tokens_granted,
            tokens_burned: summary.tokens_burned,
            proceeds: summary.proceeds,
        });
        Ok(summary)
    }

    /// Pay the issuer everything it is owed. Anyone may trigger it.
    ///
    /// Returns the amount sent; zero when nothing is owed.
    pub fn withdraw_issuer_proceeds(&mut self) -> Result<Wei> {
        let issuer = self.owner.owner();
        let payout = self.engine.take_issuer_proceeds(issuer)?;
        let sent = self.engine.pay_out(payout, &mut self.transfer)?;
        if sent > 0 {
            tracing::info!(sale = %self.id, issuer = %issuer, amount = sent, "Proceeds withdrawn");
            self.emit(SaleEventKind::ProceedsWithdrawn {
                issuer,
                amount: sent,
            });
        }
        Ok(sent)
    }

    /// Pay `caller` the refund they are owed.
    pub fn withdraw_refund(&mut self, caller: Principal) -> Result<Wei> {
        let payout = self.engine.take_refund(caller)?;
        let sent = self.engine.pay_out(payout, &mut self.transfer)?;
        tracing::info!(sale = %self.id, buyer = %caller, amount = sent, "Refund withdrawn");
        self.emit(SaleEventKind::RefundWithdrawn {
            buyer: caller,
            amount: sent,
        });
        Ok(sent)
    }

    /// Move `amount` tokens from `from` to `to`. `caller` must be `from`.
    pub fn transfer(
        &mut self,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: TokenAmount,
    ) -> Result<()> {
        let now = self.clock.now();
        self.engine.transfer(&self.terms, now, caller, from, to, amount)?;
        self.emit(SaleEventKind::TokensTransferred { from, to, amount });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn id(&self) -> SaleId {
        self.id
    }

    #[must_use]
    pub fn terms(&self) -> &SaleTerms {
        &self.terms
    }

    #[must_use]
    pub fn owner(&self) -> Principal {
        self.owner.owner()
    }

    #[must_use]
    pub fn is_allowed(&self, principal: &Principal) -> bool {
        self.access.is_allowed(principal)
    }

    /// Phase at the clock's current time.
    #[must_use]
    pub fn phase(&self) -> SalePhase {
        self.engine.phase(&self.terms, self.clock.now())
    }

    /// The `index`-th distinct buyer, in first-purchase order.
    #[must_use]
    pub fn buyer_at(&self, index: usize) -> Option<Principal> {
        self.ledger.buyer_at(index)
    }

    #[must_use]
    pub fn buyer_count(&self) -> usize {
        self.ledger.len()
    }

    #[must_use]
    pub fn contribution_of(&self, principal: &Principal) -> Wei {
        self.ledger.contribution_of(principal)
    }

    #[must_use]
    pub fn total_contributed(&self) -> Wei {
        self.ledger.total_contributed()
    }

    /// Value that can still be accepted before the sale is sold out.
    #[must_use]
    pub fn remaining_capacity(&self) -> Wei {
        self.ledger.remaining_capacity(&self.terms)
    }

    #[must_use]
    pub fn token_balance_of(&self, principal: &Principal) -> TokenAmount {
        self.engine.tokens().balance_of(principal)
    }

    #[must_use]
    pub fn issuer_holding(&self) -> TokenAmount {
        self.engine.tokens().issuer_holding()
    }

    #[must_use]
    pub fn refund_of(&self, principal: &Principal) -> Wei {
        self.engine.book().refund_of(principal)
    }

    #[must_use]
    pub fn proceeds_owed(&self) -> Wei {
        self.engine.book().proceeds_owed()
    }

    /// Allocation lines in buyer order; empty until distribution.
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        self.engine.allocations()
    }

    #[must_use]
    pub fn settlement_digest(&self) -> Option<[u8; 32]> {
        self.engine.settlement_digest()
    }

    /// Check token and ether conservation.
    pub fn verify_conservation(&self) -> Result<()> {
        self.engine.verify_conservation()
    }

    /// Point-in-time summary suitable for serialization.
    #[must_use]
    pub fn report(&self) -> SaleReport {
        SaleReport::capture(self)
    }

    // ---------------------------------------------------------------------
    // Host seams
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[must_use]
    pub fn value_transfer(&self) -> &T {
        &self.transfer
    }

    pub fn value_transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    #[must_use]
    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn emit(&mut self, kind: SaleEventKind) {
        tracing::debug!(sale = %self.id, event = %kind, "Event emitted");
        let event = SaleEvent::new(self.id, kind, self.clock.now());
        self.events.emit(event);
    }
}
