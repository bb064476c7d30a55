//! Integration test: withdrawals under hostile recipients
//!
//! Payouts are take-then-send. These tests play the part of a recipient
//! that calls back into the sale, or that refuses ether altogether, and
//! check that neither can extract more than it is owed.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use tokensale_core::{EventLog, ManualClock, TokenSale};
use tokensale_ingress::{AllowList, AllowListCapability, SaleLedger, SingleOwner};
use tokensale_settlement::{RecordingTransfer, SettlementEngine, ValueTransfer};
use tokensale_types::*;

const PRICE: Wei = constants::DEFAULT_UNIT_PRICE_WEI;

/// Rejects every payment to a fixed set of recipients.
#[derive(Default)]
struct RejectingTransfer {
    rejected: HashSet<Principal>,
    inner: RecordingTransfer,
}

impl ValueTransfer for RejectingTransfer {
    fn send(&mut self, to: Principal, amount: Wei) -> Result<()> {
        if self.rejected.contains(&to) {
            return Err(SaleError::TransferFailed {
                reason: format!("{to} has no payable fallback"),
            });
        }
        self.inner.send(to, amount)
    }
}

fn settled_engine(buyer: Principal, amount: Wei) -> (Principal, SettlementEngine) {
    let now = Utc::now();
    let owner = Principal::repeat(0xAB);
    let terms = SaleTerms::dummy(now, 1_000, PRICE);
    let mut list = AllowList::new(SingleOwner::new(owner));
    list.set_allowed(owner, buyer, true).unwrap();

    let mut ledger = SaleLedger::new();
    ledger
        .purchase(&list, &terms, SalePhase::Active, terms.sale_start, buyer, amount)
        .unwrap();

    let mut engine = SettlementEngine::new(owner, &terms);
    engine.record_receipt(amount);
    engine
        .end_sale(&terms, terms.sale_end + Duration::seconds(1))
        .unwrap();
    engine.distribute(&terms, &ledger).unwrap();
    (owner, engine)
}

#[test]
fn nested_refund_during_send_sees_zero() {
    let buyer = Principal::repeat(1);
    let (_, mut engine) = settled_engine(buyer, PRICE * 2 + 99);

    let payout = engine.take_refund(buyer).unwrap();
    assert_eq!(payout.amount, 99);

    // What a callback from inside `send` would observe.
    assert_eq!(engine.book().refund_of(&buyer), 0);
    assert_eq!(
        engine.take_refund(buyer).unwrap_err(),
        SaleError::NothingToWithdraw
    );

    let mut transfer = RecordingTransfer::new();
    assert_eq!(engine.pay_out(payout, &mut transfer).unwrap(), 99);
    assert_eq!(transfer.received_by(&buyer), 99);
    engine.verify_conservation().unwrap();
}

#[test]
fn nested_proceeds_during_send_is_zero() {
    let buyer = Principal::repeat(1);
    let (owner, mut engine) = settled_engine(buyer, PRICE * 4);

    let payout = engine.take_issuer_proceeds(owner).unwrap();
    let nested = engine.take_issuer_proceeds(owner).unwrap();
    assert_eq!(nested.amount, 0);

    let mut transfer = RecordingTransfer::new();
    assert_eq!(engine.pay_out(nested, &mut transfer).unwrap(), 0);
    assert_eq!(engine.pay_out(payout, &mut transfer).unwrap(), PRICE * 4);
    assert_eq!(transfer.total_sent(), PRICE * 4);
    engine.verify_conservation().unwrap();
}

#[test]
fn rejecting_buyer_keeps_refund_and_blocks_nobody() {
    let owner = Principal::repeat(0xAB);
    let stubborn = Principal::repeat(1);
    let honest = Principal::repeat(2);

    let mut transfer = RejectingTransfer::default();
    transfer.rejected.insert(stubborn);

    let config = SaleConfig {
        total_supply: 1_000,
        ..SaleConfig::default()
    };
    let mut sale: TokenSale<ManualClock, RejectingTransfer, EventLog> = TokenSale::deploy(
        &config,
        owner,
        ManualClock::default(),
        transfer,
        EventLog::new(),
    )
    .unwrap();
    sale.set_allowed(owner, stubborn, true).unwrap();
    sale.set_allowed(owner, honest, true).unwrap();

    let start = sale.terms().sale_start;
    sale.clock_mut().set(start);
    sale.purchase(stubborn, PRICE + 5).unwrap();
    sale.purchase(honest, PRICE + 6).unwrap();

    let end = sale.terms().sale_end;
    sale.clock_mut().set(end + Duration::seconds(1));
    sale.end_sale().unwrap();
    sale.distribute().unwrap();

    for _ in 0..3 {
        let err = sale.withdraw_refund(stubborn).unwrap_err();
        assert!(matches!(err, SaleError::TransferFailed { .. }));
        assert_eq!(sale.refund_of(&stubborn), 5);
    }

    assert_eq!(sale.withdraw_refund(honest).unwrap(), 6);
    assert_eq!(sale.withdraw_issuer_proceeds().unwrap(), PRICE * 2);
    assert_eq!(sale.value_transfer().inner.total_sent(), PRICE * 2 + 6);
    sale.verify_conservation().unwrap();

    // Once it can receive again, the refund is still there.
    sale.value_transfer_mut().rejected.clear();
    assert_eq!(sale.withdraw_refund(stubborn).unwrap(), 5);
    sale.verify_conservation().unwrap();
}

#[test]
fn failed_proceeds_send_is_retryable() {
    let owner = Principal::repeat(0xAB);
    let buyer = Principal::repeat(3);
    let config = SaleConfig {
        total_supply: 1_000,
        ..SaleConfig::default()
    };
    let mut sale: TokenSale<ManualClock, RecordingTransfer, EventLog> = TokenSale::deploy(
        &config,
        owner,
        ManualClock::default(),
        RecordingTransfer::new(),
        EventLog::new(),
    )
    .unwrap();
    sale.set_allowed(owner, buyer, true).unwrap();
    let start = sale.terms().sale_start;
    sale.clock_mut().set(start);
    sale.purchase(buyer, PRICE * 8).unwrap();
    let end = sale.terms().sale_end;
    sale.clock_mut().set(end + Duration::days(1));
    sale.end_sale().unwrap();
    sale.distribute().unwrap();

    sale.value_transfer_mut().fail_next();
    assert!(sale.withdraw_issuer_proceeds().is_err());
    assert_eq!(sale.proceeds_owed(), PRICE * 8);

    assert_eq!(sale.withdraw_issuer_proceeds().unwrap(), PRICE * 8);
    assert_eq!(sale.withdraw_issuer_proceeds().unwrap(), 0);
    assert_eq!(sale.value_transfer().received_by(&owner), PRICE * 8);
    assert_eq!(sale.events().named("PROCEEDS_WITHDRAWN").count(), 1);
}

#[test]
fn refund_with_nothing_owed() {
    let buyer = Principal::repeat(1);
    let (_, mut engine) = settled_engine(buyer, PRICE * 3);
    assert_eq!(
        engine.take_refund(buyer).unwrap_err(),
        SaleError::NothingToWithdraw
    );
    assert_eq!(
        engine.take_refund(Principal::repeat(9)).unwrap_err(),
        SaleError::NothingToWithdraw
    );
}
