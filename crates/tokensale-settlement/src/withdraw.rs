//! Withdrawable ether and take-then-send payouts.
//!
//! Settlement writes two ledgers: the issuer's proceeds and each buyer's
//! refund. Paying either out is split in two steps:
//!
//! 1. **take**: read the balance and zero it, producing a [`Payout`]
//! 2. **send**: hand the payout to the host's [`ValueTransfer`]
//!
//! Nothing reads the balance between the two steps, so a withdrawal
//! attempted while a payout is in flight observes zero. If the send fails
//! the payout is restored and the ledger is exactly as before.

use std::collections::HashMap;

use tokensale_types::{Principal, Result, SaleError, Wei};

/// The host's ether transfer primitive.
pub trait ValueTransfer {
    /// Send `amount` wei to `to`.
    ///
    /// # Errors
    /// `TransferFailed` if the host rejects the transfer.
    fn send(&mut self, to: Principal, amount: Wei) -> Result<()>;
}

/// Which ledger a payout was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutKind {
    Proceeds,
    Refund,
}

/// A balance that has been zeroed and is on its way to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a taken payout must be sent or restored"]
pub struct Payout {
    pub kind: PayoutKind,
    pub recipient: Principal,
    pub amount: Wei,
}

/// Ether owed after distribution: one proceeds scalar, one refund per buyer.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalBook {
    /// Whether distribution has written the book.
    open: bool,
    /// Wei owed to the issuer.
    proceeds: Wei,
    /// Wei owed back to each buyer.
    refunds: HashMap<Principal, Wei>,
}

impl WithdrawalBook {
    /// Create an empty, closed book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the book as written; withdrawals are accepted from now on.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Add `amount` to the issuer's proceeds.
    pub fn credit_proceeds(&mut self, amount: Wei) {
        self.proceeds += amount;
    }

    /// Set (not accumulate) the refund owed to `buyer`.
    pub fn set_refund(&mut self, buyer: Principal, amount: Wei) {
        if amount == 0 {
            self.refunds.remove(&buyer);
        } else {
            self.refunds.insert(buyer, amount);
        }
    }

    /// Take the issuer's whole proceeds balance.
    ///
    /// A zero balance yields a zero payout rather than an error.
    ///
    /// # Errors
    /// `NotOver` if distribution has not run.
    pub fn take_proceeds(&mut self, issuer: Principal) -> Result<Payout> {
        if !self.open {
            return Err(SaleError::NotOver);
        }
        Ok(Payout {
            kind: PayoutKind::Proceeds,
            recipient: issuer,
            amount: std::mem::take(&mut self.proceeds),
        })
    }

    /// Take `buyer`'s whole refund balance.
    ///
    /// # Errors
    /// - `NotOver` if distribution has not run
    /// - `NothingToWithdraw` if nothing is owed to `buyer`
    pub fn take_refund(&mut self, buyer: Principal) -> Result<Payout> {
        if !self.open {
            return Err(SaleError::NotOver);
        }
        let amount = self
            .refunds
            .remove(&buyer)
            .ok_or(SaleError::NothingToWithdraw)?;
        Ok(Payout {
            kind: PayoutKind::Refund,
            recipient: buyer,
            amount,
        })
    }

    /// Put a payout back after a failed send.
    pub fn restore(&mut self, payout: Payout) {
        match payout.kind {
            PayoutKind::Proceeds => self.proceeds += payout.amount,
            PayoutKind::Refund => {
                if payout.amount > 0 {
                    *self.refunds.entry(payout.recipient).or_default() += payout.amount;
                }
            }
        }
    }

    /// Send a taken payout, restoring it if the transfer fails.
    ///
    /// Returns the amount sent. A zero payout is not handed to `transfer`.
    pub fn settle<T: ValueTransfer + ?Sized>(
        &mut self,
        payout: Payout,
        transfer: &mut T,
    ) -> Result<Wei> {
        if payout.amount == 0 {
            return Ok(0);
        }
        match transfer.send(payout.recipient, payout.amount) {
            Ok(()) => Ok(payout.amount),
            Err(err) => {
                tracing::warn!(
                    recipient = %payout.recipient,
                    amount = payout.amount,
                    error = %err,
                    "Payout failed; balance restored"
                );
                self.restore(payout);
                Err(err)
            }
        }
    }

    /// Wei currently owed to the issuer.
    #[must_use]
    pub fn proceeds_owed(&self) -> Wei {
        self.proceeds
    }

    /// Wei currently owed back to `buyer`.
    #[must_use]
    pub fn refund_of(&self, buyer: &Principal) -> Wei {
        self.refunds.get(buyer).copied().unwrap_or(0)
    }

    /// Sum of every outstanding refund.
    #[must_use]
    pub fn refunds_owed(&self) -> Wei {
        self.refunds.values().sum()
    }

    /// Everything still owed: proceeds plus refunds.
    #[must_use]
    pub fn total_owed(&self) -> Wei {
        self.proceeds + self.refunds_owed()
    }
}

/// In-memory [`ValueTransfer`] that records what each recipient received.
///
/// `fail_next` makes the next send fail once, for exercising restore paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransfer {
    received: HashMap<Principal, Wei>,
    sent: Wei,
    fail_next: bool,
}

impl RecordingTransfer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next send.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    /// Total wei `to` has received.
    #[must_use]
    pub fn received_by(&self, to: &Principal) -> Wei {
        self.received.get(to).copied().unwrap_or(0)
    }

    /// Total wei sent to anyone.
    #[must_use]
    pub fn total_sent(&self) -> Wei {
        self.sent
    }
}

impl ValueTransfer for RecordingTransfer {
    fn send(&mut self, to: Principal, amount: Wei) -> Result<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(SaleError::TransferFailed {
                reason: format!("recipient {to} rejected {amount} wei"),
            });
        }
        *self.received.entry(to).or_default() += amount;
        self.sent += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_book(buyer: Principal) -> WithdrawalBook {
        let mut book = WithdrawalBook::new();
        book.credit_proceeds(900);
        book.set_refund(buyer, 50);
        book.open();
        book
    }

    #[test]
    fn closed_book_rejects_withdrawals() {
        let mut book = WithdrawalBook::new();
        let p = Principal::random();
        assert_eq!(book.take_proceeds(p).unwrap_err(), SaleError::NotOver);
        assert_eq!(book.take_refund(p).unwrap_err(), SaleError::NotOver);
    }

    #[test]
    fn take_refund_zeroes_before_send() {
        let buyer = Principal::random();
        let mut book = open_book(buyer);
        let payout = book.take_refund(buyer).unwrap();
        assert_eq!(payout.amount, 50);

        // A nested withdrawal while the payout is in flight sees zero.
        assert_eq!(book.refund_of(&buyer), 0);
        assert_eq!(
            book.take_refund(buyer).unwrap_err(),
            SaleError::NothingToWithdraw
        );

        let mut transfer = RecordingTransfer::new();
        assert_eq!(book.settle(payout, &mut transfer).unwrap(), 50);
        assert_eq!(transfer.received_by(&buyer), 50);
    }

    #[test]
    fn take_proceeds_zeroes_before_send() {
        let issuer = Principal::random();
        let mut book = open_book(Principal::random());
        let payout = book.take_proceeds(issuer).unwrap();
        assert_eq!(payout.amount, 900);

        // A nested proceeds withdrawal is a zero payout.
        let nested = book.take_proceeds(issuer).unwrap();
        assert_eq!(nested.amount, 0);

        let mut transfer = RecordingTransfer::new();
        assert_eq!(book.settle(nested, &mut transfer).unwrap(), 0);
        assert_eq!(book.settle(payout, &mut transfer).unwrap(), 900);
        assert_eq!(transfer.total_sent(), 900);
    }

    #[test]
    fn refund_set_not_accumulated() {
        let buyer = Principal::random();
        let mut book = WithdrawalBook::new();
        book.set_refund(buyer, 10);
        book.set_refund(buyer, 7);
        assert_eq!(book.refund_of(&buyer), 7);
        book.set_refund(buyer, 0);
        assert_eq!(book.refund_of(&buyer), 0);
    }

    #[test]
    fn failed_send_restores_balance() {
        let buyer = Principal::random();
        let mut book = open_book(buyer);
        let mut transfer = RecordingTransfer::new();
        transfer.fail_next();

        let payout = book.take_refund(buyer).unwrap();
        let err = book.settle(payout, &mut transfer).unwrap_err();
        assert!(matches!(err, SaleError::TransferFailed { .. }));
        assert_eq!(book.refund_of(&buyer), 50);
        assert_eq!(transfer.total_sent(), 0);

        // Second attempt goes through.
        let payout = book.take_refund(buyer).unwrap();
        book.settle(payout, &mut transfer).unwrap();
        assert_eq!(book.refund_of(&buyer), 0);
        assert_eq!(transfer.received_by(&buyer), 50);
    }

    #[test]
    fn totals() {
        let buyer = Principal::random();
        let other = Principal::random();
        let mut book = open_book(buyer);
        book.set_refund(other, 25);
        assert_eq!(book.proceeds_owed(), 900);
        assert_eq!(book.refunds_owed(), 75);
        assert_eq!(book.total_owed(), 975);
    }
}
