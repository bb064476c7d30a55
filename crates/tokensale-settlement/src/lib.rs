//! # tokensale-settlement
//!
//! **Finality Plane**: closing the sale, converting contributions into
//! whole-token allocations, and paying out what settlement decided.
//!
//! ## Architecture
//!
//! The Finality Plane consumes the ordered [`SaleLedger`] from ingress and:
//! 1. Closes the sale (`end_sale`, one-way)
//! 2. Walks buyers in first-purchase order, granting
//!    `min(contribution / price, remaining_supply)` tokens each
//! 3. Writes token balances, per-buyer refunds and issuer proceeds
//! 4. Burns the issuer's unsold holding
//! 5. Checks token and ether conservation
//!
//! Payouts are take-then-send: a balance is zeroed before the external
//! value transfer runs, so anything observed during the transfer sees zero.
//!
//! [`SaleLedger`]: tokensale_ingress::SaleLedger

pub mod digest;
pub mod engine;
pub mod supply_conservation;
pub mod token_ledger;
pub mod withdraw;

pub use digest::{compute_settlement_digest, verify_settlement_digest};
pub use engine::{DistributionSummary, SettlementEngine};
pub use supply_conservation::SupplyConservation;
pub use token_ledger::TokenLedger;
pub use withdraw::{Payout, PayoutKind, RecordingTransfer, ValueTransfer, WithdrawalBook};
