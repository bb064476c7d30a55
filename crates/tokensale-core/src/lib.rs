//! # tokensale-core
//!
//! The externally callable surface of a **TokenSale**.
//!
//! [`TokenSale`] owns one sale's state and wires the planes together:
//!
//! - [`tokensale_ingress`]: owner and allow-list capabilities, purchase ledger
//! - [`tokensale_settlement`]: end of sale, distribution, withdrawals, tokens
//!
//! Everything the host provides comes in through three seams:
//!
//! - [`Clock`]: the current time (`SystemClock`, or `ManualClock` in tests)
//! - [`ValueTransfer`](tokensale_settlement::ValueTransfer): ether payouts
//! - [`EventSink`]: notifications for off-chain observers
//!
//! ## Sale Lifecycle
//!
//! ```text
//!  NOT_STARTED ──(clock)──▶ ACTIVE ──end_sale──▶ ENDED ──distribute──▶ DISTRIBUTED
//!                            │                                          │
//!                        purchase                         withdraw / transfer
//! ```
//!
//! Every mutating call takes `&mut self`, so calls on one sale are
//! serialized and a payout in flight cannot be interleaved with another call.

pub mod clock;
pub mod events;
pub mod report;
pub mod sale;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventLog, EventSink};
pub use report::SaleReport;
pub use sale::TokenSale;
