//! # tokensale-ingress
//!
//! **Purchase intake plane**: who may act, and what they paid.
//!
//! ## Architecture
//!
//! Ingress sits between the caller and settlement:
//! 1. **OwnerCapability**: single designated principal; guards privileged calls
//! 2. **AllowListCapability**: set of principals eligible to buy; owner-mutated
//! 3. **SaleLedger**: per-buyer cumulative contribution plus the first-seen
//!    buyer order that settlement consumes
//!
//! ## Purchase Flow
//!
//! ```text
//! caller → AllowList.require_allowed() → window check → amount check
//!        → capacity check → SaleLedger.record()
//! ```
//!
//! No tokens move at purchase time; allocation is deferred to settlement.

pub mod allow_list;
pub mod owner;
pub mod sale_ledger;

pub use allow_list::{AllowList, AllowListCapability};
pub use owner::{OwnerCapability, SingleOwner};
pub use sale_ledger::SaleLedger;
