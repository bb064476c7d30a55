//! # tokensale-types
//!
//! Shared types, errors, and configuration for the **TokenSale** ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Principal`], [`SaleId`]
//! - **Sale model**: [`SaleTerms`], [`SalePhase`]
//! - **Settlement model**: [`Allocation`], [`Wei`], [`TokenAmount`]
//! - **Notifications**: [`SaleEvent`], [`SaleEventKind`]
//! - **Configuration**: [`SaleConfig`]
//! - **Errors**: [`SaleError`] with `TS_ERR_` prefix codes
//! - **Constants**: unit conversions and deployment defaults

pub mod allocation;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod phase;
pub mod terms;

// Re-export all primary types at crate root for ergonomic imports:
//   use tokensale_types::{Principal, SaleTerms, SalePhase, ...};

pub use allocation::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use phase::*;
pub use terms::*;

// Constants are accessed via `tokensale_types::constants::FOO`
// (not re-exported to avoid name collisions).
