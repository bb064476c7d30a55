//! Sale lifecycle phases.
//!
//! A sale moves through four phases and never moves backwards:
//! **NOT_STARTED → ACTIVE → ENDED → DISTRIBUTED**
//!
//! NOT_STARTED → ACTIVE is derived from the clock; there is no stored
//! transition. ACTIVE → ENDED (`end_sale`) and ENDED → DISTRIBUTED
//! (`distribute`) are explicit one-way writes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SaleTerms;

/// The four phases of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SalePhase {
    /// Before `sale_start`.
    NotStarted,
    /// Window open (or closed by time but not yet explicitly ended).
    Active,
    /// `end_sale` has run; purchases are closed for good.
    Ended,
    /// `distribute` has run; balances, refunds and proceeds are final.
    Distributed,
}

impl fmt::Display for SalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Ended => write!(f, "ENDED"),
            Self::Distributed => write!(f, "DISTRIBUTED"),
        }
    }
}

impl SalePhase {
    /// Resolve the current phase from the clock and the last explicit write.
    ///
    /// `recorded` is `None` until `end_sale` runs. An explicit write always
    /// wins over the clock.
    #[must_use]
    pub fn resolve(now: DateTime<Utc>, terms: &SaleTerms, recorded: Option<Self>) -> Self {
        match recorded {
            Some(phase) => phase,
            None if now < terms.sale_start => Self::NotStarted,
            None => Self::Active,
        }
    }

    /// Whether `end_sale` has already run.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Ended | Self::Distributed)
    }

    /// Whether the explicit `self → next` write is allowed.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted | Self::Active, Self::Ended) | (Self::Ended, Self::Distributed)
        )
    }
}
