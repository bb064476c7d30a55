//! Notifications emitted by a sale for external observers.
//!
//! Every state change that an off-chain consumer may care about produces a
//! [`SaleEvent`]. Persisting or indexing them is the consumer's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Principal, SaleId, TokenAmount, Wei};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEventKind {
    /// The owner changed a principal's allow-list membership.
    AllowListUpdated { principal: Principal, allowed: bool },
    /// A purchase was accepted into the ledger.
    Purchased {
        buyer: Principal,
        amount: Wei,
        contribution: Wei,
    },
    /// `end_sale` ran. Carries no payload beyond the sale identity.
    SaleEnded,
    /// `distribute` ran.
    Distributed {
        buyers: usize,
        tokens_granted: TokenAmount,
        tokens_burned: TokenAmount,
        proceeds: Wei,
    },
    /// The issuer collected proceeds.
    ProceedsWithdrawn { issuer: Principal, amount: Wei },
    /// A buyer collected a refund.
    RefundWithdrawn { buyer: Principal, amount: Wei },
    /// Tokens moved between holders after distribution.
    TokensTransferred {
        from: Principal,
        to: Principal,
        amount: TokenAmount,
    },
}

impl SaleEventKind {
    /// Stable upper-case name, used as the log/event label.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllowListUpdated { .. } => "ALLOW_LIST_UPDATED",
            Self::Purchased { .. } => "PURCHASED",
            Self::SaleEnded => "SALE_ENDED",
            Self::Distributed { .. } => "DISTRIBUTED",
            Self::ProceedsWithdrawn { .. } => "PROCEEDS_WITHDRAWN",
            Self::RefundWithdrawn { .. } => "REFUND_WITHDRAWN",
            Self::TokensTransferred { .. } => "TOKENS_TRANSFERRED",
        }
    }
}

impl std::fmt::Display for SaleEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A notification stamped with the emitting sale and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    /// The sale that emitted this event.
    pub sale_id: SaleId,
    /// What happened.
    pub kind: SaleEventKind,
    /// Clock reading at emission.
    pub emitted_at: DateTime<Utc>,
}

impl SaleEvent {
    #[must_use]
    pub fn new(sale_id: SaleId, kind: SaleEventKind, emitted_at: DateTime<Utc>) -> Self {
        Self {
            sale_id,
            kind,
            emitted_at,
        }
    }
}
