//! Serializable snapshot of a sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokensale_ingress::{AllowListCapability, OwnerCapability};
use tokensale_settlement::ValueTransfer;
use tokensale_types::{Allocation, Principal, SaleId, SalePhase, SaleTerms, TokenAmount, Wei};

use crate::clock::Clock;
use crate::events::EventSink;
use crate::sale::TokenSale;

/// What an observer needs to audit a sale at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReport {
    pub sale_id: SaleId,
    pub captured_at: DateTime<Utc>,
    pub phase: SalePhase,
    pub owner: Principal,
    pub terms: SaleTerms,
    pub buyers: usize,
    pub total_contributed: Wei,
    pub issuer_holding: TokenAmount,
    pub proceeds_owed: Wei,
    pub allocations: Vec<Allocation>,
    /// Hex-encoded settlement digest, once distributed.
    pub settlement_digest: Option<String>,
    /// Whether token and ether conservation held at capture time.
    pub conserved: bool,
}

impl SaleReport {
    pub(crate) fn capture<C, T, E, O, A>(sale: &TokenSale<C, T, E, O, A>) -> Self
    where
        C: Clock,
        T: ValueTransfer,
        E: EventSink,
        O: OwnerCapability,
        A: AllowListCapability,
    {
        Self {
            sale_id: sale.id(),
            captured_at: sale.now(),
            phase: sale.phase(),
            owner: sale.owner(),
            terms: sale.terms().clone(),
            buyers: sale.buyer_count(),
            total_contributed: sale.total_contributed(),
            issuer_holding: sale.issuer_holding(),
            proceeds_owed: sale.proceeds_owed(),
            allocations: sale.allocations().to_vec(),
            settlement_digest: sale.settlement_digest().map(hex::encode),
            conserved: sale.verify_conservation().is_ok(),
        }
    }

    /// Tokens granted across all allocation lines.
    #[must_use]
    pub fn tokens_granted(&self) -> TokenAmount {
        self.allocations.iter().map(|a| a.granted_tokens).sum()
    }
}
