//! Immutable terms of a sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SaleError, TokenAmount, Wei};

/// Window, supply and price of a sale. Validated once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTerms {
    /// First instant at which purchases are accepted.
    pub sale_start: DateTime<Utc>,
    /// Last instant at which purchases are accepted (inclusive).
    pub sale_end: DateTime<Utc>,
    /// Whole tokens on offer, pre-minted to the issuer.
    pub total_supply: TokenAmount,
    /// Price of one whole token in wei.
    pub unit_price: Wei,
}

impl SaleTerms {
    /// Validate and build sale terms.
    ///
    /// Checks run in order: timing, supply, price.
    ///
    /// # Errors
    /// - `InvalidTiming` if `sale_start <= now` or `sale_end <= sale_start`
    /// - `InvalidSupply` if `total_supply == 0` or `unit_price * total_supply`
    ///   does not fit in a `u128`
    /// - `InvalidPrice` if `unit_price == 0`
    pub fn new(
        now: DateTime<Utc>,
        sale_start: DateTime<Utc>,
        sale_end: DateTime<Utc>,
        total_supply: TokenAmount,
        unit_price: Wei,
    ) -> Result<Self> {
        if sale_start <= now {
            return Err(SaleError::InvalidTiming {
                reason: "Start of the sale must be in the future".to_string(),
            });
        }
        if sale_end <= sale_start {
            return Err(SaleError::InvalidTiming {
                reason: "End of the sale must come after the start".to_string(),
            });
        }
        if total_supply == 0 {
            return Err(SaleError::InvalidSupply {
                reason: "There must be more than 0 tokens for sale".to_string(),
            });
        }
        if unit_price == 0 {
            return Err(SaleError::InvalidPrice);
        }
        if unit_price.checked_mul(total_supply).is_none() {
            return Err(SaleError::InvalidSupply {
                reason: format!("value capacity {total_supply} x {unit_price} wei overflows"),
            });
        }

        Ok(Self {
            sale_start,
            sale_end,
            total_supply,
            unit_price,
        })
    }

    /// Total wei the sale can absorb: `unit_price * total_supply`.
    ///
    /// Never overflows: construction rejects terms where it would.
    #[must_use]
    pub fn value_capacity(&self) -> Wei {
        self.unit_price.saturating_mul(self.total_supply)
    }

    /// Whether `now` falls inside the purchase window (both ends inclusive).
    #[must_use]
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.sale_start && now <= self.sale_end
    }
}

/// Fixture terms for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl SaleTerms {
    /// Start one month after `now`, end two months after, at the given supply and price.
    pub fn dummy(now: DateTime<Utc>, total_supply: TokenAmount, unit_price: Wei) -> Self {
        let month = chrono::Duration::seconds(crate::constants::ONE_MONTH_SECS);
        Self::new(now, now + month, now + month * 2, total_supply, unit_price)
            .expect("dummy terms are valid")
    }
}
