//! Deployment configuration for a sale.
//!
//! A [`SaleConfig`] describes a sale relative to its deployment time; it is
//! turned into concrete [`SaleTerms`] with [`SaleConfig::terms_at`].

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SaleError, SaleTerms, TokenAmount, Wei, constants};

/// Relative sale parameters, as written in a deployment config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleConfig {
    /// Seconds between deployment and the opening of the window.
    pub start_offset_secs: i64,
    /// Length of the window in seconds.
    pub duration_secs: i64,
    /// Whole tokens on offer.
    pub total_supply: TokenAmount,
    /// Price of one token in ether (e.g. `"0.1"`).
    pub unit_price_ether: Decimal,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            start_offset_secs: constants::DEFAULT_START_OFFSET_SECS,
            duration_secs: constants::DEFAULT_DURATION_SECS,
            total_supply: constants::DEFAULT_TOTAL_SUPPLY,
            unit_price_ether: Decimal::new(1, 1), // 0.1 ether
        }
    }
}

impl SaleConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Unit price converted to wei.
    ///
    /// # Errors
    /// `Configuration` if the price is negative, has more than 18 fractional
    /// digits, or does not fit in a `u128`.
    pub fn unit_price_wei(&self) -> Result<Wei> {
        ether_to_wei(self.unit_price_ether)
    }

    /// Build concrete terms for a deployment happening at `now`.
    ///
    /// Validation of the resulting terms is the same as for hand-built terms,
    /// so a zero offset yields `InvalidTiming` and a zero price `InvalidPrice`.
    /// Offsets that leave chrono's date range yield `Configuration`.
    pub fn terms_at(&self, now: DateTime<Utc>) -> Result<SaleTerms> {
        let sale_start = offset_by(now, self.start_offset_secs)?;
        let sale_end = offset_by(sale_start, self.duration_secs)?;
        SaleTerms::new(
            now,
            sale_start,
            sale_end,
            self.total_supply,
            self.unit_price_wei()?,
        )
    }
}

/// `at` moved by `secs` seconds.
///
/// # Errors
/// `Configuration` if the result is not a representable timestamp.
pub fn offset_by(at: DateTime<Utc>, secs: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_seconds(secs)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| {
            SaleError::Configuration(format!("offset of {secs}s from {at} is out of range"))
        })
}

/// Convert an ether amount to wei exactly.
pub fn ether_to_wei(ether: Decimal) -> Result<Wei> {
    if ether.is_sign_negative() && !ether.is_zero() {
        return Err(SaleError::Configuration(format!(
            "negative ether amount {ether}"
        )));
    }
    let normalized = ether.normalize();
    if normalized.scale() > constants::ETHER_DECIMALS {
        return Err(SaleError::Configuration(format!(
            "{ether} has more than {} fractional digits",
            constants::ETHER_DECIMALS
        )));
    }
    let mantissa = normalized.mantissa().unsigned_abs();
    let factor = 10u128.pow(constants::ETHER_DECIMALS - normalized.scale());
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| SaleError::Configuration(format!("{ether} ether overflows wei")))
}

/// Render a wei amount as ether, for reports and log lines.
#[must_use]
pub fn wei_to_ether(wei: Wei) -> Decimal {
    let whole = wei / constants::WEI_PER_ETHER;
    let frac = wei % constants::WEI_PER_ETHER;
    let whole = Decimal::from_i128_with_scale(i128::try_from(whole).unwrap_or(i128::MAX), 0);
    let frac = Decimal::from_i128_with_scale(
        i128::try_from(frac).unwrap_or_default(),
        constants::ETHER_DECIMALS,
    );
    (whole + frac).normalize()
}
