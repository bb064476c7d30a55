//! System-wide constants for the token sale ledger.

/// Number of decimal places in one ether.
pub const ETHER_DECIMALS: u32 = 18;

/// Wei per ether (10^18).
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Thirty days in seconds. Deployment offsets are expressed in these units.
pub const ONE_MONTH_SECS: i64 = 30 * 24 * 60 * 60;

/// Default delay between deployment and the start of the sale window.
pub const DEFAULT_START_OFFSET_SECS: i64 = ONE_MONTH_SECS;

/// Default length of the sale window.
pub const DEFAULT_DURATION_SECS: i64 = ONE_MONTH_SECS;

/// Default number of whole tokens on offer.
pub const DEFAULT_TOTAL_SUPPLY: u128 = 100_000;

/// Default price per token in wei (0.1 ether).
pub const DEFAULT_UNIT_PRICE_WEI: u128 = WEI_PER_ETHER / 10;

/// Domain separator for the settlement digest.
pub const SETTLEMENT_DIGEST_DOMAIN: &[u8] = b"tokensale:settlement:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TokenSale";
