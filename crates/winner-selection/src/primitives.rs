//! Primitive types for winner selection.

pub use alloy::primitives::{Address, B256, U256};

/// Bid rates are quoted in per-mille of the lent value per day of loan.
pub const RATE_DENOMINATOR: u64 = 1_000;

/// Interest owed on `principal` lent at `rate` for `days`.
///
/// Formula: `principal * rate * days / 1000`
pub fn interest(principal: U256, rate: U256, days: u64) -> U256 {
    principal
        .saturating_mul(rate)
        .saturating_mul(U256::from(days))
        / U256::from(RATE_DENOMINATOR)
}
