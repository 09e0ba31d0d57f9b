//! Minimal bid data structure.
//!
//! Contains only the revealed fields that take part in the clearing. The
//! registry converts its full bid records to this format before ranking.

use {
    crate::primitives::{Address, U256},
    std::cmp::{Ordering, Reverse},
};

/// A revealed bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bid {
    pub bidder: Address,
    /// Offered rate, lower is better for the asker.
    pub rate: U256,
    /// Maximum value the bidder is willing to lend.
    pub value: U256,
    /// Stake posted with the bid. Breaks ties between equal rates.
    pub celer_value: U256,
}

impl Bid {
    /// Key that totally orders bids from best to worst.
    ///
    /// Lower rate first, then higher stake. Bids with equal rate and stake
    /// are ordered by bidder address so every party sorts identically.
    fn priority_key(&self) -> (U256, Reverse<U256>, Address) {
        (self.rate, Reverse(self.celer_value), self.bidder)
    }

    /// Compares two bids by their clearing priority. [`Ordering::Less`] means
    /// `self` gets filled before `other`.
    pub fn priority(&self, other: &Self) -> Ordering {
        self.priority_key().cmp(&other.priority_key())
    }

    /// Whether `self` is filled strictly before `other`.
    pub fn outranks(&self, other: &Self) -> bool {
        self.priority(other).is_lt()
    }
}
