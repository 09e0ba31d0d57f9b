//! Winner selection arbitrator.
//!
//! Fills the requested loan value with the cheapest revealed bids. Bids are
//! ranked by ascending rate (ties broken by higher stake, then by bidder
//! address) and accepted in that order until the requested value is covered.
//! The first bid that is no longer needed is the *top loser*: the boundary
//! marker a challenger is compared against. When every bid gets accepted the
//! last winner doubles as the boundary.
//!
//! The last accepted winner may offer more than the remaining value. Only
//! [`fill`] decides how much of each winner is actually lent, so the boundary
//! winner can end up partially filled.

use {
    crate::{
        bid::Bid,
        primitives::{Address, U256},
    },
    itertools::Itertools,
};

/// Auction arbitrator responsible for selecting winning bids.
#[derive(Debug, Clone, Copy)]
pub struct Arbitrator {
    /// Loan value requested by the asker.
    pub value: U256,
}

impl Arbitrator {
    pub fn new(value: U256) -> Self {
        Self { value }
    }

    /// Runs the clearing on the revealed bids.
    pub fn arbitrate(&self, bids: impl IntoIterator<Item = Bid>) -> Ranking {
        let sorted = bids.into_iter().sorted_by(Bid::priority).collect_vec();

        let mut filled = U256::ZERO;
        let mut top_loser = None;
        let mut ranked = Vec::with_capacity(sorted.len());
        for bid in sorted {
            let rank = if top_loser.is_some() {
                Rank::Loser
            } else if filled >= self.value {
                top_loser = Some(bid.bidder);
                Rank::TopLoser
            } else {
                filled = filled.saturating_add(bid.value);
                Rank::Winner
            };
            ranked.push(RankedBid { bid, rank });
        }

        // Exhausting the bids without covering the value makes the last
        // winner the boundary.
        if top_loser.is_none() {
            top_loser = ranked.last().map(|ranked| ranked.bid.bidder);
        }

        tracing::debug!(
            value = %self.value,
            bids = ranked.len(),
            ?top_loser,
            "ranked bids"
        );

        Ranking {
            value: self.value,
            ranked,
            top_loser,
        }
    }
}

/// How a bid ended up in the clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Winner,
    /// Best bid that wasn't needed to cover the requested value.
    TopLoser,
    Loser,
}

/// A bid with its ranking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedBid {
    pub bid: Bid,
    pub rank: Rank,
}

impl RankedBid {
    pub fn is_winner(&self) -> bool {
        matches!(self.rank, Rank::Winner)
    }
}

/// Final ranking of all revealed bids, ordered from best to worst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    value: U256,
    ranked: Vec<RankedBid>,
    top_loser: Option<Address>,
}

impl Ranking {
    /// All bids, best first.
    pub fn ranked(&self) -> &[RankedBid] {
        &self.ranked
    }

    /// All winning bids in fill order.
    pub fn winners(&self) -> impl Iterator<Item = &Bid> {
        self.ranked
            .iter()
            .filter(|ranked| ranked.is_winner())
            .map(|ranked| &ranked.bid)
    }

    /// Winning bidders in fill order. This is what gets claimed.
    pub fn winner_addresses(&self) -> Vec<Address> {
        self.winners().map(|bid| bid.bidder).collect()
    }

    /// The boundary bidder. `None` only if there were no bids at all.
    pub fn top_loser(&self) -> Option<Address> {
        self.top_loser
    }

    /// Value lent by each winner, in fill order.
    pub fn fills(&self) -> Vec<U256> {
        fill(self.value, self.winners().map(|bid| bid.value))
    }
}

/// Distributes `value` over `offers` in order. Every offer is taken in full
/// until the remaining value is smaller than the offer, which then gets
/// partially filled. Offers after that receive nothing.
pub fn fill(value: U256, offers: impl IntoIterator<Item = U256>) -> Vec<U256> {
    let mut remaining = value;
    offers
        .into_iter()
        .map(|offer| {
            let amount = offer.min(remaining);
            remaining -= amount;
            amount
        })
        .collect()
}
