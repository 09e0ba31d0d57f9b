//! JSON shapes of the `winners` command.

use {
    model::u256_decimal::DecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
    winner_selection::{Address, Arbitrator, U256},
};

/// Revealed bids of a single auction.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Auction {
    #[serde_as(as = "DecimalU256")]
    pub value: U256,
    pub bids: Vec<Bid>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Bid {
    pub bidder: Address,
    #[serde_as(as = "DecimalU256")]
    pub rate: U256,
    #[serde_as(as = "DecimalU256")]
    pub value: U256,
    #[serde_as(as = "DecimalU256")]
    pub celer_value: U256,
}

impl Auction {
    pub fn rank(self) -> Ranking {
        let bids = self.bids.into_iter().map(|bid| winner_selection::Bid {
            bidder: bid.bidder,
            rate: bid.rate,
            value: bid.value,
            celer_value: bid.celer_value,
        });
        Ranking::new(&Arbitrator::new(self.value).arbitrate(bids))
    }
}

/// The winner set an honest asker would claim.
#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub winners: Vec<Address>,
    pub top_loser: Option<Address>,
    /// Value lent by each winner, in winner order.
    #[serde_as(as = "Vec<DecimalU256>")]
    pub fills: Vec<U256>,
}

impl Ranking {
    pub fn new(ranking: &winner_selection::Ranking) -> Self {
        Self {
            winners: ranking.winner_addresses(),
            top_loser: ranking.top_loser(),
            fills: ranking.fills(),
        }
    }
}
