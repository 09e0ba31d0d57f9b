use {
    model::{AuctionId, CommitmentId},
    std::collections::BTreeMap,
    winner_selection::{Address, B256, U256},
};

/// A sealed bid and, once revealed, its plaintext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    /// Commitment over the sealed fields. Zero once revealed.
    pub hash: B256,
    /// Stake posted with the bid.
    pub celer_value: U256,
    pub revealed: Option<Reveal>,
    /// Value currently held on the backing commitment.
    pub reserved_value: U256,
    /// Value lent at finalize. Zeroed once the winner collected collateral.
    pub lent_value: U256,
    pub stake_refunded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reveal {
    pub rate: U256,
    pub value: U256,
    pub commitment_id: CommitmentId,
}

impl Bid {
    pub fn sealed(hash: B256, celer_value: U256) -> Self {
        Self {
            hash,
            celer_value,
            revealed: None,
            reserved_value: U256::ZERO,
            lent_value: U256::ZERO,
            stake_refunded: false,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed.is_some()
    }

    /// The fields taking part in winner selection.
    pub fn selection(&self, bidder: Address) -> Option<winner_selection::Bid> {
        self.revealed.map(|reveal| winner_selection::Bid {
            bidder,
            rate: reveal.rate,
            value: reveal.value,
            celer_value: self.celer_value,
        })
    }
}

/// Bids indexed by auction and bidder.
#[derive(Clone, Debug, Default)]
pub struct Store {
    bids: BTreeMap<(AuctionId, Address), Bid>,
}

impl Store {
    pub fn get(&self, auction: AuctionId, bidder: Address) -> Option<&Bid> {
        self.bids.get(&(auction, bidder))
    }

    pub fn get_mut(&mut self, auction: AuctionId, bidder: Address) -> Option<&mut Bid> {
        self.bids.get_mut(&(auction, bidder))
    }

    pub fn insert(&mut self, auction: AuctionId, bidder: Address, bid: Bid) {
        self.bids.insert((auction, bidder), bid);
    }

    /// Revealed bids of an auction in the shape winner selection expects.
    pub fn revealed(&self, auction: AuctionId) -> Vec<winner_selection::Bid> {
        self.bids
            .range((auction, Address::ZERO)..=(auction, Address::repeat_byte(0xff)))
            .filter_map(|((_, bidder), bid)| bid.selection(*bidder))
            .collect()
    }
}
