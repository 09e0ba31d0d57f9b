//! Optimistic settlement of the winner set.
//!
//! The asker claims a winner set without any verification. During the
//! challenge period anyone can replace it by pointing at a single bidder the
//! current set wrongly leaves out. Whatever set is stored when the auction
//! gets finalized is what gets lent against.

use winner_selection::Address;

/// Winning bidders in fill order together with the boundary bidder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinnerSet {
    pub winners: Vec<Address>,
    pub top_loser: Address,
}

impl WinnerSet {
    pub fn contains(&self, bidder: &Address) -> bool {
        self.winners.contains(bidder)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Settlement {
    #[default]
    Unclaimed,
    /// Set declared by the asker.
    Claimed(WinnerSet),
    /// Set supplied by the latest successful challenger.
    Challenged {
        challenger: Address,
        winners: WinnerSet,
    },
}

impl Settlement {
    /// The currently accepted winner set, if any was declared.
    pub fn winner_set(&self) -> Option<&WinnerSet> {
        match self {
            Self::Unclaimed => None,
            Self::Claimed(winners) | Self::Challenged { winners, .. } => Some(winners),
        }
    }

    pub fn winners(&self) -> &[Address] {
        self.winner_set()
            .map(|set| set.winners.as_slice())
            .unwrap_or_default()
    }

    pub fn top_loser(&self) -> Option<Address> {
        self.winner_set().map(|set| set.top_loser)
    }
}
