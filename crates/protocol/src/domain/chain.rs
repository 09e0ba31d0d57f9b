use {
    derive_more::{Display, From, Into},
    serde::{Deserialize, Serialize},
    std::ops::{Add, AddAssign},
};

/// Seconds in a day. Commitment locks and loan terms are counted in days.
pub const DAY: u64 = 86_400;

/// A block number.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct BlockNo(pub u64);

impl BlockNo {
    pub fn checked_add(self, blocks: u64) -> Option<Self> {
        self.0.checked_add(blocks).map(Self)
    }
}

impl Add<u64> for BlockNo {
    type Output = BlockNo;

    fn add(self, rhs: u64) -> Self::Output {
        BlockNo(self.0.saturating_add(rhs))
    }
}

impl AddAssign<u64> for BlockNo {
    fn add_assign(&mut self, rhs: u64) {
        *self = *self + rhs;
    }
}

/// The time source every call observes. Auction periods are measured in
/// blocks, commitment locks and loan terms in wall clock time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    pub block: BlockNo,
    /// Unix timestamp of the current block.
    pub timestamp: u64,
}

impl Chain {
    /// Number of whole days elapsed since the epoch.
    pub fn day(&self) -> u64 {
        self.timestamp / DAY
    }

    /// The first day boundary at or after the current timestamp. Commitment
    /// locks start there.
    pub fn next_day(&self) -> u64 {
        self.timestamp.div_ceil(DAY)
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block += blocks;
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }
}
