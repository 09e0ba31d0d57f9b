//! Contains models that are shared between the ledgers, the auction registry
//! and off-chain tooling.

pub mod events;
pub mod u256_decimal;

pub use alloy::primitives::{Address, U256};
use {
    derive_more::{Display, From, Into},
    serde::{Deserialize, Serialize},
};

/// Sequential identifier of an auction. The first auction gets id 0.
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
pub struct AuctionId(pub u64);

impl AuctionId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Identifier of a commitment. Unique across owners.
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
pub struct CommitmentId(pub u64);

impl CommitmentId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A token that can be committed, borrowed, staked or pledged. The zero
/// address stands for the chain's native asset.
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
pub struct TokenAddress(pub Address);

impl TokenAddress {
    pub const NATIVE: Self = Self(Address::ZERO);

    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }
}
