//! Events emitted by the commitment ledger and the auction registry.
//!
//! The variant names are part of the public interface. Front-ends subscribe
//! to them by name, so they serialize verbatim into the `event` tag.

use {
    crate::{AuctionId, CommitmentId, TokenAddress, u256_decimal::DecimalU256},
    alloy::primitives::{Address, U256},
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum Event {
    NewCommitment {
        owner: Address,
        commitment_id: CommitmentId,
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    WithdrawFund {
        owner: Address,
        commitment_id: CommitmentId,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    WithdrawReward {
        owner: Address,
        commitment_id: CommitmentId,
        #[serde_as(as = "DecimalU256")]
        reward: U256,
    },
    DrainToken {
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        amount: U256,
    },
    NewAuction {
        auction_id: AuctionId,
        asker: Address,
    },
    NewBid {
        auction_id: AuctionId,
        bidder: Address,
    },
    UpdateBid {
        auction_id: AuctionId,
        bidder: Address,
    },
    RevealBid {
        auction_id: AuctionId,
        bidder: Address,
    },
    ClaimWinners {
        auction_id: AuctionId,
        winners: Vec<Address>,
        top_loser: Address,
    },
    ChallengeWinners {
        auction_id: AuctionId,
        challenger: Address,
        winners: Vec<Address>,
        top_loser: Address,
    },
    FinalizeAuction {
        auction_id: AuctionId,
        #[serde_as(as = "DecimalU256")]
        lent_value: U256,
    },
    RepayAuction {
        auction_id: AuctionId,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    CollectCollateral {
        auction_id: AuctionId,
        winner: Address,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    TransferFeeDeposit {
        auction_id: AuctionId,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
}

impl Event {
    /// The stable event name.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The auction this event belongs to, if any.
    pub fn auction_id(&self) -> Option<AuctionId> {
        match self {
            Self::NewAuction { auction_id, .. }
            | Self::NewBid { auction_id, .. }
            | Self::UpdateBid { auction_id, .. }
            | Self::RevealBid { auction_id, .. }
            | Self::ClaimWinners { auction_id, .. }
            | Self::ChallengeWinners { auction_id, .. }
            | Self::FinalizeAuction { auction_id, .. }
            | Self::RepayAuction { auction_id, .. }
            | Self::CollectCollateral { auction_id, .. }
            | Self::TransferFeeDeposit { auction_id, .. } => Some(*auction_id),
            Self::NewCommitment { .. }
            | Self::WithdrawFund { .. }
            | Self::WithdrawReward { .. }
            | Self::DrainToken { .. } => None,
        }
    }
}
