use {
    crate::domain::{assets, polc},
    model::{AuctionId, TokenAddress},
    winner_selection::U256,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("auction {0} does not exist")]
    AuctionNotFound(AuctionId),

    // Period violations.
    #[error("must be within bid duration")]
    NotInBidPeriod,
    #[error("must be within reveal duration")]
    NotInRevealPeriod,
    #[error("must be within claim duration")]
    NotInClaimPeriod,
    #[error("must be within challenge duration")]
    NotInChallengePeriod,
    #[error("must be within finalize duration")]
    NotInFinalizePeriod,
    #[error("lending period must end")]
    LendingNotEnded,

    // Authorization and state violations.
    #[error("sender must be the registry owner")]
    NotOwner,
    #[error("sender must be in whitelist")]
    NotWhitelisted,
    #[error("sender must be the auction asker")]
    NotAsker,
    #[error("must be valid challenger")]
    InvalidChallenger,
    #[error("sender must be a winner")]
    NotAWinner,
    #[error("bid does not exist")]
    BidNotFound,
    #[error("bid is already revealed")]
    AlreadyRevealed,
    #[error("auction is already finalized")]
    AlreadyFinalized,
    #[error("auction must be finalized")]
    NotFinalized,
    #[error("auction is already repaid")]
    AlreadyRepaid,
    #[error("collateral is already collected")]
    AlreadyCollected,
    #[error("auction has no collateral to collect")]
    NothingToCollect,
    #[error("deposit is already transferred")]
    AlreadyTransferred,
    #[error("stake is locked until the loan settles")]
    StakeLocked,
    #[error("nothing to withdraw")]
    NothingToWithdraw,
    #[error("registry is paused")]
    Paused,
    #[error("registry is not paused")]
    NotPaused,

    // Value and accounting violations.
    #[error("rate must be smaller than maxRate")]
    RateTooHigh,
    #[error("value must be larger than minValue")]
    ValueTooLow,
    #[error("hash must be same as the bid hash")]
    HashMismatch,
    #[error("must have enough value in commitment")]
    InsufficientCommitment,
    #[error("stake {stake} is below the minimum of {minimum}")]
    StakeTooLow { stake: U256, minimum: U256 },
    #[error("repayment of {provided} does not cover {required}")]
    InsufficientRepayment { required: U256, provided: U256 },
    #[error("attached native value does not match the call")]
    InvalidAmount,
    #[error("token address must be supported: {0}")]
    UnsupportedToken(TokenAddress),
    #[error("durations must be non-zero")]
    ZeroDuration,
    #[error("period boundaries must fit in a block number")]
    DurationOverflow,

    #[error(transparent)]
    Ledger(#[from] polc::Error),
    #[error(transparent)]
    Assets(#[from] assets::Error),
}
