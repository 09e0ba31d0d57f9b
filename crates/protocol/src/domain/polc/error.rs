use {
    crate::domain::assets,
    model::{CommitmentId, TokenAddress},
    winner_selection::{Address, U256},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("attached value must equal the amount for native commitments and be zero otherwise")]
    InvalidAmount,
    #[error("token address must be supported: {0}")]
    UnsupportedToken(TokenAddress),
    #[error("commitment {id} of {owner} does not exist")]
    CommitmentNotFound { owner: Address, id: CommitmentId },
    #[error("commitment lock must expire")]
    LockNotExpired,
    #[error("reward has already been withdrawn")]
    AlreadyWithdrawn,
    #[error("sender must be liba contract")]
    Unauthorized,
    #[error("commitment holds {actual}, not {requested}")]
    TokenMismatch {
        actual: TokenAddress,
        requested: TokenAddress,
    },
    #[error("commitment has {available} available, {requested} requested")]
    InsufficientAvailable { available: U256, requested: U256 },
    #[error("commitment has {reserved} reserved, {requested} requested")]
    InsufficientReserved { reserved: U256, requested: U256 },
    #[error("sender must be the ledger owner")]
    NotOwner,
    #[error("libaAddress can only be set once")]
    LibaAlreadySet,
    #[error("ledger is paused")]
    Paused,
    #[error("ledger is not paused")]
    NotPaused,
    #[error(transparent)]
    Assets(#[from] assets::Error),
}
