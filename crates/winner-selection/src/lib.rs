//! Winner selection for sealed-bid lending auctions.
//!
//! This crate contains only what's needed to run the clearing algorithm and
//! to compute bid commitments. The auction registry uses it to settle loans
//! and any off-chain party (the asker claiming winners, a lender preparing a
//! challenge) links the exact same code, so every participant derives the
//! same winner set from the same revealed bids.

pub mod arbitrator;
pub mod bid;
pub mod bid_hash;
pub mod primitives;

// Re-export key types for convenience
pub use {
    arbitrator::{Arbitrator, Rank, RankedBid, Ranking, fill},
    bid::Bid,
    bid_hash::bid_hash,
    primitives::{Address, B256, U256, interest},
};
