use {
    super::Error,
    crate::domain::BlockNo,
    serde::{Deserialize, Serialize},
};

/// Lengths of the auction periods in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Durations {
    pub bid: u64,
    pub reveal: u64,
    pub claim: u64,
    pub challenge: u64,
    pub finalize: u64,
}

/// End blocks of the auction periods. Each period ends where the next one
/// starts, so the boundaries are strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Periods {
    pub bid_end: BlockNo,
    pub reveal_end: BlockNo,
    pub claim_end: BlockNo,
    pub challenge_end: BlockNo,
    pub finalize_end: BlockNo,
}

impl Periods {
    pub fn new(start: BlockNo, durations: Durations) -> Result<Self, Error> {
        let Durations {
            bid,
            reveal,
            claim,
            challenge,
            finalize,
        } = durations;
        if [bid, reveal, claim, challenge, finalize].contains(&0) {
            return Err(Error::ZeroDuration);
        }

        let end = |from: BlockNo, blocks: u64| {
            from.checked_add(blocks).ok_or(Error::DurationOverflow)
        };
        let bid_end = end(start, bid)?;
        let reveal_end = end(bid_end, reveal)?;
        let claim_end = end(reveal_end, claim)?;
        let challenge_end = end(claim_end, challenge)?;
        let finalize_end = end(challenge_end, finalize)?;
        Ok(Self {
            bid_end,
            reveal_end,
            claim_end,
            challenge_end,
            finalize_end,
        })
    }

    /// The period `block` falls into.
    pub fn at(&self, block: BlockNo) -> Period {
        if block < self.bid_end {
            Period::Bid
        } else if block < self.reveal_end {
            Period::Reveal
        } else if block < self.claim_end {
            Period::Claim
        } else if block < self.challenge_end {
            Period::Challenge
        } else if block < self.finalize_end {
            Period::Finalize
        } else {
            Period::Expired
        }
    }
}

/// Where an auction is in its lifecycle. Never stored, always derived from
/// the period boundaries, the current block and the finalized flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Period {
    Bid,
    Reveal,
    Claim,
    Challenge,
    Finalize,
    Finalized,
    /// The finalize window passed without anybody finalizing.
    Expired,
}
