use {
    model::{CommitmentId, TokenAddress},
    std::collections::BTreeMap,
    winner_selection::{Address, U256},
};

/// Capital locked in the ledger until `lock_end`.
///
/// The committed value is always split across four buckets:
/// `committed == available + reserved + lending + withdrawn`. Capital that
/// was lent and never repaid stays in `lending` forever.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    pub owner: Address,
    pub token: TokenAddress,
    /// Day number the lock started on.
    pub lock_start: u64,
    /// Day number from which funds and reward can be withdrawn.
    pub lock_end: u64,
    pub committed_value: U256,
    /// Free to back bids or to be withdrawn once the lock expired.
    pub available_value: U256,
    /// Held by revealed bids until their auction settles.
    pub reserved_value: U256,
    /// Lent out to askers.
    pub lending_value: U256,
    /// Repaid on top of the lent principal.
    pub interest_value: U256,
    pub withdrawn_value: U256,
    pub reward_withdrawn: bool,
}

impl Commitment {
    pub fn new(
        owner: Address,
        token: TokenAddress,
        lock_start: u64,
        duration: u64,
        value: U256,
    ) -> Self {
        Self {
            owner,
            token,
            lock_start,
            lock_end: lock_start.saturating_add(duration),
            committed_value: value,
            available_value: value,
            reserved_value: U256::ZERO,
            lending_value: U256::ZERO,
            interest_value: U256::ZERO,
            withdrawn_value: U256::ZERO,
            reward_withdrawn: false,
        }
    }

    /// Lock length in days.
    pub fn lock_duration(&self) -> u64 {
        self.lock_end - self.lock_start
    }

    pub fn is_locked(&self, day: u64) -> bool {
        day < self.lock_end
    }

    pub fn is_balanced(&self) -> bool {
        self.available_value
            .checked_add(self.reserved_value)
            .and_then(|sum| sum.checked_add(self.lending_value))
            .and_then(|sum| sum.checked_add(self.withdrawn_value))
            == Some(self.committed_value)
    }
}

/// Commitments indexed by owner and id. Ids are handed out sequentially
/// across all owners.
#[derive(Clone, Debug, Default)]
pub struct Store {
    commitments: BTreeMap<(Address, CommitmentId), Commitment>,
    next_id: CommitmentId,
}

impl Store {
    pub fn insert(&mut self, commitment: Commitment) -> CommitmentId {
        let id = self.next_id;
        self.next_id = id.next();
        self.commitments.insert((commitment.owner, id), commitment);
        id
    }

    pub fn get(&self, owner: Address, id: CommitmentId) -> Option<&Commitment> {
        self.commitments.get(&(owner, id))
    }

    pub fn get_mut(&mut self, owner: Address, id: CommitmentId) -> Option<&mut Commitment> {
        self.commitments.get_mut(&(owner, id))
    }

    /// All commitments of `owner` in id order.
    pub fn of(&self, owner: Address) -> impl Iterator<Item = (CommitmentId, &Commitment)> {
        self.commitments
            .range((owner, CommitmentId(0))..=(owner, CommitmentId(u64::MAX)))
            .map(|((_, id), commitment)| (*id, commitment))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CommitmentId, &Commitment)> {
        self.commitments
            .iter()
            .map(|((_, id), commitment)| (*id, commitment))
    }
}
