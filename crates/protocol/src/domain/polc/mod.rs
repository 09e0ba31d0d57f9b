//! Proof of liquidity commitment.
//!
//! Lenders lock capital for a number of days. Locked capital earns a fixed
//! reward per day of lock and can be lent to askers of the auction registry,
//! which is the only party allowed to move it between buckets.

pub mod commitment;
pub mod error;

pub use {
    commitment::Commitment,
    error::Error,
};
use {
    crate::domain::Env,
    model::{CommitmentId, TokenAddress, events::Event},
    std::collections::HashSet,
    winner_selection::{Address, U256},
};

#[derive(Clone, Debug)]
pub struct Config {
    /// Account holding the committed funds.
    pub address: Address,
    pub owner: Address,
    /// Token the lock reward is paid in.
    pub reward_token: TokenAddress,
    /// Reward per day of lock, independent of the committed value.
    pub block_reward: U256,
    /// ERC-20 tokens accepted besides the native asset.
    pub supported_tokens: HashSet<TokenAddress>,
    /// Auction registry allowed to lend and repay. Can be bound later with
    /// [`CommitmentLedger::set_liba_address`].
    pub liba: Option<Address>,
}

#[derive(Clone, Debug)]
pub struct CommitmentLedger {
    address: Address,
    owner: Address,
    reward_token: TokenAddress,
    block_reward: U256,
    supported_tokens: HashSet<TokenAddress>,
    liba: Option<Address>,
    paused: bool,
    commitments: commitment::Store,
}

impl CommitmentLedger {
    pub fn new(config: Config) -> Self {
        Self {
            address: config.address,
            owner: config.owner,
            reward_token: config.reward_token,
            block_reward: config.block_reward,
            supported_tokens: config.supported_tokens,
            liba: config.liba,
            paused: false,
            commitments: Default::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn liba(&self) -> Option<Address> {
        self.liba
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn commitment(&self, owner: Address, id: CommitmentId) -> Option<&Commitment> {
        self.commitments.get(owner, id)
    }

    pub fn commitments_of(
        &self,
        owner: Address,
    ) -> impl Iterator<Item = (CommitmentId, &Commitment)> {
        self.commitments.of(owner)
    }

    pub fn commitments(&self) -> impl Iterator<Item = (CommitmentId, &Commitment)> {
        self.commitments.iter()
    }

    fn is_supported(&self, token: TokenAddress) -> bool {
        token.is_native() || self.supported_tokens.contains(&token)
    }

    /// Locks `amount` of `token` for `duration` days starting at the next day
    /// boundary. Native value must already be attached to the call.
    pub fn commit_fund(
        &mut self,
        env: &mut Env,
        token: TokenAddress,
        duration: u64,
        amount: U256,
    ) -> Result<CommitmentId, Error> {
        self.ensure_running()?;
        let owner = env.sender();
        if token.is_native() {
            if env.tx.value != amount {
                return Err(Error::InvalidAmount);
            }
        } else {
            if !self.is_supported(token) {
                return Err(Error::UnsupportedToken(token));
            }
            if !env.tx.value.is_zero() {
                return Err(Error::InvalidAmount);
            }
            env.assets
                .transfer_from(token, self.address, owner, self.address, amount)?;
        }

        let lock_start = env.chain.next_day();
        let id = self
            .commitments
            .insert(Commitment::new(owner, token, lock_start, duration, amount));
        tracing::info!(%owner, %id, %token, %amount, duration, "new commitment");
        env.emit(Event::NewCommitment {
            owner,
            commitment_id: id,
            token,
            value: amount,
        });
        Ok(id)
    }

    /// Pays out the available value and any repaid interest once the lock
    /// expired. Capital that is reserved or lent stays in the commitment.
    pub fn withdraw_fund(&mut self, env: &mut Env, id: CommitmentId) -> Result<U256, Error> {
        self.ensure_running()?;
        let owner = env.sender();
        let day = env.chain.day();
        let commitment = self.commitment_mut(owner, id)?;
        if commitment.is_locked(day) {
            return Err(Error::LockNotExpired);
        }

        let principal = std::mem::take(&mut commitment.available_value);
        let interest = std::mem::take(&mut commitment.interest_value);
        commitment.withdrawn_value += principal;
        let token = commitment.token;
        let value = principal + interest;

        env.assets.transfer(token, self.address, owner, value)?;
        tracing::info!(%owner, %id, %value, "withdrew fund");
        env.emit(Event::WithdrawFund {
            owner,
            commitment_id: id,
            value,
        });
        Ok(value)
    }

    /// Pays the lock reward: `block_reward` per day of lock, once.
    pub fn withdraw_reward(&mut self, env: &mut Env, id: CommitmentId) -> Result<U256, Error> {
        self.ensure_running()?;
        let owner = env.sender();
        let day = env.chain.day();
        let block_reward = self.block_reward;
        let commitment = self.commitment_mut(owner, id)?;
        if commitment.is_locked(day) {
            return Err(Error::LockNotExpired);
        }
        if commitment.reward_withdrawn {
            return Err(Error::AlreadyWithdrawn);
        }

        commitment.reward_withdrawn = true;
        let reward = block_reward.saturating_mul(U256::from(commitment.lock_duration()));
        env.assets
            .transfer(self.reward_token, self.address, owner, reward)?;
        tracing::info!(%owner, %id, %reward, "withdrew reward");
        env.emit(Event::WithdrawReward {
            owner,
            commitment_id: id,
            reward,
        });
        Ok(reward)
    }

    /// Holds `value` of a commitment for a revealed bid.
    pub fn reserve_commitment(
        &mut self,
        env: &mut Env,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
    ) -> Result<(), Error> {
        self.ensure_liba(env)?;
        let commitment = self.commitment_for(owner, id, token)?;
        if commitment.available_value < value {
            return Err(Error::InsufficientAvailable {
                available: commitment.available_value,
                requested: value,
            });
        }
        commitment.available_value -= value;
        commitment.reserved_value += value;
        tracing::debug!(%owner, %id, %value, "reserved commitment");
        Ok(())
    }

    /// Returns a hold placed by [`Self::reserve_commitment`] to the available
    /// value.
    pub fn release_commitment(
        &mut self,
        env: &mut Env,
        owner: Address,
        id: CommitmentId,
        value: U256,
    ) -> Result<(), Error> {
        self.ensure_liba(env)?;
        let commitment = self.commitment_mut(owner, id)?;
        if commitment.reserved_value < value {
            return Err(Error::InsufficientReserved {
                reserved: commitment.reserved_value,
                requested: value,
            });
        }
        commitment.reserved_value -= value;
        commitment.available_value += value;
        tracing::debug!(%owner, %id, %value, "released commitment");
        Ok(())
    }

    /// Lends available value to `borrower`.
    pub fn lend_commitment(
        &mut self,
        env: &mut Env,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
        borrower: Address,
    ) -> Result<(), Error> {
        self.ensure_liba(env)?;
        let commitment = self.commitment_for(owner, id, token)?;
        if commitment.available_value < value {
            return Err(Error::InsufficientAvailable {
                available: commitment.available_value,
                requested: value,
            });
        }
        commitment.available_value -= value;
        commitment.lending_value += value;
        env.assets.transfer(token, self.address, borrower, value)?;
        tracing::info!(%owner, %id, %value, %borrower, "lent commitment");
        Ok(())
    }

    /// Lends value previously held with [`Self::reserve_commitment`]. The
    /// release and the loan happen in one step so the hold can never be
    /// claimed by anything else in between.
    pub fn lend_reserved(
        &mut self,
        env: &mut Env,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
        borrower: Address,
    ) -> Result<(), Error> {
        self.ensure_liba(env)?;
        let commitment = self.commitment_for(owner, id, token)?;
        if commitment.reserved_value < value {
            return Err(Error::InsufficientReserved {
                reserved: commitment.reserved_value,
                requested: value,
            });
        }
        commitment.reserved_value -= value;
        commitment.lending_value += value;
        env.assets.transfer(token, self.address, borrower, value)?;
        tracing::info!(%owner, %id, %value, %borrower, "lent reserved commitment");
        Ok(())
    }

    /// Takes `value` from the caller and puts it back into the commitment.
    /// Up to the outstanding lending value counts as principal, anything
    /// above that is interest. A shortfall leaves the rest lent out.
    pub fn repay_commitment(
        &mut self,
        env: &mut Env,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
    ) -> Result<(), Error> {
        self.ensure_liba(env)?;
        let (address, liba) = (self.address, env.sender());
        let commitment = self.commitment_for(owner, id, token)?;
        let principal = value.min(commitment.lending_value);
        commitment.lending_value -= principal;
        commitment.available_value += principal;
        commitment.interest_value += value - principal;
        env.assets.transfer(token, liba, address, value)?;
        tracing::info!(%owner, %id, %value, %principal, "repaid commitment");
        Ok(())
    }

    pub fn set_liba_address(&mut self, env: &mut Env, liba: Address) -> Result<(), Error> {
        self.ensure_owner(env)?;
        if self.liba.is_some() {
            return Err(Error::LibaAlreadySet);
        }
        self.liba = Some(liba);
        tracing::info!(%liba, "bound auction registry");
        Ok(())
    }

    pub fn update_supported_token(
        &mut self,
        env: &mut Env,
        token: TokenAddress,
        supported: bool,
    ) -> Result<(), Error> {
        self.ensure_owner(env)?;
        if supported {
            self.supported_tokens.insert(token);
        } else {
            self.supported_tokens.remove(&token);
        }
        tracing::info!(%token, supported, "updated supported token");
        Ok(())
    }

    pub fn pause(&mut self, env: &mut Env) -> Result<(), Error> {
        self.ensure_owner(env)?;
        self.ensure_running()?;
        self.paused = true;
        tracing::warn!("ledger paused");
        Ok(())
    }

    pub fn unpause(&mut self, env: &mut Env) -> Result<(), Error> {
        self.ensure_owner(env)?;
        if !self.paused {
            return Err(Error::NotPaused);
        }
        self.paused = false;
        tracing::info!("ledger unpaused");
        Ok(())
    }

    /// Emergency sweep of `amount` of `token` to the owner. Only while paused.
    pub fn drain_token(
        &mut self,
        env: &mut Env,
        token: TokenAddress,
        amount: U256,
    ) -> Result<(), Error> {
        self.ensure_owner(env)?;
        if !self.paused {
            return Err(Error::NotPaused);
        }
        env.assets.transfer(token, self.address, self.owner, amount)?;
        tracing::warn!(%token, %amount, "drained token");
        env.emit(Event::DrainToken { token, amount });
        Ok(())
    }

    fn ensure_owner(&self, env: &Env) -> Result<(), Error> {
        if env.sender() != self.owner {
            return Err(Error::NotOwner);
        }
        Ok(())
    }

    fn ensure_liba(&self, env: &Env) -> Result<(), Error> {
        if self.liba != Some(env.sender()) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), Error> {
        if self.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }

    fn commitment_mut(
        &mut self,
        owner: Address,
        id: CommitmentId,
    ) -> Result<&mut Commitment, Error> {
        self.commitments
            .get_mut(owner, id)
            .ok_or(Error::CommitmentNotFound { owner, id })
    }

    fn commitment_for(
        &mut self,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
    ) -> Result<&mut Commitment, Error> {
        let commitment = self.commitment_mut(owner, id)?;
        if commitment.token != token {
            return Err(Error::TokenMismatch {
                actual: commitment.token,
                requested: token,
            });
        }
        Ok(commitment)
    }
}
