//! Lending blind auction.
//!
//! An asker requests a loan and lenders answer with sealed bids. Once the
//! bidding closes, lenders reveal their bids and back them with a commitment
//! of the [`CommitmentLedger`]. The asker then claims a winner set which
//! anyone can challenge until the challenge period ends. Finalizing lends the
//! winners' capital to the asker; repaying puts it back and pays interest at
//! the rate of the boundary bid.

pub mod auction;
pub mod bid;
pub mod error;
pub mod period;
pub mod settlement;

pub use {
    auction::{Auction, Params},
    bid::{Bid, Reveal},
    error::Error,
    period::{Durations, Period},
    settlement::{Settlement, WinnerSet},
};
use {
    crate::domain::{BlockNo, Env, polc::CommitmentLedger},
    itertools::Itertools,
    model::{AuctionId, CommitmentId, TokenAddress, events::Event},
    std::collections::{HashMap, HashSet},
    winner_selection::{Address, Arbitrator, B256, Ranking, U256, bid_hash, interest},
};

#[derive(Clone, Debug)]
pub struct Config {
    /// Account holding stakes, deposits, collateral and repayments.
    pub address: Address,
    pub owner: Address,
    /// Receives the deposits of settled auctions.
    pub treasury: Address,
    /// Token stakes and deposits are posted in.
    pub stake_token: TokenAddress,
    pub auction_deposit: U256,
    /// Smallest stake a bid may post.
    pub min_stake: U256,
    /// Whether only whitelisted askers may open auctions.
    pub whitelist_enabled: bool,
    pub whitelist: HashSet<Address>,
    /// ERC-20 tokens that can be borrowed or pledged besides the native
    /// asset.
    pub supported_tokens: HashSet<TokenAddress>,
}

/// The plaintext of a sealed bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plaintext {
    pub rate: U256,
    pub value: U256,
    pub celer_value: U256,
    pub salt: U256,
}

impl Plaintext {
    pub fn hash(&self) -> B256 {
        bid_hash(self.rate, self.value, self.celer_value, self.salt)
    }
}

#[derive(Clone, Debug)]
pub struct AuctionRegistry {
    address: Address,
    owner: Address,
    treasury: Address,
    stake_token: TokenAddress,
    auction_deposit: U256,
    min_stake: U256,
    whitelist_enabled: bool,
    whitelist: HashSet<Address>,
    supported_tokens: HashSet<TokenAddress>,
    paused: bool,
    auctions: auction::Store,
    bids: bid::Store,
    /// Interest owed to lenders, withdrawn with
    /// [`AuctionRegistry::withdraw_payments`].
    payments: HashMap<(Address, TokenAddress), U256>,
}

impl AuctionRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            address: config.address,
            owner: config.owner,
            treasury: config.treasury,
            stake_token: config.stake_token,
            auction_deposit: config.auction_deposit,
            min_stake: config.min_stake,
            whitelist_enabled: config.whitelist_enabled,
            whitelist: config.whitelist,
            supported_tokens: config.supported_tokens,
            paused: false,
            auctions: Default::default(),
            bids: Default::default(),
            payments: Default::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn stake_token(&self) -> TokenAddress {
        self.stake_token
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn auction(&self, id: AuctionId) -> Option<&Auction> {
        self.auctions.get(id)
    }

    pub fn auction_count(&self) -> usize {
        self.auctions.len()
    }

    pub fn bid(&self, bidder: Address, id: AuctionId) -> Option<&Bid> {
        self.bids.get(id, bidder)
    }

    pub fn period(&self, id: AuctionId, block: BlockNo) -> Option<Period> {
        self.auctions.get(id).map(|auction| auction.period(block))
    }

    pub fn payments(&self, account: Address, token: TokenAddress) -> U256 {
        self.payments
            .get(&(account, token))
            .copied()
            .unwrap_or_default()
    }

    /// Revealed bids of an auction, in no particular order.
    pub fn revealed_bids(&self, id: AuctionId) -> Vec<winner_selection::Bid> {
        self.bids.revealed(id)
    }

    /// Runs winner selection on the revealed bids. This is what an honest
    /// asker claims and what a challenger checks the claim against.
    pub fn arbitrate(&self, id: AuctionId) -> Option<Ranking> {
        let auction = self.auctions.get(id)?;
        Some(Arbitrator::new(auction.value).arbitrate(self.bids.revealed(id)))
    }

    fn is_supported(&self, token: TokenAddress) -> bool {
        token.is_native() || self.supported_tokens.contains(&token)
    }

    /// Opens an auction. Pulls the auction deposit and escrows the
    /// collateral. Native collateral must be attached to the call.
    pub fn init_auction(&mut self, env: &mut Env, params: Params) -> Result<AuctionId, Error> {
        self.ensure_running()?;
        let asker = env.sender();
        if self.whitelist_enabled && !self.whitelist.contains(&asker) {
            return Err(Error::NotWhitelisted);
        }
        if !self.is_supported(params.token) {
            return Err(Error::UnsupportedToken(params.token));
        }
        let has_collateral = !params.collateral_value.is_zero();
        if has_collateral && !self.is_supported(params.collateral_token) {
            return Err(Error::UnsupportedToken(params.collateral_token));
        }
        if params.duration == 0 {
            return Err(Error::ZeroDuration);
        }
        let native_collateral = if has_collateral && params.collateral_token.is_native() {
            params.collateral_value
        } else {
            U256::ZERO
        };
        if env.tx.value != native_collateral {
            return Err(Error::InvalidAmount);
        }

        let auction = Auction::new(asker, params, env.chain.block, self.auction_deposit)?;
        env.assets.transfer_from(
            self.stake_token,
            self.address,
            asker,
            self.address,
            self.auction_deposit,
        )?;
        if has_collateral && !params.collateral_token.is_native() {
            env.assets.transfer_from(
                params.collateral_token,
                self.address,
                asker,
                self.address,
                params.collateral_value,
            )?;
        }

        let periods = auction.periods;
        let id = self.auctions.insert(auction);
        tracing::info!(
            auction = %id,
            %asker,
            value = %params.value,
            bid_end = %periods.bid_end,
            finalize_end = %periods.finalize_end,
            "new auction"
        );
        env.emit(Event::NewAuction {
            auction_id: id,
            asker,
        });
        Ok(id)
    }

    /// Places or replaces a sealed bid. Replacing moves only the stake
    /// difference.
    pub fn place_bid(
        &mut self,
        env: &mut Env,
        id: AuctionId,
        hash: B256,
        celer_value: U256,
    ) -> Result<(), Error> {
        self.ensure_running()?;
        let bidder = env.sender();
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if auction.period(env.chain.block) != Period::Bid {
            return Err(Error::NotInBidPeriod);
        }
        if celer_value < self.min_stake {
            return Err(Error::StakeTooLow {
                stake: celer_value,
                minimum: self.min_stake,
            });
        }

        match self.bids.get_mut(id, bidder) {
            Some(bid) => {
                let previous = bid.celer_value;
                if celer_value > previous {
                    env.assets.transfer_from(
                        self.stake_token,
                        self.address,
                        bidder,
                        self.address,
                        celer_value - previous,
                    )?;
                } else {
                    env.assets.transfer(
                        self.stake_token,
                        self.address,
                        bidder,
                        previous - celer_value,
                    )?;
                }
                bid.hash = hash;
                bid.celer_value = celer_value;
                tracing::debug!(auction = %id, %bidder, %celer_value, "updated bid");
                env.emit(Event::UpdateBid {
                    auction_id: id,
                    bidder,
                });
            }
            None => {
                env.assets.transfer_from(
                    self.stake_token,
                    self.address,
                    bidder,
                    self.address,
                    celer_value,
                )?;
                self.bids.insert(id, bidder, Bid::sealed(hash, celer_value));
                auction.bidders.push(bidder);
                tracing::debug!(auction = %id, %bidder, %celer_value, "new bid");
                env.emit(Event::NewBid {
                    auction_id: id,
                    bidder,
                });
            }
        }
        Ok(())
    }

    /// Opens a sealed bid and holds its value on the backing commitment until
    /// the auction settles.
    pub fn reveal_bid(
        &mut self,
        env: &mut Env,
        ledger: &mut CommitmentLedger,
        id: AuctionId,
        plaintext: Plaintext,
        commitment_id: CommitmentId,
    ) -> Result<(), Error> {
        let bidder = env.sender();
        let auction = self.auctions.get(id).ok_or(Error::AuctionNotFound(id))?;
        if auction.period(env.chain.block) != Period::Reveal {
            return Err(Error::NotInRevealPeriod);
        }
        let bid = self.bids.get_mut(id, bidder).ok_or(Error::BidNotFound)?;
        if bid.is_revealed() {
            return Err(Error::AlreadyRevealed);
        }
        if plaintext.rate > auction.max_rate {
            return Err(Error::RateTooHigh);
        }
        if plaintext.value < auction.min_value {
            return Err(Error::ValueTooLow);
        }
        if plaintext.hash() != bid.hash || plaintext.celer_value != bid.celer_value {
            return Err(Error::HashMismatch);
        }
        let backed = ledger
            .commitment(bidder, commitment_id)
            .is_some_and(|commitment| {
                commitment.token == auction.token
                    && commitment.available_value >= plaintext.value
            });
        if !backed {
            return Err(Error::InsufficientCommitment);
        }

        ledger.reserve_commitment(
            &mut env.nested(self.address),
            bidder,
            commitment_id,
            auction.token,
            plaintext.value,
        )?;
        bid.revealed = Some(Reveal {
            rate: plaintext.rate,
            value: plaintext.value,
            commitment_id,
        });
        bid.hash = B256::ZERO;
        bid.reserved_value = plaintext.value;
        tracing::debug!(
            auction = %id,
            %bidder,
            rate = %plaintext.rate,
            value = %plaintext.value,
            commitment = %commitment_id,
            "revealed bid"
        );
        env.emit(Event::RevealBid {
            auction_id: id,
            bidder,
        });
        Ok(())
    }

    /// Declares the winner set. Nothing is verified here, wrong claims get
    /// corrected by challenges.
    pub fn claim_winners(
        &mut self,
        env: &mut Env,
        id: AuctionId,
        winners: Vec<Address>,
        top_loser: Address,
    ) -> Result<(), Error> {
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if env.sender() != auction.asker {
            return Err(Error::NotAsker);
        }
        if auction.period(env.chain.block) != Period::Claim {
            return Err(Error::NotInClaimPeriod);
        }

        auction.settlement = Settlement::Claimed(WinnerSet {
            winners: winners.clone(),
            top_loser,
        });
        tracing::info!(auction = %id, ?winners, %top_loser, "claimed winners");
        env.emit(Event::ClaimWinners {
            auction_id: id,
            winners,
            top_loser,
        });
        Ok(())
    }

    /// Replaces the accepted winner set with one that includes `challenger`.
    pub fn challenge_winners(
        &mut self,
        env: &mut Env,
        id: AuctionId,
        challenger: Address,
        winners: Vec<Address>,
        top_loser: Address,
    ) -> Result<(), Error> {
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if auction.period(env.chain.block) != Period::Challenge {
            return Err(Error::NotInChallengePeriod);
        }
        if !is_valid_challenge(&self.bids, id, auction, challenger, &winners) {
            return Err(Error::InvalidChallenger);
        }

        auction.settlement = Settlement::Challenged {
            challenger,
            winners: WinnerSet {
                winners: winners.clone(),
                top_loser,
            },
        };
        tracing::info!(auction = %id, %challenger, ?winners, %top_loser, "challenged winners");
        env.emit(Event::ChallengeWinners {
            auction_id: id,
            challenger,
            winners,
            top_loser,
        });
        Ok(())
    }

    /// Lends from the accepted winners' commitments to the asker, in order,
    /// until the requested value is covered. Every hold that isn't lent is
    /// released.
    pub fn finalize_auction(
        &mut self,
        env: &mut Env,
        ledger: &mut CommitmentLedger,
        id: AuctionId,
    ) -> Result<U256, Error> {
        let registry = self.address;
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if auction.finalized {
            return Err(Error::AlreadyFinalized);
        }
        if auction.period(env.chain.block) != Period::Finalize {
            return Err(Error::NotInFinalizePeriod);
        }

        let mut remaining = auction.value;
        let mut lenders = Vec::new();
        let winners = auction.settlement.winners().iter().copied().unique().collect_vec();
        for winner in winners {
            let Some(bid) = self.bids.get_mut(id, winner) else {
                tracing::warn!(auction = %id, %winner, "skipping winner without bid");
                continue;
            };
            let Some(reveal) = bid.revealed else {
                tracing::warn!(auction = %id, %winner, "skipping unrevealed winner");
                continue;
            };
            let amount = reveal.value.min(remaining).min(bid.reserved_value);
            if amount.is_zero() {
                continue;
            }
            ledger.lend_reserved(
                &mut env.nested(registry),
                winner,
                reveal.commitment_id,
                auction.token,
                amount,
                auction.asker,
            )?;
            bid.reserved_value -= amount;
            bid.lent_value = amount;
            remaining -= amount;
            lenders.push(winner);
        }

        for bidder in &auction.bidders {
            let Some(bid) = self.bids.get_mut(id, *bidder) else {
                continue;
            };
            release_hold(&mut env.nested(registry), ledger, *bidder, bid)?;
        }

        let lent_value = auction.value - remaining;
        auction.clearing_rate = clearing_rate(&self.bids, id, auction, &lenders);
        auction.lenders = lenders;
        auction.lent_value = lent_value;
        auction.finance_start = Some(env.chain.timestamp);
        auction.finalized = true;

        if lent_value.is_zero() {
            env.assets
                .transfer(self.stake_token, registry, auction.asker, auction.deposit)?;
            auction.deposit_settled = true;
            return_collateral(env, registry, auction)?;
        }

        tracing::info!(
            auction = %id,
            %lent_value,
            rate = %auction.clearing_rate,
            lenders = auction.lenders.len(),
            "finalized auction"
        );
        env.emit(Event::FinalizeAuction {
            auction_id: id,
            lent_value,
        });
        Ok(lent_value)
    }

    /// Refunds the caller's stake once their bid can't win anymore. Lenders
    /// get theirs back when the loan is repaid or when they collect
    /// collateral.
    pub fn finalize_bid(
        &mut self,
        env: &mut Env,
        ledger: &mut CommitmentLedger,
        id: AuctionId,
    ) -> Result<U256, Error> {
        let bidder = env.sender();
        let registry = self.address;
        let auction = self.auctions.get(id).ok_or(Error::AuctionNotFound(id))?;
        let bid = self.bids.get_mut(id, bidder).ok_or(Error::BidNotFound)?;
        if bid.stake_refunded {
            return Err(Error::NothingToWithdraw);
        }
        let refundable = match auction.period(env.chain.block) {
            Period::Bid | Period::Reveal => false,
            Period::Claim | Period::Challenge | Period::Finalize => !bid.is_revealed(),
            Period::Finalized => !auction.is_lender(&bidder),
            Period::Expired => true,
        };
        if !refundable {
            return Err(Error::StakeLocked);
        }

        release_hold(&mut env.nested(registry), ledger, bidder, bid)?;
        bid.stake_refunded = true;
        env.assets
            .transfer(self.stake_token, registry, bidder, bid.celer_value)?;
        tracing::debug!(auction = %id, %bidder, stake = %bid.celer_value, "refunded stake");
        Ok(bid.celer_value)
    }

    /// Repays every lender their principal plus interest at the clearing
    /// rate. Principal goes back into the lenders' commitments, interest into
    /// their payment balances. Lenders that already collected their share of
    /// the collateral are skipped and the rest of the collateral returns to
    /// the asker.
    pub fn repay_auction(
        &mut self,
        env: &mut Env,
        ledger: &mut CommitmentLedger,
        id: AuctionId,
    ) -> Result<U256, Error> {
        let registry = self.address;
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if env.sender() != auction.asker {
            return Err(Error::NotAsker);
        }
        if !auction.finalized {
            return Err(Error::NotFinalized);
        }
        if auction.repaid {
            return Err(Error::AlreadyRepaid);
        }

        // Lenders that collected their collateral share are settled.
        let dues = auction
            .lenders
            .iter()
            .filter_map(|lender| {
                let bid = self.bids.get(id, *lender)?;
                let reveal = bid.revealed?;
                if bid.lent_value.is_zero() {
                    return None;
                }
                let interest = interest(bid.lent_value, auction.clearing_rate, auction.duration);
                Some((*lender, reveal.commitment_id, bid.lent_value, interest))
            })
            .collect_vec();
        let total = dues
            .iter()
            .fold(U256::ZERO, |total, (_, _, principal, interest)| {
                total.saturating_add(*principal).saturating_add(*interest)
            });

        let token = auction.token;
        if token.is_native() {
            if env.tx.value < total {
                return Err(Error::InsufficientRepayment {
                    required: total,
                    provided: env.tx.value,
                });
            }
            let excess = env.tx.value - total;
            env.assets.transfer(token, registry, auction.asker, excess)?;
        } else {
            if !env.tx.value.is_zero() {
                return Err(Error::InvalidAmount);
            }
            env.assets
                .transfer_from(token, registry, auction.asker, registry, total)?;
        }

        for (lender, commitment_id, principal, interest) in dues {
            ledger.repay_commitment(
                &mut env.nested(registry),
                lender,
                commitment_id,
                token,
                principal,
            )?;
            let balance = self.payments.entry((lender, token)).or_default();
            *balance = balance.saturating_add(interest);
            if let Some(bid) = self.bids.get_mut(id, lender) {
                if !bid.stake_refunded {
                    env.assets
                        .transfer(self.stake_token, registry, lender, bid.celer_value)?;
                    bid.stake_refunded = true;
                }
            }
            tracing::debug!(auction = %id, %lender, %principal, %interest, "repaid lender");
        }
        return_collateral(env, registry, auction)?;
        auction.repaid = true;

        tracing::info!(auction = %id, %total, "repaid auction");
        env.emit(Event::RepayAuction {
            auction_id: id,
            value: total,
        });
        Ok(total)
    }

    /// Pays a lender of a defaulted loan their share of the collateral,
    /// proportional to what they lent.
    pub fn collect_collateral(&mut self, env: &mut Env, id: AuctionId) -> Result<U256, Error> {
        let winner = env.sender();
        let registry = self.address;
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if !auction.is_lender(&winner) {
            return Err(Error::NotAWinner);
        }
        if auction.collateral_value.is_zero() {
            return Err(Error::NothingToCollect);
        }
        let bid = self.bids.get_mut(id, winner).ok_or(Error::NotAWinner)?;
        if auction.repaid {
            return Err(Error::AlreadyRepaid);
        }
        if bid.lent_value.is_zero() {
            return Err(Error::AlreadyCollected);
        }
        if auction
            .lending_end()
            .is_none_or(|end| env.chain.timestamp < end)
        {
            return Err(Error::LendingNotEnded);
        }

        let share = auction.collateral_value.saturating_mul(bid.lent_value) / auction.lent_value;
        env.assets
            .transfer(auction.collateral_token, registry, winner, share)?;
        if !bid.stake_refunded {
            env.assets
                .transfer(self.stake_token, registry, winner, bid.celer_value)?;
            bid.stake_refunded = true;
        }
        bid.lent_value = U256::ZERO;
        auction.collateral_collected = auction.collateral_collected.saturating_add(share);

        tracing::info!(auction = %id, %winner, %share, "collected collateral");
        env.emit(Event::CollectCollateral {
            auction_id: id,
            winner,
            value: share,
        });
        Ok(share)
    }

    /// Moves the auction deposit to the treasury once the auction was
    /// finalized or expired. An expired auction also returns its collateral
    /// to the asker.
    pub fn transfer_fee_deposit(&mut self, env: &mut Env, id: AuctionId) -> Result<U256, Error> {
        let registry = self.address;
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or(Error::AuctionNotFound(id))?;
        if auction.deposit_settled {
            return Err(Error::AlreadyTransferred);
        }
        let expired = auction.is_expired(env.chain.block);
        if !auction.finalized && !expired {
            return Err(Error::NotFinalized);
        }

        if expired {
            return_collateral(env, registry, auction)?;
        }
        env.assets
            .transfer(self.stake_token, registry, self.treasury, auction.deposit)?;
        auction.deposit_settled = true;
        tracing::info!(auction = %id, deposit = %auction.deposit, "transferred fee deposit");
        env.emit(Event::TransferFeeDeposit {
            auction_id: id,
            value: auction.deposit,
        });
        Ok(auction.deposit)
    }

    /// Withdraws the caller's accumulated interest in `token`.
    pub fn withdraw_payments(&mut self, env: &mut Env, token: TokenAddress) -> Result<U256, Error> {
        let account = env.sender();
        let amount = self
            .payments
            .remove(&(account, token))
            .filter(|amount| !amount.is_zero())
            .ok_or(Error::NothingToWithdraw)?;
        env.assets.transfer(token, self.address, account, amount)?;
        tracing::debug!(%account, %token, %amount, "withdrew payments");
        Ok(amount)
    }

    pub fn update_whitelist(&mut self, env: &mut Env, enabled: bool) -> Result<(), Error> {
        self.ensure_owner(env)?;
        self.whitelist_enabled = enabled;
        tracing::info!(enabled, "updated whitelist mode");
        Ok(())
    }

    pub fn add_whitelisted(&mut self, env: &mut Env, accounts: Vec<Address>) -> Result<(), Error> {
        self.ensure_owner(env)?;
        tracing::info!(?accounts, "whitelisted askers");
        self.whitelist.extend(accounts);
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
        tracing::warn!("registry paused");
        Ok(())
    }

    pub fn unpause(&mut self, env: &mut Env) -> Result<(), Error> {
        self.ensure_owner(env)?;
        if !self.paused {
            return Err(Error::NotPaused);
        }
        self.paused = false;
        tracing::info!("registry unpaused");
        Ok(())
    }

    fn ensure_owner(&self, env: &Env) -> Result<(), Error> {
        if env.sender() != self.owner {
            return Err(Error::NotOwner);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), Error> {
        if self.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }
}

/// A challenge is accepted when the challenger revealed a bid, is missing
/// from the current set, is part of the supplied set and the current set is
/// provably wrong without them: the challenger ranks before the current
/// boundary bidder or before one of the current winners, or the current
/// winners don't cover the requested value.
fn is_valid_challenge(
    bids: &bid::Store,
    id: AuctionId,
    auction: &Auction,
    challenger: Address,
    supplied: &[Address],
) -> bool {
    let revealed = |bidder: Address| bids.get(id, bidder).and_then(|bid| bid.selection(bidder));
    let Some(candidate) = revealed(challenger) else {
        return false;
    };
    let current = auction.settlement.winners();
    if current.contains(&challenger) || !supplied.contains(&challenger) {
        return false;
    }

    let outranks_boundary = auction
        .settlement
        .top_loser()
        .filter(|top_loser| *top_loser != challenger)
        .and_then(revealed)
        .is_some_and(|top_loser| candidate.outranks(&top_loser));
    let outranks_winner = current
        .iter()
        .any(|winner| revealed(*winner).is_none_or(|bid| candidate.outranks(&bid)));
    let filled = current
        .iter()
        .unique()
        .filter_map(|winner| revealed(*winner))
        .fold(U256::ZERO, |filled, bid| filled.saturating_add(bid.value));

    outranks_boundary || outranks_winner || filled < auction.value
}

/// The rate lenders get paid: the boundary bidder's rate, or the highest
/// lender rate if the boundary bidder never revealed.
fn clearing_rate(bids: &bid::Store, id: AuctionId, auction: &Auction, lenders: &[Address]) -> U256 {
    let rate_of = |bidder: Address| {
        bids.get(id, bidder)
            .and_then(|bid| bid.revealed)
            .map(|reveal| reveal.rate)
    };
    auction
        .settlement
        .top_loser()
        .and_then(rate_of)
        .or_else(|| lenders.iter().filter_map(|lender| rate_of(*lender)).max())
        .unwrap_or_default()
}

/// Gives any value still held for `bid` back to the backing commitment.
fn release_hold(
    env: &mut Env,
    ledger: &mut CommitmentLedger,
    bidder: Address,
    bid: &mut Bid,
) -> Result<(), Error> {
    let Some(reveal) = bid.revealed else {
        return Ok(());
    };
    if bid.reserved_value.is_zero() {
        return Ok(());
    }
    ledger.release_commitment(env, bidder, reveal.commitment_id, bid.reserved_value)?;
    bid.reserved_value = U256::ZERO;
    Ok(())
}

fn return_collateral(env: &mut Env, registry: Address, auction: &mut Auction) -> Result<(), Error> {
    let remaining = auction
        .collateral_value
        .saturating_sub(auction.collateral_collected);
    if auction.collateral_returned || remaining.is_zero() {
        return Ok(());
    }
    env.assets
        .transfer(auction.collateral_token, registry, auction.asker, remaining)?;
    auction.collateral_returned = true;
    Ok(())
}
