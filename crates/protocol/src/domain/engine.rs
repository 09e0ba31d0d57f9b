//! Single entry point for every externally submitted call.
//!
//! A call runs against a draft of the whole state: the chain, all balances,
//! the ledger, the registry and the event log. The draft replaces the current
//! state only if the call succeeds, so a failing call leaves no trace, not
//! even the events it emitted before failing.

use {
    super::{
        AssetTransfer,
        Balances,
        BlockNo,
        Chain,
        Env,
        Tx,
        assets,
        liba::{self, AuctionRegistry, Params, Period, Plaintext},
        polc::{self, Commitment, CommitmentLedger},
    },
    model::{AuctionId, CommitmentId, TokenAddress, events::Event},
    winner_selection::{Address, B256, Ranking, U256},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Polc(#[from] polc::Error),
    #[error(transparent)]
    Liba(#[from] liba::Error),
    #[error(transparent)]
    Assets(#[from] assets::Error),
    #[error("call does not accept native value")]
    NotPayable,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub ledger: polc::Config,
    pub registry: liba::Config,
    /// Balances minted before the first call.
    pub genesis: Vec<Grant>,
}

/// An initial balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grant {
    pub token: TokenAddress,
    pub account: Address,
    pub amount: U256,
}

#[derive(Clone, Debug)]
struct State {
    chain: Chain,
    balances: Balances,
    ledger: CommitmentLedger,
    registry: AuctionRegistry,
    events: Vec<Event>,
}

#[derive(Clone, Debug)]
pub struct Protocol {
    state: State,
}

impl Protocol {
    pub fn new(config: Config) -> Self {
        let mut balances = Balances::default();
        for grant in config.genesis {
            balances.mint(grant.token, grant.account, grant.amount);
        }
        Self {
            state: State {
                chain: Chain::default(),
                balances,
                ledger: CommitmentLedger::new(config.ledger),
                registry: AuctionRegistry::new(config.registry),
                events: Vec::new(),
            },
        }
    }

    /// Runs `call` on a draft of the state and keeps the draft on success.
    /// Native value attached to `tx` is credited to `payee` before the call
    /// runs.
    fn execute<T>(
        &mut self,
        tx: Tx,
        payee: Option<Address>,
        call: impl FnOnce(
            &mut Env,
            &mut CommitmentLedger,
            &mut AuctionRegistry,
        ) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut draft = self.state.clone();
        match dispatch(&mut draft, tx, payee, call) {
            Ok(output) => {
                self.state = draft;
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(?err, from = %tx.from, value = %tx.value, "call reverted");
                Err(err)
            }
        }
    }

    fn ledger_address(&self) -> Option<Address> {
        Some(self.state.ledger.address())
    }

    fn registry_address(&self) -> Option<Address> {
        Some(self.state.registry.address())
    }

    // Commitment ledger

    pub fn commit_fund(
        &mut self,
        tx: Tx,
        token: TokenAddress,
        duration: u64,
        amount: U256,
    ) -> Result<CommitmentId, Error> {
        let payee = self.ledger_address();
        self.execute(tx, payee, |env, ledger, _| {
            Ok(ledger.commit_fund(env, token, duration, amount)?)
        })
    }

    pub fn withdraw_fund(&mut self, tx: Tx, id: CommitmentId) -> Result<U256, Error> {
        self.execute(tx, None, |env, ledger, _| Ok(ledger.withdraw_fund(env, id)?))
    }

    pub fn withdraw_reward(&mut self, tx: Tx, id: CommitmentId) -> Result<U256, Error> {
        self.execute(tx, None, |env, ledger, _| Ok(ledger.withdraw_reward(env, id)?))
    }

    pub fn reserve_commitment(
        &mut self,
        tx: Tx,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| {
            Ok(ledger.reserve_commitment(env, owner, id, token, value)?)
        })
    }

    pub fn lend_commitment(
        &mut self,
        tx: Tx,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
        borrower: Address,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| {
            Ok(ledger.lend_commitment(env, owner, id, token, value, borrower)?)
        })
    }

    pub fn repay_commitment(
        &mut self,
        tx: Tx,
        owner: Address,
        id: CommitmentId,
        token: TokenAddress,
        value: U256,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| {
            Ok(ledger.repay_commitment(env, owner, id, token, value)?)
        })
    }

    pub fn set_liba_address(&mut self, tx: Tx, liba: Address) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| Ok(ledger.set_liba_address(env, liba)?))
    }

    pub fn update_ledger_token(
        &mut self,
        tx: Tx,
        token: TokenAddress,
        supported: bool,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| {
            Ok(ledger.update_supported_token(env, token, supported)?)
        })
    }

    pub fn pause_ledger(&mut self, tx: Tx) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| Ok(ledger.pause(env)?))
    }

    pub fn unpause_ledger(&mut self, tx: Tx) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| Ok(ledger.unpause(env)?))
    }

    pub fn drain_token(&mut self, tx: Tx, token: TokenAddress, amount: U256) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, _| {
            Ok(ledger.drain_token(env, token, amount)?)
        })
    }

    // Auction registry

    pub fn init_auction(&mut self, tx: Tx, params: Params) -> Result<AuctionId, Error> {
        let payee = self.registry_address();
        self.execute(tx, payee, |env, _, registry| {
            Ok(registry.init_auction(env, params)?)
        })
    }

    pub fn place_bid(
        &mut self,
        tx: Tx,
        id: AuctionId,
        hash: B256,
        celer_value: U256,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.place_bid(env, id, hash, celer_value)?)
        })
    }

    pub fn reveal_bid(
        &mut self,
        tx: Tx,
        id: AuctionId,
        plaintext: Plaintext,
        commitment_id: CommitmentId,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, ledger, registry| {
            Ok(registry.reveal_bid(env, ledger, id, plaintext, commitment_id)?)
        })
    }

    pub fn claim_winners(
        &mut self,
        tx: Tx,
        id: AuctionId,
        winners: Vec<Address>,
        top_loser: Address,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.claim_winners(env, id, winners, top_loser)?)
        })
    }

    pub fn challenge_winners(
        &mut self,
        tx: Tx,
        id: AuctionId,
        challenger: Address,
        winners: Vec<Address>,
        top_loser: Address,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.challenge_winners(env, id, challenger, winners, top_loser)?)
        })
    }

    pub fn finalize_auction(&mut self, tx: Tx, id: AuctionId) -> Result<U256, Error> {
        self.execute(tx, None, |env, ledger, registry| {
            Ok(registry.finalize_auction(env, ledger, id)?)
        })
    }

    pub fn finalize_bid(&mut self, tx: Tx, id: AuctionId) -> Result<U256, Error> {
        self.execute(tx, None, |env, ledger, registry| {
            Ok(registry.finalize_bid(env, ledger, id)?)
        })
    }

    pub fn repay_auction(&mut self, tx: Tx, id: AuctionId) -> Result<U256, Error> {
        let payee = self.registry_address();
        self.execute(tx, payee, |env, ledger, registry| {
            Ok(registry.repay_auction(env, ledger, id)?)
        })
    }

    pub fn collect_collateral(&mut self, tx: Tx, id: AuctionId) -> Result<U256, Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.collect_collateral(env, id)?)
        })
    }

    pub fn transfer_fee_deposit(&mut self, tx: Tx, id: AuctionId) -> Result<U256, Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.transfer_fee_deposit(env, id)?)
        })
    }

    pub fn withdraw_payments(&mut self, tx: Tx, token: TokenAddress) -> Result<U256, Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.withdraw_payments(env, token)?)
        })
    }

    pub fn update_whitelist(&mut self, tx: Tx, enabled: bool) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.update_whitelist(env, enabled)?)
        })
    }

    pub fn add_whitelisted(&mut self, tx: Tx, accounts: Vec<Address>) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.add_whitelisted(env, accounts)?)
        })
    }

    pub fn update_registry_token(
        &mut self,
        tx: Tx,
        token: TokenAddress,
        supported: bool,
    ) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| {
            Ok(registry.update_supported_token(env, token, supported)?)
        })
    }

    pub fn pause_registry(&mut self, tx: Tx) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| Ok(registry.pause(env)?))
    }

    pub fn unpause_registry(&mut self, tx: Tx) -> Result<(), Error> {
        self.execute(tx, None, |env, _, registry| Ok(registry.unpause(env)?))
    }

    // Environment

    pub fn mint(&mut self, token: TokenAddress, account: Address, amount: U256) {
        self.state.balances.mint(token, account, amount);
    }

    pub fn approve(&mut self, owner: Address, token: TokenAddress, spender: Address, amount: U256) {
        self.state.balances.approve(token, owner, spender, amount);
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.state.chain.advance_blocks(blocks);
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.state.chain.advance_time(seconds);
    }

    // Views

    pub fn chain(&self) -> Chain {
        self.state.chain
    }

    pub fn block(&self) -> BlockNo {
        self.state.chain.block
    }

    pub fn balance_of(&self, token: TokenAddress, account: Address) -> U256 {
        self.state.balances.balance_of(token, account)
    }

    pub fn allowance(&self, token: TokenAddress, owner: Address, spender: Address) -> U256 {
        self.state.balances.allowance(token, owner, spender)
    }

    pub fn ledger(&self) -> &CommitmentLedger {
        &self.state.ledger
    }

    pub fn registry(&self) -> &AuctionRegistry {
        &self.state.registry
    }

    pub fn commitment(&self, owner: Address, id: CommitmentId) -> Option<&Commitment> {
        self.state.ledger.commitment(owner, id)
    }

    pub fn auction(&self, id: AuctionId) -> Option<&liba::Auction> {
        self.state.registry.auction(id)
    }

    pub fn bid(&self, bidder: Address, id: AuctionId) -> Option<&liba::Bid> {
        self.state.registry.bid(bidder, id)
    }

    pub fn period(&self, id: AuctionId) -> Option<Period> {
        self.state.registry.period(id, self.state.chain.block)
    }

    pub fn payments(&self, account: Address, token: TokenAddress) -> U256 {
        self.state.registry.payments(account, token)
    }

    /// Every event emitted by a successful call, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    pub fn compute_winners(&self, id: AuctionId) -> Option<Ranking> {
        self.state.registry.arbitrate(id)
    }
}

fn dispatch<T>(
    state: &mut State,
    tx: Tx,
    payee: Option<Address>,
    call: impl FnOnce(&mut Env, &mut CommitmentLedger, &mut AuctionRegistry) -> Result<T, Error>,
) -> Result<T, Error> {
    if !tx.value.is_zero() {
        let payee = payee.ok_or(Error::NotPayable)?;
        state
            .balances
            .transfer(TokenAddress::NATIVE, tx.from, payee, tx.value)?;
    }
    let mut env = Env {
        tx,
        chain: state.chain,
        assets: &mut state.balances,
        events: &mut state.events,
    };
    call(&mut env, &mut state.ledger, &mut state.registry)
}
