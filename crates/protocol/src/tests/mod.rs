//! End to end tests running calls through [`Protocol`] the way accounts
//! would submit them.

use {
    crate::domain::{
        DAY,
        Protocol,
        Tx,
        engine::{Config, Grant},
        liba::{self, Durations, Params, Period, Plaintext},
        polc,
    },
    maplit::hashset,
    model::{AuctionId, CommitmentId, TokenAddress},
    winner_selection::{Address, U256},
};

mod lifecycle;

pub const LEDGER: Address = Address::repeat_byte(0x10);
pub const REGISTRY: Address = Address::repeat_byte(0x20);
pub const OWNER: Address = Address::repeat_byte(0x01);
pub const TREASURY: Address = Address::repeat_byte(0x02);
pub const ASKER: Address = Address::repeat_byte(0x0a);
/// Stake, deposit and reward token.
pub const CELR: TokenAddress = TokenAddress(Address::repeat_byte(0xce));
/// A supported ERC-20 token.
pub const TOKEN: TokenAddress = TokenAddress(Address::repeat_byte(0x70));
pub const NATIVE: TokenAddress = TokenAddress::NATIVE;

pub const AUCTION_DEPOSIT: u64 = 100;
pub const MIN_STAKE: u64 = 10;
pub const BLOCK_REWARD: u64 = 1;
/// What every account starts with, in every token.
pub const FUNDS: u64 = 10_000;

pub const RATE: u64 = 5;
pub const BID_VALUE: u64 = 100;
pub const STAKE: u64 = 1_000;
pub const SALT: u64 = 100;

pub fn bidder(index: u8) -> Address {
    Address::repeat_byte(0xb0 + index)
}

pub fn bidders(count: u8) -> Vec<Address> {
    (0..count).map(bidder).collect()
}

pub fn u(value: u64) -> U256 {
    U256::from(value)
}

pub fn config() -> Config {
    let accounts = std::iter::once(ASKER).chain(bidders(5));
    let genesis = accounts
        .flat_map(|account| {
            [NATIVE, CELR, TOKEN].map(|token| Grant {
                token,
                account,
                amount: u(FUNDS),
            })
        })
        .chain([Grant {
            token: CELR,
            account: LEDGER,
            amount: u(1_000_000),
        }])
        .collect();

    Config {
        ledger: polc::Config {
            address: LEDGER,
            owner: OWNER,
            reward_token: CELR,
            block_reward: u(BLOCK_REWARD),
            supported_tokens: hashset! {TOKEN},
            liba: Some(REGISTRY),
        },
        registry: liba::Config {
            address: REGISTRY,
            owner: OWNER,
            treasury: TREASURY,
            stake_token: CELR,
            auction_deposit: u(AUCTION_DEPOSIT),
            min_stake: u(MIN_STAKE),
            whitelist_enabled: false,
            whitelist: Default::default(),
            supported_tokens: hashset! {TOKEN},
        },
        genesis,
    }
}

/// A protocol where every account has approved the registry and the ledger
/// for all of its funds.
pub fn protocol() -> Protocol {
    observe::tracing::initialize_reentrant("protocol=debug");
    let mut protocol = Protocol::new(config());
    for account in std::iter::once(ASKER).chain(bidders(5)) {
        for token in [CELR, TOKEN] {
            protocol.approve(account, token, REGISTRY, U256::MAX);
            protocol.approve(account, token, LEDGER, U256::MAX);
        }
    }
    protocol
}

pub fn durations() -> Durations {
    Durations {
        bid: 10,
        reveal: 10,
        claim: 1,
        challenge: 1,
        finalize: 1,
    }
}

/// A native loan of `value` for two days.
pub fn params(value: u64) -> Params {
    Params {
        token: NATIVE,
        durations: durations(),
        value: u(value),
        duration: 2,
        max_rate: u(10),
        min_value: u(2),
        collateral_token: NATIVE,
        collateral_value: U256::ZERO,
    }
}

pub fn plaintext(rate: u64, value: u64) -> Plaintext {
    Plaintext {
        rate: u(rate),
        value: u(value),
        celer_value: u(STAKE),
        salt: u(SALT),
    }
}

/// Locks `value` of the native asset for ten days.
pub fn commit(protocol: &mut Protocol, owner: Address, value: u64) -> CommitmentId {
    protocol
        .commit_fund(Tx::new(owner).with_value(u(value)), NATIVE, 10, u(value))
        .unwrap()
}

pub fn init(protocol: &mut Protocol, params: Params) -> AuctionId {
    protocol.init_auction(Tx::new(ASKER), params).unwrap()
}

pub fn place(protocol: &mut Protocol, id: AuctionId, bidder: Address, plaintext: Plaintext) {
    protocol
        .place_bid(Tx::new(bidder), id, plaintext.hash(), plaintext.celer_value)
        .unwrap();
}

/// Backs `plaintext` with a fresh commitment of exactly its value and reveals
/// it.
pub fn reveal(protocol: &mut Protocol, id: AuctionId, bidder: Address, plaintext: Plaintext) {
    let value = u64::try_from(plaintext.value).unwrap();
    let commitment = commit(protocol, bidder, value);
    protocol
        .reveal_bid(Tx::new(bidder), id, plaintext, commitment)
        .unwrap();
}

/// Advances the chain to the first block of `period`.
pub fn advance_to(protocol: &mut Protocol, id: AuctionId, period: Period) {
    let periods = protocol.auction(id).unwrap().periods;
    let target = match period {
        Period::Bid => return,
        Period::Reveal => periods.bid_end,
        Period::Claim => periods.reveal_end,
        Period::Challenge => periods.claim_end,
        Period::Finalize => periods.challenge_end,
        Period::Expired => periods.finalize_end,
        Period::Finalized => panic!("finalized is not a block range"),
    };
    let block = protocol.block();
    assert!(block <= target, "already past {period}");
    protocol.advance_blocks(target.0 - block.0);
    assert_eq!(protocol.period(id), Some(period));
}

/// Runs an auction up to the start of the finalize period with every bidder
/// revealing and the asker claiming what winner selection computes.
pub fn run_to_finalize(
    protocol: &mut Protocol,
    params: Params,
    bids: &[(Address, Plaintext)],
) -> AuctionId {
    let id = init(protocol, params);
    for (bidder, plaintext) in bids {
        place(protocol, id, *bidder, *plaintext);
    }
    advance_to(protocol, id, Period::Reveal);
    for (bidder, plaintext) in bids {
        reveal(protocol, id, *bidder, *plaintext);
    }
    advance_to(protocol, id, Period::Claim);
    let ranking = protocol.compute_winners(id).unwrap();
    protocol
        .claim_winners(
            Tx::new(ASKER),
            id,
            ranking.winner_addresses(),
            ranking.top_loser().unwrap(),
        )
        .unwrap();
    advance_to(protocol, id, Period::Finalize);
    id
}

/// Lets the loan term of `id` pass.
pub fn end_loan(protocol: &mut Protocol, id: AuctionId) {
    let duration = protocol.auction(id).unwrap().duration;
    protocol.advance_time(duration * DAY);
}

/// Every commitment accounts for all of its committed value.
pub fn assert_balanced(protocol: &Protocol) {
    for (id, commitment) in protocol.ledger().commitments() {
        assert!(commitment.is_balanced(), "commitment {id}: {commitment:?}");
    }
}
