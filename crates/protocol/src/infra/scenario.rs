//! Scripted interactions with the protocol, read from JSON.
//!
//! A scenario is a list of steps. Environment steps move the chain or the
//! balances, call steps submit a call on behalf of an account. A call step
//! can state the error it is expected to fail with, so a scenario documents
//! rejections as well as the happy path.

use {
    crate::domain::{
        Protocol,
        Tx,
        engine,
        liba::{Durations, Params, Plaintext},
    },
    anyhow::Context,
    model::{AuctionId, CommitmentId, TokenAddress, events::Event, u256_decimal::DecimalU256},
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
    std::path::Path,
    tokio::fs,
    winner_selection::{Address, U256},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    AdvanceBlocks {
        blocks: u64,
    },
    AdvanceTime {
        seconds: u64,
    },
    Mint {
        token: TokenAddress,
        account: Address,
        #[serde_as(as = "DecimalU256")]
        amount: U256,
    },
    Approve {
        owner: Address,
        token: TokenAddress,
        spender: Address,
        #[serde_as(as = "DecimalU256")]
        amount: U256,
    },
    Call {
        from: Address,
        /// Native value attached to the call.
        #[serde_as(as = "DecimalU256")]
        #[serde(default)]
        value: U256,
        call: Call,
        /// Part of the error message or variant name the call must fail with.
        #[serde(default)]
        expect_error: Option<String>,
    },
}

#[serde_as]
#[derive(Debug, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Call {
    CommitFund {
        token: TokenAddress,
        duration: u64,
        #[serde_as(as = "DecimalU256")]
        amount: U256,
    },
    WithdrawFund {
        commitment_id: CommitmentId,
    },
    WithdrawReward {
        commitment_id: CommitmentId,
    },
    ReserveCommitment {
        owner: Address,
        commitment_id: CommitmentId,
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    LendCommitment {
        owner: Address,
        commitment_id: CommitmentId,
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        value: U256,
        borrower: Address,
    },
    RepayCommitment {
        owner: Address,
        commitment_id: CommitmentId,
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        value: U256,
    },
    SetLibaAddress {
        liba: Address,
    },
    UpdateLedgerToken {
        token: TokenAddress,
        supported: bool,
    },
    PauseLedger,
    UnpauseLedger,
    DrainToken {
        token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        amount: U256,
    },
    InitAuction {
        token: TokenAddress,
        durations: Durations,
        #[serde_as(as = "DecimalU256")]
        value: U256,
        duration: u64,
        #[serde_as(as = "DecimalU256")]
        max_rate: U256,
        #[serde_as(as = "DecimalU256")]
        min_value: U256,
        #[serde(default)]
        collateral_token: TokenAddress,
        #[serde_as(as = "DecimalU256")]
        #[serde(default)]
        collateral_value: U256,
    },
    /// Seals the plaintext and places the resulting hash.
    PlaceBid {
        auction_id: AuctionId,
        #[serde_as(as = "DecimalU256")]
        rate: U256,
        #[serde_as(as = "DecimalU256")]
        value: U256,
        #[serde_as(as = "DecimalU256")]
        celer_value: U256,
        #[serde_as(as = "DecimalU256")]
        salt: U256,
    },
    RevealBid {
        auction_id: AuctionId,
        #[serde_as(as = "DecimalU256")]
        rate: U256,
        #[serde_as(as = "DecimalU256")]
        value: U256,
        #[serde_as(as = "DecimalU256")]
        celer_value: U256,
        #[serde_as(as = "DecimalU256")]
        salt: U256,
        commitment_id: CommitmentId,
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
    },
    FinalizeBid {
        auction_id: AuctionId,
    },
    RepayAuction {
        auction_id: AuctionId,
    },
    CollectCollateral {
        auction_id: AuctionId,
    },
    TransferFeeDeposit {
        auction_id: AuctionId,
    },
    WithdrawPayments {
        token: TokenAddress,
    },
    UpdateWhitelist {
        enabled: bool,
    },
    AddWhitelisted {
        accounts: Vec<Address>,
    },
    UpdateRegistryToken {
        token: TokenAddress,
        supported: bool,
    },
    PauseRegistry,
    UnpauseRegistry,
}

impl Call {
    fn submit(self, protocol: &mut Protocol, tx: Tx) -> Result<(), engine::Error> {
        match self {
            Self::CommitFund {
                token,
                duration,
                amount,
            } => protocol.commit_fund(tx, token, duration, amount).map(drop),
            Self::WithdrawFund { commitment_id } => {
                protocol.withdraw_fund(tx, commitment_id).map(drop)
            }
            Self::WithdrawReward { commitment_id } => {
                protocol.withdraw_reward(tx, commitment_id).map(drop)
            }
            Self::ReserveCommitment {
                owner,
                commitment_id,
                token,
                value,
            } => protocol.reserve_commitment(tx, owner, commitment_id, token, value),
            Self::LendCommitment {
                owner,
                commitment_id,
                token,
                value,
                borrower,
            } => protocol.lend_commitment(tx, owner, commitment_id, token, value, borrower),
            Self::RepayCommitment {
                owner,
                commitment_id,
                token,
                value,
            } => protocol.repay_commitment(tx, owner, commitment_id, token, value),
            Self::SetLibaAddress { liba } => protocol.set_liba_address(tx, liba),
            Self::UpdateLedgerToken { token, supported } => {
                protocol.update_ledger_token(tx, token, supported)
            }
            Self::PauseLedger => protocol.pause_ledger(tx),
            Self::UnpauseLedger => protocol.unpause_ledger(tx),
            Self::DrainToken { token, amount } => protocol.drain_token(tx, token, amount),
            Self::InitAuction {
                token,
                durations,
                value,
                duration,
                max_rate,
                min_value,
                collateral_token,
                collateral_value,
            } => protocol
                .init_auction(
                    tx,
                    Params {
                        token,
                        durations,
                        value,
                        duration,
                        max_rate,
                        min_value,
                        collateral_token,
                        collateral_value,
                    },
                )
                .map(drop),
            Self::PlaceBid {
                auction_id,
                rate,
                value,
                celer_value,
                salt,
            } => {
                let hash = Plaintext {
                    rate,
                    value,
                    celer_value,
                    salt,
                }
                .hash();
                protocol.place_bid(tx, auction_id, hash, celer_value)
            }
            Self::RevealBid {
                auction_id,
                rate,
                value,
                celer_value,
                salt,
                commitment_id,
            } => protocol.reveal_bid(
                tx,
                auction_id,
                Plaintext {
                    rate,
                    value,
                    celer_value,
                    salt,
                },
                commitment_id,
            ),
            Self::ClaimWinners {
                auction_id,
                winners,
                top_loser,
            } => protocol.claim_winners(tx, auction_id, winners, top_loser),
            Self::ChallengeWinners {
                auction_id,
                challenger,
                winners,
                top_loser,
            } => protocol.challenge_winners(tx, auction_id, challenger, winners, top_loser),
            Self::FinalizeAuction { auction_id } => {
                protocol.finalize_auction(tx, auction_id).map(drop)
            }
            Self::FinalizeBid { auction_id } => protocol.finalize_bid(tx, auction_id).map(drop),
            Self::RepayAuction { auction_id } => protocol.repay_auction(tx, auction_id).map(drop),
            Self::CollectCollateral { auction_id } => {
                protocol.collect_collateral(tx, auction_id).map(drop)
            }
            Self::TransferFeeDeposit { auction_id } => {
                protocol.transfer_fee_deposit(tx, auction_id).map(drop)
            }
            Self::WithdrawPayments { token } => protocol.withdraw_payments(tx, token).map(drop),
            Self::UpdateWhitelist { enabled } => protocol.update_whitelist(tx, enabled),
            Self::AddWhitelisted { accounts } => protocol.add_whitelisted(tx, accounts),
            Self::UpdateRegistryToken { token, supported } => {
                protocol.update_registry_token(tx, token, supported)
            }
            Self::PauseRegistry => protocol.pause_registry(tx),
            Self::UnpauseRegistry => protocol.unpause_registry(tx),
        }
    }
}

/// What a replay produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub steps: usize,
    /// Calls that failed as expected.
    pub rejected: usize,
    pub block: u64,
    pub timestamp: u64,
    pub events: Vec<Event>,
}

pub async fn load(path: &Path) -> anyhow::Result<Scenario> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    serde_json::from_str(&data).with_context(|| format!("invalid scenario in {path:?}"))
}

/// Runs every step in order. Stops at the first call whose outcome differs
/// from what the step expects.
pub fn replay(protocol: &mut Protocol, scenario: Scenario) -> anyhow::Result<Report> {
    let steps = scenario.steps.len();
    let mut rejected = 0;
    for (index, step) in scenario.steps.into_iter().enumerate() {
        match step {
            Step::AdvanceBlocks { blocks } => protocol.advance_blocks(blocks),
            Step::AdvanceTime { seconds } => protocol.advance_time(seconds),
            Step::Mint {
                token,
                account,
                amount,
            } => protocol.mint(token, account, amount),
            Step::Approve {
                owner,
                token,
                spender,
                amount,
            } => protocol.approve(owner, token, spender, amount),
            Step::Call {
                from,
                value,
                call,
                expect_error,
            } => {
                let method: &'static str = (&call).into();
                let result = call.submit(protocol, Tx::new(from).with_value(value));
                match (result, expect_error) {
                    (Ok(()), None) => {
                        tracing::debug!(step = index, method, %from, "call succeeded");
                    }
                    (Err(err), Some(expected)) if matches_error(&err, &expected) => {
                        tracing::debug!(step = index, method, %from, %err, "call rejected");
                        rejected += 1;
                    }
                    (Err(err), expected) => {
                        return Err(anyhow::Error::new(err).context(format!(
                            "step {index}: {method} from {from} failed, expected {}",
                            expected.as_deref().unwrap_or("success")
                        )));
                    }
                    (Ok(()), Some(expected)) => {
                        anyhow::bail!(
                            "step {index}: {method} from {from} succeeded, expected {expected}"
                        );
                    }
                }
            }
        }
    }

    let chain = protocol.chain();
    tracing::info!(steps, rejected, block = %chain.block, "replayed scenario");
    Ok(Report {
        steps,
        rejected,
        block: chain.block.0,
        timestamp: chain.timestamp,
        events: protocol.events().to_vec(),
    })
}

fn matches_error(err: &engine::Error, expected: &str) -> bool {
    format!("{err:?}").contains(expected) || err.to_string().contains(expected)
}
