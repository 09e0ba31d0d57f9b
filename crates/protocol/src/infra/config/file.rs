use {
    crate::domain::{
        engine::{self, Grant},
        liba,
        polc,
    },
    anyhow::Context,
    model::{TokenAddress, u256_decimal::DecimalU256},
    serde::Deserialize,
    serde_with::serde_as,
    std::{collections::HashSet, path::Path},
    tokio::fs,
    winner_selection::{Address, U256},
};

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    ledger: LedgerConfig,
    registry: RegistryConfig,
    /// Balances to mint before the first call.
    #[serde(default)]
    genesis: Vec<GenesisEntry>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct LedgerConfig {
    /// Account the ledger holds committed funds in.
    address: Address,

    /// Account allowed to pause, unpause, drain and manage tokens.
    owner: Address,

    /// Token the lock reward is paid in.
    reward_token: TokenAddress,

    /// Reward paid per day of lock.
    #[serde_as(as = "DecimalU256")]
    block_reward: U256,

    /// ERC-20 tokens accepted for commitments. The native asset is always
    /// accepted.
    #[serde(default)]
    supported_tokens: Vec<TokenAddress>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RegistryConfig {
    /// Account the registry holds stakes, deposits and collateral in. The
    /// ledger only accepts lending calls from this account.
    address: Address,

    owner: Address,

    /// Receives the deposits of settled auctions.
    treasury: Address,

    /// Token stakes and auction deposits are posted in.
    stake_token: TokenAddress,

    #[serde_as(as = "DecimalU256")]
    auction_deposit: U256,

    /// Smallest stake a bid may post.
    #[serde_as(as = "DecimalU256")]
    min_stake: U256,

    /// Restricts opening auctions to the whitelisted askers.
    #[serde(default)]
    whitelist_enabled: bool,

    #[serde(default)]
    whitelist: Vec<Address>,

    /// ERC-20 tokens that can be borrowed or pledged. The native asset is
    /// always supported.
    #[serde(default)]
    supported_tokens: Vec<TokenAddress>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct GenesisEntry {
    token: TokenAddress,
    account: Address,
    #[serde_as(as = "DecimalU256")]
    amount: U256,
}

/// Load the protocol configuration from a TOML file.
pub async fn load(path: &Path) -> anyhow::Result<engine::Config> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    load_str(&data).with_context(|| format!("invalid configuration in {path:?}"))
}

/// Parse the protocol configuration from a TOML string.
pub fn load_str(data: &str) -> anyhow::Result<engine::Config> {
    let config = toml::de::from_str::<Config>(data).context("TOML syntax error")?;
    anyhow::ensure!(
        config.ledger.address != config.registry.address,
        "the ledger and the registry must use different accounts"
    );

    Ok(engine::Config {
        ledger: polc::Config {
            address: config.ledger.address,
            owner: config.ledger.owner,
            reward_token: config.ledger.reward_token,
            block_reward: config.ledger.block_reward,
            supported_tokens: config.ledger.supported_tokens.into_iter().collect(),
            liba: Some(config.registry.address),
        },
        registry: liba::Config {
            address: config.registry.address,
            owner: config.registry.owner,
            treasury: config.registry.treasury,
            stake_token: config.registry.stake_token,
            auction_deposit: config.registry.auction_deposit,
            min_stake: config.registry.min_stake,
            whitelist_enabled: config.registry.whitelist_enabled,
            whitelist: config.registry.whitelist.into_iter().collect::<HashSet<_>>(),
            supported_tokens: config.registry.supported_tokens.into_iter().collect(),
        },
        genesis: config
            .genesis
            .into_iter()
            .map(|entry| Grant {
                token: entry.token,
                account: entry.account,
                amount: entry.amount,
            })
            .collect(),
    })
}
