//! CLI arguments for the `liba` binary.

use {
    clap::{Parser, Subcommand},
    std::path::PathBuf,
    winner_selection::U256,
};

/// Off-chain tooling for lending blind auctions
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "info")]
    pub log: String,

    /// Emit log lines as JSON.
    #[arg(long, env)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Computes the winner set of an auction from its revealed bids.
    Winners {
        /// Path to a JSON file with the requested value and the revealed
        /// bids.
        #[arg(long)]
        input: PathBuf,
    },
    /// Computes the sealed hash of a bid.
    Hash {
        #[arg(long, value_parser = parse_u256)]
        rate: U256,
        #[arg(long, value_parser = parse_u256)]
        value: U256,
        #[arg(long, value_parser = parse_u256)]
        celer_value: U256,
        #[arg(long, value_parser = parse_u256)]
        salt: U256,
    },
    /// Replays a scenario against a fresh protocol instance and prints the
    /// emitted events.
    Replay {
        /// Path to the protocol configuration file. This file should be in
        /// TOML format.
        #[arg(long, env)]
        config: PathBuf,

        /// Path to the scenario file. This file should be in JSON format.
        #[arg(long)]
        scenario: PathBuf,
    },
}

fn parse_u256(value: &str) -> Result<U256, String> {
    U256::from_str_radix(value, 10).map_err(|err| format!("invalid decimal u256: {err}"))
}
