use {
    crate::{
        domain::{Protocol, liba::Plaintext},
        infra::{cli, config, dto, scenario},
    },
    anyhow::Context,
    clap::Parser,
    tokio::fs,
};

/// Parses the arguments, sets up logging and runs the selected command. Exits
/// the process with a non-zero code if the command fails.
pub async fn start(args: impl Iterator<Item = String>) {
    let args = cli::Args::parse_from(args);
    let mut obs_config = observe::Config::default().with_env_filter(&args.log);
    if args.log_json {
        obs_config = obs_config.with_json_format();
    }
    observe::tracing::initialize(&obs_config);
    tracing::info!("running liba with {args:#?}");

    if let Err(err) = run(args.command).await {
        tracing::error!(?err, "command failed");
        std::process::exit(1);
    }
}

pub async fn run(command: cli::Command) -> anyhow::Result<()> {
    match command {
        cli::Command::Winners { input } => {
            let data = fs::read_to_string(&input)
                .await
                .with_context(|| format!("I/O error while reading {input:?}"))?;
            let auction = serde_json::from_str::<dto::Auction>(&data)
                .with_context(|| format!("invalid auction in {input:?}"))?;
            println!("{}", serde_json::to_string_pretty(&auction.rank())?);
        }
        cli::Command::Hash {
            rate,
            value,
            celer_value,
            salt,
        } => {
            let plaintext = Plaintext {
                rate,
                value,
                celer_value,
                salt,
            };
            println!("{}", plaintext.hash());
        }
        cli::Command::Replay {
            config,
            scenario: path,
        } => {
            let config = config::load(&config).await?;
            let scenario = scenario::load(&path).await?;
            let mut protocol = Protocol::new(config);
            let report = scenario::replay(&mut protocol, scenario)
                .with_context(|| format!("replaying {path:?}"))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
