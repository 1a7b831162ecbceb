mod check;
mod config;

use clap::{Args, Parser, Subcommand};
use config::ScaffoldConfig;
use eyre::{eyre, Result};
use scaffold_chains::ProcessEnv;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scaffold-client",
    version,
    about = "Front-end chain configuration and its consistency with the deploy side"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the client chain configuration as JSON.
    Show(TargetArgs),

    /// Check the client networks against the deploy side and the deployed-contracts artifact.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Comma-separated target networks. Defaults to every client target.
    #[arg(long, env = "SCAFFOLD_TARGET_NETWORKS", value_delimiter = ',')]
    networks: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    targets: TargetArgs,

    /// Generated deployed-contracts artifact.
    #[arg(
        long,
        env = "SCAFFOLD_DEPLOYED_CONTRACTS",
        default_value = "contracts/deployedContracts.ts"
    )]
    contracts: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Show(args) => cmd_show(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_show(args: TargetArgs) -> Result<()> {
    let cfg = ScaffoldConfig::load(&ProcessEnv, &args.networks)?;
    println!("{}", serde_json::to_string_pretty(&cfg.to_view())?);
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let cfg = ScaffoldConfig::load(&ProcessEnv, &args.targets.networks)?;
    let compiler = check::compiler_registry(&ProcessEnv)?;
    let artifact = check::read_artifact(&args.contracts)?;

    let report = check::check(&cfg, &compiler, artifact.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        return Err(eyre!(
            "{} target network(s) have no deployed contracts in {}",
            report.missing.len(),
            args.contracts.display()
        ));
    }
    Ok(())
}
