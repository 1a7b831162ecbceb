mod accounts;
mod artifacts;
mod atomic;
mod backend;
mod build_info;
mod compiler;
mod config;
mod deployments;
mod error;
mod generate;
mod manifest;
mod pipeline;

use backend::EthersBackend;
use clap::{Args, Parser, Subcommand};
use compiler::CompilerProfiles;
use config::HarnessConfig;
use deployments::DeploymentStore;
use error::SetupError;
use ethers::signers::Signer;
use eyre::{eyre, Result};
use generate::ArtifactPublisher;
use manifest::DeployManifest;
use pipeline::{DeployPipeline, DeployTarget, PipelineError, PipelineReport};
use scaffold_chains::env::ProcessEnv;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for configuration and setup errors.
const EXIT_SETUP: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "scaffold-deploy",
    version,
    about = "Deploys contracts and regenerates the deployed-contracts artifact"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the manifest's contracts, then regenerate the deployed-contracts artifact.
    Deploy(DeployArgs),

    /// Regenerate the artifact from recorded deployments without touching any chain.
    Generate(OutputArgs),

    /// Print the compiler-side network registry as JSON.
    Networks,

    /// Print the deployer account resolved for a network.
    Account(AccountArgs),

    /// Print the solc settings of every compiler profile.
    Compilers(CompilerArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory holding per-network deployment records.
    #[arg(long, default_value = "deployments")]
    deployments: PathBuf,

    /// Where the deployed-contracts artifact is written. `.ts` gets a TypeScript module.
    #[arg(
        long,
        env = "SCAFFOLD_DEPLOYED_CONTRACTS",
        default_value = "../nextjs/contracts/deployedContracts.ts"
    )]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CompilerArgs {
    /// JSON file with a list of `{ version, settings: { optimizer: { enabled, runs } } }`.
    /// Defaults to solc 0.8.20 with the optimizer on at 200 runs.
    #[arg(long)]
    compilers: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeployArgs {
    /// Target network. Defaults to the local development node.
    #[arg(long)]
    network: Option<String>,

    /// Deploy manifest: `{ "contracts": [{ "name": "...", "args": [...] }] }`.
    #[arg(long, default_value = "deploy.json")]
    manifest: PathBuf,

    /// Deploy these contracts (no constructor args) instead of reading the manifest.
    #[arg(long = "contract", value_name = "NAME")]
    contracts: Vec<String>,

    /// Compiled artifacts directory.
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    compiler: CompilerArgs,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[arg(long)]
    network: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        // Logs on stderr; stdout is for command output.
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.cmd {
        Command::Deploy(args) => cmd_deploy(args).await,
        Command::Generate(args) => cmd_generate(args).await,
        Command::Networks => cmd_networks(),
        Command::Account(args) => cmd_account(args),
        Command::Compilers(args) => cmd_compilers(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &eyre::Report) -> u8 {
    if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
        pipeline.exit_code()
    } else if err.downcast_ref::<SetupError>().is_some() {
        EXIT_SETUP
    } else {
        1
    }
}

fn load_compilers(args: &CompilerArgs) -> Result<CompilerProfiles, SetupError> {
    match &args.compilers {
        Some(path) => CompilerProfiles::load(path),
        None => Ok(CompilerProfiles::default()),
    }
}

async fn cmd_deploy(args: DeployArgs) -> Result<()> {
    let cfg = HarnessConfig::load(&ProcessEnv, load_compilers(&args.compiler)?)?;
    let network = cfg.network_or_default(args.network.as_deref()).to_string();
    let deployer = cfg.deployer_for(&network)?;

    let compiler = cfg.compilers.default_profile();
    tracing::debug!(
        version = %compiler.version,
        optimizer = compiler.optimizer_enabled,
        runs = compiler.optimizer_runs,
        "compiler profile"
    );
    if let Some(fork) = deployer.profile.forking.as_ref().filter(|f| f.enabled) {
        tracing::info!(url = %fork.url, "mainnet forking enabled; start the local node with this fork url");
    }

    let manifest = if args.contracts.is_empty() {
        DeployManifest::load(&args.manifest)?
    } else {
        DeployManifest::from_names(&args.contracts)?
    };
    let contracts = manifest.prepare(&args.artifacts, deployer.wallet.address())?;

    let rpc_url = deployer
        .profile
        .default_rpc_url()
        .ok_or_else(|| eyre!("network '{network}' has no rpc url"))?;
    let backend = EthersBackend::connect(rpc_url, deployer.wallet.clone())?;

    let store = DeploymentStore::new(&args.output.deployments);
    let publisher = ArtifactPublisher::new(&args.output.out);
    let target = DeployTarget {
        network: &network,
        chain_id: deployer.profile.id,
        backend: &backend,
    };

    let report = DeployPipeline::new(&store, &publisher)
        .run(&target, &contracts)
        .await?;
    print_report(&network, &report);
    Ok(())
}

async fn cmd_generate(args: OutputArgs) -> Result<()> {
    let store = DeploymentStore::new(&args.deployments);
    let publisher = ArtifactPublisher::new(&args.out);
    let report = DeployPipeline::new(&store, &publisher)
        .regenerate_only()
        .await?;
    print_report("-", &report);
    Ok(())
}

fn cmd_networks() -> Result<()> {
    let cfg = HarnessConfig::load(&ProcessEnv, CompilerProfiles::default())?;
    let networks: serde_json::Map<String, serde_json::Value> = cfg
        .networks
        .iter()
        .map(|(name, profile)| Ok((name.to_string(), serde_json::to_value(profile)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    println!("{}", serde_json::to_string_pretty(&networks)?);
    Ok(())
}

fn cmd_account(args: AccountArgs) -> Result<()> {
    let cfg = HarnessConfig::load(&ProcessEnv, CompilerProfiles::default())?;
    let network = cfg.network_or_default(args.network.as_deref());
    let deployer = cfg.deployer_for(network)?;
    let out = serde_json::json!({
        "network": deployer.network,
        "chainId": deployer.profile.id,
        "deployer": ethers::utils::to_checksum(&deployer.wallet.address(), None),
        "placeholder": deployer.credential.is_placeholder(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_compilers(args: CompilerArgs) -> Result<()> {
    let compilers = load_compilers(&args)?;
    println!("{}", serde_json::to_string_pretty(&compilers.to_json())?);
    Ok(())
}

fn print_report(network: &str, report: &PipelineReport) {
    if let Some(deploy) = &report.deploy {
        println!(
            "network={network} deployed={} reused={}",
            deploy.deployed.join(","),
            deploy.reused.join(",")
        );
    }
    if let Some(artifact) = &report.artifact {
        println!(
            "published {} ({} chain(s), {} contract(s))",
            artifact.path.display(),
            artifact.chains,
            artifact.contracts
        );
    }
}
