use scaffold_chains::{ConfigError, RegistryError};
use std::path::PathBuf;
use thiserror::Error;

/// Anything wrong with the harness inputs. Raised before the first transaction is sent.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Network(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("compiler list is empty")]
    NoCompilers,

    #[error("compiler #{index}: invalid version '{version}': {reason}")]
    InvalidCompilerVersion {
        index: usize,
        version: String,
        reason: String,
    },

    #[error("compiler #{index} ({version}): optimizer runs must be > 0 when the optimizer is enabled")]
    ZeroOptimizerRuns { index: usize, version: String },

    #[error("failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("deploy manifest lists no contracts")]
    EmptyManifest,

    #[error("contract '{0}' is listed more than once")]
    DuplicateContract(String),

    #[error("no compiled artifact for contract '{name}' under {}", .dir.display())]
    MissingArtifact { name: String, dir: PathBuf },

    #[error("contract '{name}': {reason}")]
    InvalidArtifact { name: String, reason: String },

    #[error("contract '{name}': invalid constructor arguments: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("invalid deployer private key: {0}")]
    InvalidDeployerKey(String),

    #[error(
        "refusing to deploy to '{network}' (chain {chain_id}) with the placeholder deployer key; set DEPLOYER_PRIVATE_KEY"
    )]
    PlaceholderKeyRejected { network: String, chain_id: u64 },

    #[error("named account '{0}' is not configured")]
    UnknownNamedAccount(String),

    #[error(
        "named account '{role}' uses index {index} but network '{network}' has {available} account(s)"
    )]
    AccountIndexOutOfRange {
        role: String,
        index: usize,
        network: String,
        available: usize,
    },
}
