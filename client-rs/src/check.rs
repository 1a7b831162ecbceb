use crate::config::ScaffoldConfig;
use scaffold_chains::contracts::ArtifactParseError;
use scaffold_chains::{
    check_consistency, ArtifactFormat, ConfigError, ContractsDeclaration, NetworkRegistry, Side,
    NETWORKS,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: ArtifactParseError,
    },
}

/// Target network with no contracts in the generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingContracts {
    pub network: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// False when the artifact has not been generated yet.
    pub artifact_present: bool,
    pub missing: Vec<MissingContracts>,
    /// Chains in the artifact that no target network points at.
    pub untargeted_chains: Vec<u64>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.artifact_present && self.missing.is_empty()
    }
}

/// Reads the generated artifact. A missing file is `Ok(None)`.
pub fn read_artifact(path: &Path) -> Result<Option<ContractsDeclaration>, CheckError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CheckError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ContractsDeclaration::parse(&raw, ArtifactFormat::for_path(path))
        .map(Some)
        .map_err(|source| CheckError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Cross-checks the client configuration against the deploy side and the generated artifact.
///
/// Conflicting chain parameters are an error. Target networks without contracts are reported.
pub fn check(
    cfg: &ScaffoldConfig,
    compiler: &NetworkRegistry,
    artifact: Option<&ContractsDeclaration>,
) -> Result<CheckReport, CheckError> {
    check_consistency(compiler, &cfg.target_networks)?;

    let Some(decl) = artifact else {
        tracing::warn!("deployed contracts artifact not found; run a deploy first");
        return Ok(CheckReport {
            artifact_present: false,
            missing: cfg
                .target_networks
                .iter()
                .map(|(network, chain)| MissingContracts {
                    network: network.to_string(),
                    chain_id: chain.id,
                })
                .collect(),
            untargeted_chains: Vec::new(),
        });
    };

    let mut report = CheckReport {
        artifact_present: true,
        ..CheckReport::default()
    };
    for (network, chain) in cfg.target_networks.iter() {
        if decl.contracts_on(chain.id).is_none() {
            tracing::warn!(network = %network, chain_id = chain.id, "target network has no deployed contracts");
            report.missing.push(MissingContracts {
                network: network.to_string(),
                chain_id: chain.id,
            });
        }
    }
    report.untargeted_chains = decl
        .chain_ids()
        .filter(|id| cfg.target_networks.by_chain_id(*id).is_none())
        .collect();
    Ok(report)
}

/// Loads the deploy-side projection the client is checked against.
pub fn compiler_registry(env: &impl scaffold_chains::Env) -> Result<NetworkRegistry, CheckError> {
    Ok(NetworkRegistry::project(NETWORKS, Side::Compiler, env)?)
}
