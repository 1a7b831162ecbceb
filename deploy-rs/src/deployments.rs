use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

const CHAIN_ID_FILE: &str = ".chainId";
/// Hidden siblings of a network directory used while a commit swaps it.
const STAGING_SUFFIX: &str = ".staging";
const PREVIOUS_SUFFIX: &str = ".previous";

/// What the deploy step remembers about one contract on one network.
///
/// Stored as `deployments/<network>/<Contract>.json`, next to a `.chainId` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: String,
    pub abi: serde_json::Value,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub bytecode_hash: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub inherited_functions: BTreeMap<String, String>,
}

/// All records of one network directory.
#[derive(Debug, Clone)]
pub struct NetworkDeployments {
    pub network: String,
    pub chain_id: u64,
    pub contracts: BTreeMap<String, DeploymentRecord>,
}

#[derive(Debug, Clone)]
pub struct DeploymentStore {
    root: PathBuf,
}

impl DeploymentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn network_dir(&self, network: &str) -> PathBuf {
        self.root.join(network)
    }

    fn staging_dir(&self, network: &str) -> PathBuf {
        self.root.join(format!(".{network}{STAGING_SUFFIX}"))
    }

    fn previous_dir(&self, network: &str) -> PathBuf {
        self.root.join(format!(".{network}{PREVIOUS_SUFFIX}"))
    }

    pub fn load(&self, network: &str, contract: &str) -> Result<Option<DeploymentRecord>> {
        self.recover(network)?;
        let path = self.network_dir(network).join(format!("{contract}.json"));
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    /// Persists the records of a completed run.
    ///
    /// Records of contracts outside this run are carried over. The network directory is built
    /// next to the live one and swapped in, so a failure leaves the previous records untouched.
    pub fn commit(
        &self,
        network: &str,
        chain_id: u64,
        records: &BTreeMap<String, DeploymentRecord>,
    ) -> Result<()> {
        self.recover(network)?;
        let live = self.network_dir(network);
        let staging = self.staging_dir(network);

        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|e| eyre!("failed to clear {}: {e}", staging.display()))?;
        }
        fs::create_dir_all(&staging)
            .map_err(|e| eyre!("failed to create {}: {e}", staging.display()))?;

        if live.is_dir() {
            for file in record_files(&live)? {
                let replaced = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|name| records.contains_key(name));
                if replaced {
                    continue;
                }
                let Some(file_name) = file.file_name() else {
                    continue;
                };
                fs::copy(&file, staging.join(file_name))
                    .map_err(|e| eyre!("failed to carry over {}: {e}", file.display()))?;
            }
        }

        write_file(&staging.join(CHAIN_ID_FILE), chain_id.to_string().as_bytes())?;
        for (name, record) in records {
            let json = serde_json::to_string_pretty(record)
                .map_err(|e| eyre!("failed to serialize deployment record for {name}: {e}"))?;
            write_file(&staging.join(format!("{name}.json")), json.as_bytes())?;
        }

        self.swap_in(network, &staging, &live)
    }

    fn swap_in(&self, network: &str, staging: &Path, live: &Path) -> Result<()> {
        let previous = self.previous_dir(network);
        if live.exists() {
            fs::rename(live, &previous)
                .map_err(|e| eyre!("failed to move aside {}: {e}", live.display()))?;
        }
        if let Err(e) = fs::rename(staging, live) {
            if previous.exists() {
                let _ = fs::rename(&previous, live);
            }
            return Err(eyre!("failed to replace {}: {e}", live.display()));
        }
        if previous.exists() {
            if let Err(e) = fs::remove_dir_all(&previous) {
                tracing::warn!(dir = %previous.display(), error = %e, "could not remove previous deployment records");
            }
        }
        Ok(())
    }

    /// Finishes a swap that was interrupted between its two renames.
    fn recover(&self, network: &str) -> Result<()> {
        let live = self.network_dir(network);
        let previous = self.previous_dir(network);
        if !previous.exists() {
            return Ok(());
        }
        if live.exists() {
            fs::remove_dir_all(&previous)
                .map_err(|e| eyre!("failed to remove {}: {e}", previous.display()))?;
        } else {
            tracing::warn!(network = %network, "restoring deployment records from an interrupted commit");
            fs::rename(&previous, &live)
                .map_err(|e| eyre!("failed to restore {}: {e}", live.display()))?;
        }
        Ok(())
    }

    /// Every network directory that carries a `.chainId` marker, sorted by network name.
    pub fn load_all(&self) -> Result<Vec<NetworkDeployments>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut dirs = self.subdirs()?;
        let interrupted: Vec<String> = dirs
            .iter()
            .filter_map(|d| d.file_name().and_then(|n| n.to_str()))
            .filter_map(|n| n.strip_prefix('.')?.strip_suffix(PREVIOUS_SUFFIX))
            .map(str::to_string)
            .collect();
        if !interrupted.is_empty() {
            for network in &interrupted {
                self.recover(network)?;
            }
            dirs = self.subdirs()?;
        }

        let mut out = Vec::new();
        for dir in dirs {
            let Some(network) = dir.file_name().and_then(|n| n.to_str()) else {
                return Err(eyre!("non-utf8 deployments directory {}", dir.display()));
            };
            if network.starts_with('.') {
                continue;
            }
            let network = network.to_string();

            let marker = dir.join(CHAIN_ID_FILE);
            if !marker.exists() {
                tracing::debug!(dir = %dir.display(), "no .chainId marker; skipping");
                continue;
            }
            let raw = fs::read_to_string(&marker)
                .map_err(|e| eyre!("failed to read {}: {e}", marker.display()))?;
            let chain_id: u64 = raw
                .trim()
                .parse()
                .map_err(|e| eyre!("invalid chain id in {}: {e}", marker.display()))?;

            let mut contracts = BTreeMap::new();
            for file in record_files(&dir)? {
                let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                contracts.insert(name.to_string(), read_record(&file)?);
            }

            out.push(NetworkDeployments {
                network,
                chain_id,
                contracts,
            });
        }
        Ok(out)
    }

    fn subdirs(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            eyre!(
                "failed to read deployments directory {}: {e}",
                self.root.display()
            )
        })?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

/// `*.json` files of a network directory, sorted.
fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| eyre!("failed to read {}: {e}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();
    Ok(files)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| eyre!("failed to write {}: {e}", path.display()))
}

fn read_record(path: &Path) -> Result<DeploymentRecord> {
    let raw = fs::read_to_string(path)
        .map_err(|e| eyre!("failed to read deployment record {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| eyre!("failed to parse deployment record {}: {e}", path.display()))
}
