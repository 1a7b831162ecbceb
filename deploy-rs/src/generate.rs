use crate::atomic::write_atomic;
use crate::deployments::DeploymentStore;
use eyre::{eyre, Result};
use scaffold_chains::{ArtifactFormat, ContractDescriptor, ContractsDeclaration};
use std::path::{Path, PathBuf};

/// Builds the complete artifact from every network's deployment records.
///
/// Always a full rebuild; nothing from a previously published artifact is carried over.
pub fn build_declaration(store: &DeploymentStore) -> Result<ContractsDeclaration> {
    let mut decl = ContractsDeclaration::default();
    for network in store.load_all()? {
        if let Some(existing) = decl.chains.get(&network.chain_id) {
            if !existing.is_empty() {
                tracing::warn!(
                    network = %network.network,
                    chain_id = network.chain_id,
                    "several deployment directories share this chain id; later directory wins per contract"
                );
            }
        }
        for (name, record) in network.contracts {
            decl.insert(
                network.chain_id,
                name,
                ContractDescriptor {
                    address: record.address,
                    abi: record.abi,
                    inherited_functions: record.inherited_functions,
                },
            );
        }
    }
    Ok(decl)
}

#[derive(Debug, Clone)]
pub struct PublishedArtifact {
    pub path: PathBuf,
    pub chains: usize,
    pub contracts: usize,
}

/// Owner of the well-known artifact location.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    path: PathBuf,
    format: ArtifactFormat,
}

impl ArtifactPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = ArtifactFormat::for_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders `decl` and atomically replaces the artifact.
    pub fn publish(&self, decl: &ContractsDeclaration) -> Result<PublishedArtifact> {
        let rendered = decl
            .render(self.format)
            .map_err(|e| eyre!("failed to render deployed contracts: {e}"))?;
        write_atomic(&self.path, rendered.as_bytes())?;

        let published = PublishedArtifact {
            path: self.path.clone(),
            chains: decl.chains.len(),
            contracts: decl.chains.values().map(|c| c.len()).sum(),
        };
        tracing::info!(
            path = %published.path.display(),
            chains = published.chains,
            contracts = published.contracts,
            "published deployed contracts"
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::DeploymentRecord;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::fs;

    fn store_with_one_contract(dir: &Path) -> DeploymentStore {
        let store = DeploymentStore::new(dir.join("deployments"));
        let mut records = BTreeMap::new();
        records.insert(
            "YourContract".to_string(),
            DeploymentRecord {
                address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
                abi: json!([{ "type": "function", "name": "greeting", "inputs": [], "outputs": [], "stateMutability": "view" }]),
                transaction_hash: Some("0x01".into()),
                block_number: Some(1),
                bytecode_hash: "0xaa".into(),
                args: vec![],
                inherited_functions: BTreeMap::from([(
                    "owner".to_string(),
                    "@openzeppelin/contracts/access/Ownable.sol".to_string(),
                )]),
            },
        );
        store.commit("hardhat", 31_337, &records).unwrap();
        store
    }

    #[test]
    fn declaration_is_keyed_by_chain_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_one_contract(dir.path());
        let decl = build_declaration(&store).unwrap();
        let local = decl.contracts_on(31_337).unwrap();
        assert_eq!(
            local["YourContract"].address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert_eq!(
            local["YourContract"].inherited_functions["owner"],
            "@openzeppelin/contracts/access/Ownable.sol"
        );
    }

    #[test]
    fn republishing_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_one_contract(dir.path());
        let publisher = ArtifactPublisher::new(dir.path().join("out/deployedContracts.ts"));

        publisher.publish(&build_declaration(&store).unwrap()).unwrap();
        let first = fs::read(publisher.path()).unwrap();
        publisher.publish(&build_declaration(&store).unwrap()).unwrap();
        let second = fs::read(publisher.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn publish_replaces_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = ArtifactPublisher::new(dir.path().join("deployedContracts.json"));
        fs::write(
            publisher.path(),
            r#"{"1":{"Stale":{"address":"0x00","abi":[]}}}"#,
        )
        .unwrap();

        let store = store_with_one_contract(dir.path());
        publisher.publish(&build_declaration(&store).unwrap()).unwrap();

        let raw = fs::read_to_string(publisher.path()).unwrap();
        let decl = ContractsDeclaration::parse(&raw, ArtifactFormat::Json).unwrap();
        assert!(decl.contracts_on(1).is_none());
        assert!(decl.contracts_on(31_337).is_some());
    }
}
