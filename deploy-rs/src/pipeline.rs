//! Deploy, then regenerate the deployed-contracts artifact.
//!
//! ```text
//! Idle → Deploying → DeploySucceeded → Regenerating → Published
//!            ↓                                    ↘ RegenerationFailed
//!       DeployFailed → Idle
//! ```
//!
//! Stages run in order and stop at the first failure. Regeneration only ever sees a complete
//! contract set: records are committed after every target deployed, and nothing is published
//! when any of them failed.

use crate::backend::DeployBackend;
use crate::deployments::{DeploymentRecord, DeploymentStore};
use crate::generate::{self, ArtifactPublisher, PublishedArtifact};
use crate::manifest::PreparedContract;
use ethers::types::Address;
use eyre::eyre;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Deploying,
    DeploySucceeded,
    DeployFailed,
    Regenerating,
    RegenerationFailed,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Deploy,
    RegenerateArtifacts,
}

pub const DEPLOY_STAGES: &[Stage] = &[Stage::Deploy, Stage::RegenerateArtifacts];
pub const REGENERATE_STAGES: &[Stage] = &[Stage::RegenerateArtifacts];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot deploy to '{network}': {cause:#}")]
    Preflight { network: String, cause: eyre::Report },

    #[error("deploy to '{network}' failed at contract '{contract}': {cause:#}")]
    Deploy {
        network: String,
        contract: String,
        cause: eyre::Report,
    },

    #[error(
        "contracts were sent to '{network}' but their deployment records could not be saved: {cause:#}"
    )]
    Record { network: String, cause: eyre::Report },

    #[error(
        "deployment succeeded but publishing {} failed: {cause:#}\nOn-chain state is final. Run `scaffold-deploy generate` to publish again; do not redeploy.",
        .path.display()
    )]
    Regeneration { path: PathBuf, cause: eyre::Report },
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Regeneration { .. } => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    pub deployed: Vec<String>,
    pub reused: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub deploy: Option<DeployOutcome>,
    pub artifact: Option<PublishedArtifact>,
}

/// Network the deploy stage targets.
pub struct DeployTarget<'a> {
    pub network: &'a str,
    pub chain_id: u64,
    pub backend: &'a dyn DeployBackend,
}

pub struct DeployPipeline<'a> {
    store: &'a DeploymentStore,
    publisher: &'a ArtifactPublisher,
    state: PipelineState,
    history: Vec<PipelineState>,
    /// Chain id and contracts the deploy stage of this invocation committed.
    committed: Option<(u64, Vec<String>)>,
}

impl<'a> DeployPipeline<'a> {
    pub fn new(store: &'a DeploymentStore, publisher: &'a ArtifactPublisher) -> Self {
        Self {
            store,
            publisher,
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            committed: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Deploys `contracts` to `target`, then publishes. Returns only after the artifact is on
    /// disk.
    pub async fn run(
        &mut self,
        target: &DeployTarget<'_>,
        contracts: &[PreparedContract],
    ) -> Result<PipelineReport, PipelineError> {
        self.run_stages(DEPLOY_STAGES, Some(target), contracts).await
    }

    /// Publishes from the recorded deployments without touching any chain.
    pub async fn regenerate_only(&mut self) -> Result<PipelineReport, PipelineError> {
        self.run_stages(REGENERATE_STAGES, None, &[]).await
    }

    async fn run_stages(
        &mut self,
        stages: &[Stage],
        target: Option<&DeployTarget<'_>>,
        contracts: &[PreparedContract],
    ) -> Result<PipelineReport, PipelineError> {
        self.state = PipelineState::Idle;
        self.history = vec![PipelineState::Idle];
        self.committed = None;

        let mut report = PipelineReport::default();
        for stage in stages {
            match (stage, target) {
                (Stage::Deploy, Some(target)) => {
                    report.deploy = Some(self.deploy(target, contracts).await?)
                }
                (Stage::Deploy, None) => {
                    return Err(PipelineError::Preflight {
                        network: String::new(),
                        cause: eyre!("deploy stage scheduled without a target network"),
                    })
                }
                (Stage::RegenerateArtifacts, _) => report.artifact = Some(self.regenerate()?),
            }
        }
        Ok(report)
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::info!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
        self.history.push(next);
    }

    /// Nothing was written, so the pipeline is back where it started.
    fn fail_deploy(&mut self) {
        self.transition(PipelineState::DeployFailed);
        self.transition(PipelineState::Idle);
    }

    async fn deploy(
        &mut self,
        target: &DeployTarget<'_>,
        contracts: &[PreparedContract],
    ) -> Result<DeployOutcome, PipelineError> {
        self.transition(PipelineState::Deploying);
        match self.deploy_all(target, contracts).await {
            Ok((outcome, records)) => {
                if let Err(cause) = self.store.commit(target.network, target.chain_id, &records) {
                    self.fail_deploy();
                    return Err(PipelineError::Record {
                        network: target.network.to_string(),
                        cause,
                    });
                }
                self.committed = Some((target.chain_id, records.into_keys().collect()));
                self.transition(PipelineState::DeploySucceeded);
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(network = %target.network, error = %err, "deploy failed; nothing will be published");
                self.fail_deploy();
                Err(err)
            }
        }
    }

    async fn deploy_all(
        &self,
        target: &DeployTarget<'_>,
        contracts: &[PreparedContract],
    ) -> Result<(DeployOutcome, BTreeMap<String, DeploymentRecord>), PipelineError> {
        let network = target.network;
        let backend = target.backend;
        let preflight = |cause: eyre::Report| PipelineError::Preflight {
            network: network.to_string(),
            cause,
        };

        // Hard safety check: ensure we're connected to the expected chain.
        let remote = backend.chain_id().await.map_err(preflight)?;
        if remote != target.chain_id {
            return Err(preflight(eyre!(
                "RPC chainId mismatch: network expects {}, but RPC reports {}",
                target.chain_id,
                remote
            )));
        }

        tracing::info!(
            network = %network,
            chain_id = target.chain_id,
            deployer = ?backend.deployer(),
            contracts = contracts.len(),
            "deploying"
        );

        let mut outcome = DeployOutcome::default();
        let mut records = BTreeMap::new();
        for contract in contracts {
            let name = contract.name();
            let failed = |cause: eyre::Report| PipelineError::Deploy {
                network: network.to_string(),
                contract: name.to_string(),
                cause,
            };

            let bytecode_hash = contract.compiled.bytecode_hash();
            let previous = self.store.load(network, name).map_err(failed)?;
            if let Some(mut prev) = previous {
                if reusable(backend, &prev, &bytecode_hash, contract)
                    .await
                    .map_err(failed)?
                {
                    prev.inherited_functions = contract.compiled.inherited_functions.clone();
                    tracing::info!(contract = %name, address = %prev.address, "reusing unchanged deployment");
                    outcome.reused.push(name.to_string());
                    records.insert(name.to_string(), prev);
                    continue;
                }
            }

            let deployed = backend
                .deploy(&contract.compiled, contract.tokens.clone())
                .await
                .map_err(failed)?;
            tracing::info!(
                contract = %name,
                address = ?deployed.address,
                tx = ?deployed.transaction_hash,
                "deployed"
            );

            outcome.deployed.push(name.to_string());
            records.insert(
                name.to_string(),
                DeploymentRecord {
                    address: ethers::utils::to_checksum(&deployed.address, None),
                    abi: contract.compiled.abi_json.clone(),
                    transaction_hash: deployed.transaction_hash.map(|h| format!("{h:#x}")),
                    block_number: deployed.block_number,
                    bytecode_hash,
                    args: contract.args.clone(),
                    inherited_functions: contract.compiled.inherited_functions.clone(),
                },
            );
        }
        Ok((outcome, records))
    }

    fn regenerate(&mut self) -> Result<PublishedArtifact, PipelineError> {
        self.transition(PipelineState::Regenerating);
        let result = generate::build_declaration(self.store).and_then(|decl| {
            if let Some((chain_id, names)) = &self.committed {
                let on_chain = decl.contracts_on(*chain_id);
                let missing: Vec<&str> = names
                    .iter()
                    .filter(|name| on_chain.map_or(true, |c| !c.contains_key(name.as_str())))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    return Err(eyre!(
                        "regenerated artifact lacks {} on chain {chain_id}",
                        missing.join(", ")
                    ));
                }
            }
            self.publisher.publish(&decl)
        });

        match result {
            Ok(published) => {
                self.transition(PipelineState::Published);
                Ok(published)
            }
            Err(cause) => {
                self.transition(PipelineState::RegenerationFailed);
                Err(PipelineError::Regeneration {
                    path: self.publisher.path().to_path_buf(),
                    cause,
                })
            }
        }
    }
}

/// Same bytecode, same arguments, and the code is still there.
async fn reusable(
    backend: &dyn DeployBackend,
    prev: &DeploymentRecord,
    bytecode_hash: &str,
    contract: &PreparedContract,
) -> eyre::Result<bool> {
    if prev.bytecode_hash != bytecode_hash || prev.args != contract.args {
        return Ok(false);
    }
    let Ok(address) = prev.address.parse::<Address>() else {
        tracing::warn!(contract = %contract.name(), address = %prev.address, "unparsable recorded address; redeploying");
        return Ok(false);
    };
    backend.has_code(address).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use crate::compiler::CompilerProfiles;
    use crate::config::HarnessConfig;
    use crate::manifest::DeployManifest;
    use scaffold_chains::{ArtifactFormat, ContractsDeclaration, MapEnv};
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    struct Fixture {
        dir: tempfile::TempDir,
        store: DeploymentStore,
        publisher: ArtifactPublisher,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (i, name) in ["YourContract", "Token", "Vault"].iter().enumerate() {
                let body = json!({
                    "contractName": name,
                    "sourceName": format!("contracts/{name}.sol"),
                    "abi": [{ "type": "function", "name": "owner", "inputs": [], "outputs": [], "stateMutability": "view" }],
                    "bytecode": format!("0x60806040{:02x}", i),
                });
                let path = dir.path().join(format!("artifacts/contracts/{name}.sol/{name}.json"));
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, serde_json::to_string(&body).unwrap()).unwrap();
            }
            let store = DeploymentStore::new(dir.path().join("deployments"));
            let publisher =
                ArtifactPublisher::new(dir.path().join("nextjs/contracts/deployedContracts.ts"));
            Self {
                dir,
                store,
                publisher,
            }
        }

        fn targets(&self, names: &[&str]) -> Vec<PreparedContract> {
            let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
            DeployManifest::from_names(&names)
                .unwrap()
                .prepare(&self.dir.path().join("artifacts"), Address::zero())
                .unwrap()
        }

        fn published(&self) -> ContractsDeclaration {
            read_artifact(self.publisher.path())
        }
    }

    fn on<'a>(network: &'a str, chain_id: u64, backend: &'a MockBackend) -> DeployTarget<'a> {
        DeployTarget {
            network,
            chain_id,
            backend,
        }
    }

    fn read_artifact(path: &Path) -> ContractsDeclaration {
        let raw = fs::read_to_string(path).unwrap();
        ContractsDeclaration::parse(&raw, ArtifactFormat::for_path(path)).unwrap()
    }

    #[tokio::test]
    async fn local_deploy_with_defaults_publishes_every_contract() {
        let cfg = HarnessConfig::load(&MapEnv::new(), CompilerProfiles::default()).unwrap();
        let deployer = cfg.deployer_for(cfg.network_or_default(None)).unwrap();
        assert!(deployer.credential.is_placeholder());
        assert!(cfg.provider_api_key.is_fallback());

        let fx = Fixture::new();
        let backend = MockBackend::new(deployer.profile.id);
        let target = on(&deployer.network, deployer.profile.id, &backend);
        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);
        let report = pipeline
            .run(&target, &fx.targets(&["YourContract", "Token"]))
            .await
            .unwrap();

        assert_eq!(
            pipeline.history(),
            &[
                PipelineState::Idle,
                PipelineState::Deploying,
                PipelineState::DeploySucceeded,
                PipelineState::Regenerating,
                PipelineState::Published,
            ]
        );
        assert_eq!(report.deploy.unwrap().deployed, vec!["YourContract", "Token"]);
        let decl = fx.published();
        let local = decl.contracts_on(31_337).unwrap();
        assert_eq!(
            local.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Token", "YourContract"]
        );
    }

    #[tokio::test]
    async fn failing_contract_aborts_the_whole_set() {
        let fx = Fixture::new();
        let backend = MockBackend::new(31_337).failing_on("Token");
        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);

        let err = pipeline
            .run(
                &on("hardhat", 31_337, &backend),
                &fx.targets(&["YourContract", "Token", "Vault"]),
            )
            .await
            .unwrap_err();

        match &err {
            PipelineError::Deploy { contract, .. } => assert_eq!(contract, "Token"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            pipeline.history(),
            &[
                PipelineState::Idle,
                PipelineState::Deploying,
                PipelineState::DeployFailed,
                PipelineState::Idle,
            ]
        );
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(!fx.publisher.path().exists());
        assert!(fx.store.load_all().unwrap().is_empty());
        // Vault never reached.
        assert_eq!(backend.deploy_count(), 1);
    }

    #[tokio::test]
    async fn rerun_without_changes_is_byte_identical() {
        let fx = Fixture::new();
        let backend = MockBackend::new(31_337);
        let target = on("hardhat", 31_337, &backend);
        let contracts = fx.targets(&["YourContract", "Token"]);

        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);
        pipeline.run(&target, &contracts).await.unwrap();
        let first = fs::read(fx.publisher.path()).unwrap();

        let report = pipeline.run(&target, &contracts).await.unwrap();
        let second = fs::read(fx.publisher.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.deploy_count(), 2);
        assert_eq!(report.deploy.unwrap().reused, vec!["YourContract", "Token"]);
    }

    #[tokio::test]
    async fn reused_contract_picks_up_inherited_functions() {
        let fx = Fixture::new();
        let backend = MockBackend::new(31_337);
        let target = on("hardhat", 31_337, &backend);
        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);
        pipeline
            .run(&target, &fx.targets(&["YourContract"]))
            .await
            .unwrap();
        assert!(fx.published().contracts_on(31_337).unwrap()["YourContract"]
            .inherited_functions
            .is_empty());

        // Build-info shows up without the bytecode changing.
        let artifacts = fx.dir.path().join("artifacts");
        let ownable = "@openzeppelin/contracts/access/Ownable.sol";
        fs::write(
            artifacts.join("contracts/YourContract.sol/YourContract.dbg.json"),
            json!({ "buildInfo": "../../build-info/1.json" }).to_string(),
        )
        .unwrap();
        fs::create_dir_all(artifacts.join("build-info")).unwrap();
        fs::write(
            artifacts.join("build-info/1.json"),
            json!({ "output": {
                "sources": {
                    "contracts/YourContract.sol": { "ast": { "nodes": [
                        { "nodeType": "ContractDefinition", "id": 2, "name": "YourContract", "linearizedBaseContracts": [2, 1] }
                    ] } },
                    ownable: { "ast": { "nodes": [
                        { "nodeType": "ContractDefinition", "id": 1, "name": "Ownable", "linearizedBaseContracts": [1] }
                    ] } }
                },
                "contracts": { ownable: { "Ownable": { "abi": [
                    { "type": "function", "name": "renounceOwnership", "inputs": [], "outputs": [], "stateMutability": "nonpayable" }
                ] } } }
            } })
            .to_string(),
        )
        .unwrap();

        let report = pipeline
            .run(&target, &fx.targets(&["YourContract"]))
            .await
            .unwrap();
        assert_eq!(report.deploy.unwrap().reused, vec!["YourContract"]);
        assert_eq!(backend.deploy_count(), 1);
        let decl = fx.published();
        assert_eq!(
            decl.contracts_on(31_337).unwrap()["YourContract"].inherited_functions
                ["renounceOwnership"],
            ownable
        );
    }

    #[tokio::test]
    async fn wiped_node_gets_fresh_deployments() {
        let fx = Fixture::new();
        let backend = MockBackend::new(31_337);
        let target = on("hardhat", 31_337, &backend);
        let contracts = fx.targets(&["YourContract"]);
        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);

        pipeline.run(&target, &contracts).await.unwrap();
        backend.wipe();
        let report = pipeline.run(&target, &contracts).await.unwrap();

        assert_eq!(report.deploy.unwrap().deployed, vec!["YourContract"]);
        assert_eq!(backend.deploy_count(), 2);
    }

    #[tokio::test]
    async fn wrong_chain_is_refused_before_sending() {
        let fx = Fixture::new();
        let backend = MockBackend::new(1);
        let mut pipeline = DeployPipeline::new(&fx.store, &fx.publisher);

        let err = pipeline
            .run(
                &on("metisSepolia", 59_902, &backend),
                &fx.targets(&["YourContract"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Preflight { .. }));
        assert_eq!(backend.deploy_count(), 0);
        assert!(!fx.publisher.path().exists());
    }

    #[tokio::test]
    async fn publish_failure_is_recoverable_without_redeploying() {
        let fx = Fixture::new();
        let blocker = fx.dir.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();
        let broken = ArtifactPublisher::new(blocker.join("deployedContracts.ts"));

        let backend = MockBackend::new(59_902);
        let target = on("metisSepolia", 59_902, &backend);
        let mut pipeline = DeployPipeline::new(&fx.store, &broken);

        let err = pipeline
            .run(&target, &fx.targets(&["YourContract", "Token"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Regeneration { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("scaffold-deploy generate"));
        assert_eq!(pipeline.state(), PipelineState::RegenerationFailed);
        assert_eq!(backend.deploy_count(), 2);

        let mut retry = DeployPipeline::new(&fx.store, &fx.publisher);
        let report = retry.regenerate_only().await.unwrap();
        assert!(report.deploy.is_none());
        assert_eq!(retry.state(), PipelineState::Published);
        assert_eq!(backend.deploy_count(), 2);

        let decl = fx.published();
        let metis = decl.contracts_on(59_902).unwrap();
        let recorded = fx.store.load("metisSepolia", "Token").unwrap().unwrap();
        assert_eq!(metis["Token"].address, recorded.address);
        assert_eq!(metis.len(), 2);
    }

    #[tokio::test]
    async fn artifact_covers_every_deployed_network() {
        let fx = Fixture::new();
        let local = MockBackend::new(31_337);
        let metis = MockBackend::new(59_902);

        DeployPipeline::new(&fx.store, &fx.publisher)
            .run(&on("hardhat", 31_337, &local), &fx.targets(&["YourContract"]))
            .await
            .unwrap();
        DeployPipeline::new(&fx.store, &fx.publisher)
            .run(&on("metisSepolia", 59_902, &metis), &fx.targets(&["YourContract"]))
            .await
            .unwrap();

        let decl = fx.published();
        assert_eq!(decl.chain_ids().collect::<Vec<_>>(), vec![31_337, 59_902]);
    }
}
