use crate::accounts::{self, DeployerCredential, NamedAccounts, DEPLOYER};
use crate::compiler::CompilerProfiles;
use crate::error::SetupError;
use ethers::prelude::LocalWallet;
use scaffold_chains::env::{self, Env, Resolved};
use scaffold_chains::{ChainProfile, NetworkRegistry, Side, DEFAULT_NETWORK, NETWORKS};

/// Everything a deploy run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub compilers: CompilerProfiles,
    pub default_network: String,
    pub named_accounts: NamedAccounts,
    pub networks: NetworkRegistry,
    pub credential: DeployerCredential,
    pub provider_api_key: Resolved<String>,
}

/// Signing setup for one network.
#[derive(Debug, Clone)]
pub struct ResolvedDeployer {
    pub network: String,
    pub profile: ChainProfile,
    pub wallet: LocalWallet,
    pub credential: DeployerCredential,
}

impl HarnessConfig {
    pub fn load(env: &impl Env, compilers: CompilerProfiles) -> Result<Self, SetupError> {
        let networks = NetworkRegistry::project(NETWORKS, Side::Compiler, env)?;

        let provider_api_key = env::resolve_with_source(
            env,
            env::ALCHEMY_API_KEY,
            env::DEFAULT_ALCHEMY_API_KEY,
        );
        if provider_api_key.is_fallback() {
            tracing::warn!(
                "ALCHEMY_API_KEY not set; using the shared public key. Get your own for anything beyond local testing."
            );
        }

        let credential = DeployerCredential::resolve(env);
        if credential.is_placeholder() {
            tracing::info!(
                "DEPLOYER_PRIVATE_KEY not set; only local networks can be deployed to"
            );
        }

        Ok(Self {
            compilers,
            default_network: DEFAULT_NETWORK.to_string(),
            named_accounts: NamedAccounts::default(),
            networks,
            credential,
            provider_api_key,
        })
    }

    pub fn network_or_default<'a>(&'a self, network: Option<&'a str>) -> &'a str {
        network.unwrap_or(self.default_network.as_str())
    }

    /// Resolves the `deployer` named account for `network`.
    pub fn deployer_for(&self, network: &str) -> Result<ResolvedDeployer, SetupError> {
        let profile = self.networks.resolve(network)?;
        let accounts = accounts::network_accounts(network, profile, &self.credential)?;
        let credential = self
            .named_accounts
            .resolve(DEPLOYER, network, &accounts)?
            .clone();
        let wallet = credential.wallet(profile.id)?;

        Ok(ResolvedDeployer {
            network: network.to_string(),
            profile: profile.clone(),
            wallet,
            credential,
        })
    }
}
