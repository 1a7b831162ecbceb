use scaffold_chains::env::{self, Env, Resolved};
use scaffold_chains::{ChainProfile, ConfigError, NetworkRegistry, Side, NETWORKS};
use serde::Serialize;
use std::time::Duration;

/// How often the front-end polls its RPC endpoints.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(30_000);

/// What the front-end build is configured with.
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    pub target_networks: NetworkRegistry,
    pub polling_interval: Duration,
    pub alchemy_api_key: Resolved<String>,
    pub wallet_connect_project_id: Resolved<String>,
    /// Offer the burner wallet only on local networks.
    pub only_local_burner_wallet: bool,
}

impl ScaffoldConfig {
    /// Loads the client view of the shared network definitions.
    ///
    /// `networks` selects target networks by name; the order is kept and the first one is the
    /// default chain. Empty means every network flagged as a client target, in declaration
    /// order.
    pub fn load(env: &impl Env, networks: &[String]) -> Result<Self, ConfigError> {
        let target_networks = if networks.is_empty() {
            NetworkRegistry::project(NETWORKS, Side::Client, env)?
        } else {
            NetworkRegistry::project_selected(NETWORKS, networks, Side::Client, env)?
        };

        let alchemy_api_key = env::resolve_with_source(
            env,
            env::NEXT_PUBLIC_ALCHEMY_API_KEY,
            env::DEFAULT_ALCHEMY_API_KEY,
        );
        if alchemy_api_key.is_fallback() {
            tracing::warn!(
                "NEXT_PUBLIC_ALCHEMY_API_KEY not set; the front-end uses the shared public key"
            );
        }

        let wallet_connect_project_id = env::resolve_with_source(
            env,
            env::NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID,
            env::DEFAULT_WALLET_CONNECT_PROJECT_ID,
        );
        if wallet_connect_project_id.is_fallback() {
            tracing::warn!(
                "NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID not set; the front-end uses the shared project id"
            );
        }

        Ok(Self {
            target_networks,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            alchemy_api_key,
            wallet_connect_project_id,
            only_local_burner_wallet: true,
        })
    }

    pub fn burner_wallet_allowed(&self, chain: &ChainProfile) -> bool {
        !self.only_local_burner_wallet || chain.local
    }

    /// The shape the front-end reads.
    pub fn to_view(&self) -> ClientView<'_> {
        ClientView {
            target_networks: self
                .target_networks
                .iter()
                .map(|(network, chain)| TargetNetwork {
                    network,
                    burner_wallet: self.burner_wallet_allowed(chain),
                    chain,
                })
                .collect(),
            polling_interval: self.polling_interval.as_millis() as u64,
            alchemy_api_key: &self.alchemy_api_key.value,
            wallet_connect_project_id: &self.wallet_connect_project_id.value,
            only_local_burner_wallet: self.only_local_burner_wallet,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView<'a> {
    pub target_networks: Vec<TargetNetwork<'a>>,
    /// Milliseconds.
    pub polling_interval: u64,
    pub alchemy_api_key: &'a str,
    pub wallet_connect_project_id: &'a str,
    pub only_local_burner_wallet: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetNetwork<'a> {
    pub network: &'a str,
    pub burner_wallet: bool,
    #[serde(flatten)]
    pub chain: &'a ChainProfile,
}
