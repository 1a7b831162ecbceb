//! Static network declarations shared by the deploy harness and the client.
//!
//! Adding a network means adding one entry to [`NETWORKS`]. Both registries are projections of
//! this list, so nothing else enumerates networks.

use crate::alchemy;
use crate::env::{self, Env};
use crate::error::ConfigError;
use crate::profile::{BlockExplorer, ChainProfile, Forking, NativeCurrency};

pub const LOCAL_CHAIN_ID: u64 = 31_337;
pub const METIS_SEPOLIA_CHAIN_ID: u64 = 59_902;

#[derive(Debug, Clone, Copy)]
pub struct CurrencyDef {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct ExplorerDef {
    pub name: &'static str,
    pub url: &'static str,
}

/// One network, declared once.
#[derive(Debug, Clone, Copy)]
pub struct NetworkDefinition {
    /// Name used on the command line and as the deployments sub-directory.
    pub key: &'static str,
    pub chain_id: u64,
    pub name: &'static str,
    pub currency: CurrencyDef,
    pub rpc_urls: &'static [&'static str],
    pub explorer: Option<ExplorerDef>,
    pub testnet: bool,
    pub local: bool,
    /// Env var that replaces the RPC URL for deploys.
    pub compiler_rpc_env: Option<&'static str>,
    /// Env var that is tried first by the front-end.
    pub client_rpc_env: Option<&'static str>,
    /// Local node can fork mainnet through the provider API key.
    pub mainnet_fork: bool,
    /// Offered by the client chain-selection UI.
    pub client_target: bool,
}

const ETHER: CurrencyDef = CurrencyDef {
    name: "Ether",
    symbol: "ETH",
    decimals: 18,
};

pub const NETWORKS: &[NetworkDefinition] = &[
    NetworkDefinition {
        key: "hardhat",
        chain_id: LOCAL_CHAIN_ID,
        name: "Hardhat",
        currency: ETHER,
        rpc_urls: &["http://127.0.0.1:8545"],
        explorer: None,
        testnet: false,
        local: true,
        compiler_rpc_env: None,
        client_rpc_env: None,
        mainnet_fork: true,
        client_target: true,
    },
    NetworkDefinition {
        key: "metisSepolia",
        chain_id: METIS_SEPOLIA_CHAIN_ID,
        name: "Metis Sepolia",
        currency: CurrencyDef {
            name: "tMETIS",
            symbol: "tMETIS",
            decimals: 18,
        },
        rpc_urls: &["https://sepolia.metisdevops.link/"],
        explorer: Some(ExplorerDef {
            name: "Metis Sepolia Explorer",
            url: "https://sepolia-explorer.metisdevops.link/",
        }),
        testnet: true,
        local: false,
        compiler_rpc_env: Some("METIS_RPC_URL"),
        client_rpc_env: Some("NEXT_PUBLIC_METIS_RPC_URL"),
        mainnet_fork: false,
        client_target: true,
    },
];

/// Network used when none is named.
pub const DEFAULT_NETWORK: &str = "hardhat";

pub fn find(key: &str) -> Option<&'static NetworkDefinition> {
    NETWORKS.iter().find(|d| d.key == key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Compiler,
    Client,
}

impl NetworkDefinition {
    /// Resolves this declaration against `env` for one side.
    pub fn project(&self, side: Side, env: &impl Env) -> Result<ChainProfile, ConfigError> {
        let rpc_urls = match side {
            Side::Compiler => self.compiler_rpc_urls(env),
            Side::Client => self.client_rpc_urls(env),
        };
        if rpc_urls.is_empty() {
            return Err(ConfigError::MissingRpcUrl {
                network: self.key.to_string(),
            });
        }

        let forking = match side {
            Side::Compiler if self.mainnet_fork => {
                let api_key =
                    env::resolve(env, env::ALCHEMY_API_KEY, env::DEFAULT_ALCHEMY_API_KEY);
                Some(Forking {
                    url: alchemy::mainnet_fork_url(&api_key),
                    enabled: env::resolve_parsed(env, env::MAINNET_FORKING_ENABLED, false),
                })
            }
            _ => None,
        };

        Ok(ChainProfile {
            id: self.chain_id,
            name: self.name.to_string(),
            native_currency: NativeCurrency {
                name: self.currency.name.to_string(),
                symbol: self.currency.symbol.to_string(),
                decimals: self.currency.decimals,
            },
            rpc_urls,
            block_explorer: self.explorer.map(|e| BlockExplorer {
                name: e.name.to_string(),
                url: e.url.to_string(),
            }),
            testnet: self.testnet,
            local: self.local,
            forking,
        })
    }

    fn compiler_rpc_urls(&self, env: &impl Env) -> Vec<String> {
        if let Some(url) = self.compiler_rpc_env.and_then(|k| env::lookup(env, k)) {
            return vec![url];
        }
        self.rpc_urls.iter().map(|u| u.to_string()).collect()
    }

    fn client_rpc_urls(&self, env: &impl Env) -> Vec<String> {
        let api_key = env::resolve(
            env,
            env::NEXT_PUBLIC_ALCHEMY_API_KEY,
            env::DEFAULT_ALCHEMY_API_KEY,
        );

        let mut urls: Vec<String> = Vec::new();
        let candidates = self
            .client_rpc_env
            .and_then(|k| env::lookup(env, k))
            .into_iter()
            .chain(alchemy::http_url(self.chain_id, &api_key))
            .chain(self.rpc_urls.iter().map(|u| u.to_string()));
        for url in candidates {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}
