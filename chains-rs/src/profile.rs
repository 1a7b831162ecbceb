use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

/// Mainnet fork settings for the local simulated network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forking {
    pub url: String,
    pub enabled: bool,
}

/// Resolved parameters of one network, as a registry hands them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProfile {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    /// First entry is the default endpoint.
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer: Option<BlockExplorer>,
    pub testnet: bool,
    /// Simulated network running on the developer's machine.
    #[serde(default)]
    pub local: bool,
    /// Compiler side only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forking: Option<Forking>,
}

impl ChainProfile {
    pub fn default_rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }
}
