//! Provider URL construction for API-key-bearing endpoints.

const RPC_CHAIN_NAMES: &[(u64, &str)] = &[
    (1, "eth-mainnet"),
    (11_155_111, "eth-sepolia"),
    (10, "opt-mainnet"),
    (11_155_420, "opt-sepolia"),
    (42_161, "arb-mainnet"),
    (421_614, "arb-sepolia"),
    (137, "polygon-mainnet"),
    (80_002, "polygon-amoy"),
    (8_453, "base-mainnet"),
    (84_532, "base-sepolia"),
];

/// HTTP endpoint for `chain_id`, or `None` when the provider does not serve that chain.
pub fn http_url(chain_id: u64, api_key: &str) -> Option<String> {
    RPC_CHAIN_NAMES
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| format!("https://{name}.g.alchemy.com/v2/{api_key}"))
}

/// Upstream used when the local node forks mainnet.
pub fn mainnet_fork_url(api_key: &str) -> String {
    format!("https://eth-mainnet.alchemyapi.io/v2/{api_key}")
}
