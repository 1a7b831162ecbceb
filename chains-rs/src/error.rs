use thiserror::Error;

/// Structurally invalid configuration. Always raised while loading, before any deploy or
/// client build step runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("network '{network}' has no RPC URL and no override is set")]
    MissingRpcUrl { network: String },

    #[error("network '{network}' is declared more than once")]
    DuplicateNetwork { network: String },

    #[error("chain id {chain_id} is used by both '{first}' and '{second}'")]
    DuplicateChainId {
        chain_id: u64,
        first: String,
        second: String,
    },

    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    #[error(
        "network '{network}' is declared differently on the compiler and client side: {field} differs"
    )]
    InconsistentNetwork { network: String, field: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("network '{0}' is not registered")]
    NotFound(String),
}
