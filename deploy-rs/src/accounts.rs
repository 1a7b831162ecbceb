use crate::error::SetupError;
use ethers::prelude::LocalWallet;
use ethers::signers::Signer;
use scaffold_chains::env::{self, Env, Source};
use scaffold_chains::ChainProfile;
use std::collections::BTreeMap;
use std::fmt;

pub const DEPLOYER: &str = "deployer";

/// Private key used to sign deployments.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployerCredential {
    key: String,
    source: Source,
}

impl fmt::Debug for DeployerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployerCredential")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl DeployerCredential {
    /// `DEPLOYER_PRIVATE_KEY`, or the local node's account #0 key.
    pub fn resolve(env: &impl Env) -> Self {
        let resolved = env::resolve_with_source(
            env,
            env::DEPLOYER_PRIVATE_KEY,
            env::PLACEHOLDER_DEPLOYER_KEY,
        );
        Self {
            key: resolved.value.trim().to_string(),
            source: resolved.source,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            key: env::PLACEHOLDER_DEPLOYER_KEY.to_string(),
            source: Source::Fallback,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == Source::Fallback
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn wallet(&self, chain_id: u64) -> Result<LocalWallet, SetupError> {
        let key = self.key.trim_start_matches("0x");
        let wallet = key
            .parse::<LocalWallet>()
            .map_err(|e| SetupError::InvalidDeployerKey(e.to_string()))?;
        Ok(wallet.with_chain_id(chain_id))
    }
}

/// Accounts a network makes available for signing.
///
/// Local networks always expose the node's own funded account; every other network signs
/// with the configured deployer credential.
pub fn network_accounts(
    network: &str,
    profile: &ChainProfile,
    credential: &DeployerCredential,
) -> Result<Vec<DeployerCredential>, SetupError> {
    if profile.local {
        return Ok(vec![DeployerCredential::placeholder()]);
    }
    if credential.is_placeholder() {
        return Err(SetupError::PlaceholderKeyRejected {
            network: network.to_string(),
            chain_id: profile.id,
        });
    }
    Ok(vec![credential.clone()])
}

/// Role name → index into the active network's accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAccounts(BTreeMap<String, usize>);

impl Default for NamedAccounts {
    fn default() -> Self {
        Self(BTreeMap::from([(DEPLOYER.to_string(), 0)]))
    }
}

impl NamedAccounts {
    pub fn index_of(&self, role: &str) -> Option<usize> {
        self.0.get(role).copied()
    }

    /// Picks the credential for `role` out of the network's accounts.
    pub fn resolve<'a>(
        &self,
        role: &str,
        network: &str,
        accounts: &'a [DeployerCredential],
    ) -> Result<&'a DeployerCredential, SetupError> {
        let index = self
            .index_of(role)
            .ok_or_else(|| SetupError::UnknownNamedAccount(role.to_string()))?;
        accounts
            .get(index)
            .ok_or_else(|| SetupError::AccountIndexOutOfRange {
                role: role.to_string(),
                index,
                network: network.to_string(),
                available: accounts.len(),
            })
    }
}
