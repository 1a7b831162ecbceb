use crate::definitions::{NetworkDefinition, Side};
use crate::env::Env;
use crate::error::{ConfigError, RegistryError};
use crate::profile::ChainProfile;
use std::collections::BTreeMap;

/// Network name → chain parameters for one side (compiler or client).
///
/// Chain ids are unique within a registry. Networks keep the order they were registered in;
/// the first one is the client's default chain.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    side: Side,
    profiles: Vec<(String, ChainProfile)>,
    by_name: BTreeMap<String, usize>,
    by_chain_id: BTreeMap<u64, usize>,
}

impl NetworkRegistry {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            profiles: Vec::new(),
            by_name: BTreeMap::new(),
            by_chain_id: BTreeMap::new(),
        }
    }

    /// Projects `defs` for `side`.
    ///
    /// The compiler side gets every definition; the client side gets the ones flagged as
    /// client targets.
    pub fn project(
        defs: &[NetworkDefinition],
        side: Side,
        env: &impl Env,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new(side);
        for def in defs {
            if side == Side::Client && !def.client_target {
                continue;
            }
            registry.register(def.key, def.project(side, env)?)?;
        }
        Ok(registry)
    }

    /// Projects only the named definitions, in the given order.
    pub fn project_selected(
        defs: &[NetworkDefinition],
        names: &[String],
        side: Side,
        env: &impl Env,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new(side);
        for name in names {
            let def = defs
                .iter()
                .find(|d| d.key == name.as_str())
                .ok_or_else(|| ConfigError::UnknownNetwork(name.clone()))?;
            registry.register(def.key, def.project(side, env)?)?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        network: impl Into<String>,
        profile: ChainProfile,
    ) -> Result<(), ConfigError> {
        let network = network.into();
        if self.by_name.contains_key(&network) {
            return Err(ConfigError::DuplicateNetwork { network });
        }
        if let Some(&first) = self.by_chain_id.get(&profile.id) {
            return Err(ConfigError::DuplicateChainId {
                chain_id: profile.id,
                first: self.profiles[first].0.clone(),
                second: network,
            });
        }
        if profile.rpc_urls.is_empty() {
            return Err(ConfigError::MissingRpcUrl { network });
        }

        tracing::debug!(side = ?self.side, network = %network, chain_id = profile.id, "registered network");
        let index = self.profiles.len();
        self.by_chain_id.insert(profile.id, index);
        self.by_name.insert(network.clone(), index);
        self.profiles.push((network, profile));
        Ok(())
    }

    pub fn resolve(&self, network: &str) -> Result<&ChainProfile, RegistryError> {
        self.by_name
            .get(network)
            .map(|&i| &self.profiles[i].1)
            .ok_or_else(|| RegistryError::NotFound(network.to_string()))
    }

    /// Returns the network name and profile registered under `chain_id`.
    pub fn by_chain_id(&self, chain_id: u64) -> Option<(&str, &ChainProfile)> {
        let (name, profile) = &self.profiles[*self.by_chain_id.get(&chain_id)?];
        Some((name.as_str(), profile))
    }

    /// In registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChainProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|(k, _)| k.as_str())
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.profiles.iter().map(|(_, p)| p.id)
    }

    /// The first registered network.
    pub fn default_network(&self) -> Option<(&str, &ChainProfile)> {
        self.profiles.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Every network present in both registries must agree on its chain parameters.
///
/// RPC endpoints are allowed to differ; each side resolves its own overrides.
pub fn check_consistency(a: &NetworkRegistry, b: &NetworkRegistry) -> Result<(), ConfigError> {
    for (name, left) in a.iter() {
        let Ok(right) = b.resolve(name) else {
            continue;
        };
        let field = if left.id != right.id {
            "chain id"
        } else if left.native_currency != right.native_currency {
            "native currency"
        } else if left.testnet != right.testnet {
            "testnet flag"
        } else if left.local != right.local {
            "local flag"
        } else {
            continue;
        };
        return Err(ConfigError::InconsistentNetwork {
            network: name.to_string(),
            field,
        });
    }
    Ok(())
}
