//! Network definitions and environment resolution shared by `scaffold-deploy` and
//! `scaffold-client`, plus the format of the deployed-contracts artifact passed between them.

pub mod alchemy;
pub mod contracts;
pub mod definitions;
pub mod env;
pub mod error;
pub mod profile;
pub mod registry;

pub use contracts::{ArtifactFormat, ContractDescriptor, ContractsDeclaration};
pub use definitions::{NetworkDefinition, Side, DEFAULT_NETWORK, NETWORKS};
pub use env::{Env, MapEnv, ProcessEnv};
pub use error::{ConfigError, RegistryError};
pub use profile::{BlockExplorer, ChainProfile, Forking, NativeCurrency};
pub use registry::{check_consistency, NetworkRegistry};
