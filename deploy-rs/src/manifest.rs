use crate::artifacts::CompiledContract;
use crate::error::SetupError;
use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::Token;
use ethers::types::Address;
use serde::Deserialize;
use std::{collections::BTreeSet, fs, path::Path};

/// Replaced with the resolved deployer address in constructor arguments.
pub const DEPLOYER_ARG: &str = "{deployer}";

/// `deploy.json`: which contracts a run targets, in deploy order.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployManifest {
    pub contracts: Vec<ContractTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractTarget {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A target whose artifact is loaded and whose arguments are encoded.
#[derive(Debug, Clone)]
pub struct PreparedContract {
    pub compiled: CompiledContract,
    /// Arguments after placeholder substitution, as recorded in the deployments store.
    pub args: Vec<String>,
    pub tokens: Vec<Token>,
}

impl PreparedContract {
    pub fn name(&self) -> &str {
        &self.compiled.name
    }
}

impl DeployManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| SetupError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let manifest: DeployManifest =
            serde_json::from_str(&raw).map_err(|e| SetupError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_names(names: &[String]) -> Result<Self, SetupError> {
        let manifest = Self {
            contracts: names
                .iter()
                .map(|name| ContractTarget {
                    name: name.clone(),
                    args: Vec::new(),
                })
                .collect(),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), SetupError> {
        if self.contracts.is_empty() {
            return Err(SetupError::EmptyManifest);
        }
        let mut seen = BTreeSet::new();
        for c in &self.contracts {
            if !seen.insert(c.name.as_str()) {
                return Err(SetupError::DuplicateContract(c.name.clone()));
            }
        }
        Ok(())
    }

    /// Loads every artifact and encodes every constructor call up front, so a bad target
    /// fails the run before anything is sent.
    pub fn prepare(
        &self,
        artifacts_dir: &Path,
        deployer: Address,
    ) -> Result<Vec<PreparedContract>, SetupError> {
        self.contracts
            .iter()
            .map(|target| {
                let compiled = CompiledContract::find(artifacts_dir, &target.name)?;
                let args = substitute(&target.args, deployer);
                let tokens = encode_args(&compiled, &args)?;
                Ok(PreparedContract {
                    compiled,
                    args,
                    tokens,
                })
            })
            .collect()
    }
}

fn substitute(args: &[String], deployer: Address) -> Vec<String> {
    let deployer = ethers::utils::to_checksum(&deployer, None);
    args.iter()
        .map(|a| {
            if a == DEPLOYER_ARG {
                deployer.clone()
            } else {
                a.clone()
            }
        })
        .collect()
}

fn encode_args(compiled: &CompiledContract, args: &[String]) -> Result<Vec<Token>, SetupError> {
    let invalid = |reason: String| SetupError::InvalidArguments {
        name: compiled.name.clone(),
        reason,
    };

    let Some(constructor) = compiled.abi.constructor() else {
        if args.is_empty() {
            return Ok(Vec::new());
        }
        return Err(invalid(format!(
            "no constructor, but {} argument(s) given",
            args.len()
        )));
    };

    if constructor.inputs.len() != args.len() {
        return Err(invalid(format!(
            "constructor takes {} argument(s), {} given",
            constructor.inputs.len(),
            args.len()
        )));
    }

    constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            LenientTokenizer::tokenize(&param.kind, arg)
                .map_err(|e| invalid(format!("{} ({}): {e}", param.name, param.kind)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifacts_with_owner_ctor() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "contractName": "YourContract",
            "abi": [{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [{ "name": "_owner", "type": "address", "internalType": "address" }]
            }],
            "bytecode": "0x6080"
        });
        fs::write(
            dir.path().join("YourContract.json"),
            serde_json::to_string(&body).unwrap(),
        )
        .unwrap();
        dir
    }

    #[test]
    fn deployer_placeholder_becomes_address_token() {
        let dir = artifacts_with_owner_ctor();
        let deployer: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .unwrap();
        let manifest: DeployManifest = serde_json::from_value(json!({
            "contracts": [{ "name": "YourContract", "args": ["{deployer}"] }]
        }))
        .unwrap();
        let prepared = manifest.prepare(dir.path(), deployer).unwrap();
        assert_eq!(
            prepared[0].args,
            vec!["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()]
        );
        assert_eq!(prepared[0].tokens, vec![Token::Address(deployer)]);
    }

    #[test]
    fn wrong_argument_count_fails_preparation() {
        let dir = artifacts_with_owner_ctor();
        let manifest = DeployManifest::from_names(&["YourContract".to_string()]).unwrap();
        assert!(matches!(
            manifest.prepare(dir.path(), Address::zero()),
            Err(SetupError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn duplicates_and_empty_lists_are_rejected() {
        assert!(matches!(
            DeployManifest::from_names(&[]),
            Err(SetupError::EmptyManifest)
        ));
        assert!(matches!(
            DeployManifest::from_names(&["A".to_string(), "A".to_string()]),
            Err(SetupError::DuplicateContract(_))
        ));
    }
}
