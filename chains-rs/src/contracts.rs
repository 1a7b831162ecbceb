//! The generated deployed-contracts artifact.
//!
//! Written only by the deploy harness, read only by the client build. Keys are sorted and no
//! timestamps are embedded, so the same deployments always render to the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// One contract on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDescriptor {
    pub address: String,
    pub abi: serde_json::Value,
    /// Function name → source file of the parent contract declaring it.
    #[serde(default)]
    pub inherited_functions: BTreeMap<String, String>,
}

/// chain id → contract name → descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractsDeclaration {
    pub chains: BTreeMap<u64, BTreeMap<String, ContractDescriptor>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    /// `const deployedContracts = {...} as const;` module for the front-end.
    TypeScript,
}

impl ArtifactFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => ArtifactFormat::TypeScript,
            _ => ArtifactFormat::Json,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactParseError {
    #[error("generated module does not contain a deployedContracts declaration")]
    MissingDeclaration,
    #[error("invalid deployed contracts json: {0}")]
    Json(#[from] serde_json::Error),
}

const TS_HEADER: &str = "/**\n * This file is autogenerated by scaffold-deploy.\n * You should not edit it manually or your changes might be overwritten.\n */\nimport { GenericContractsDeclaration } from \"~~/utils/scaffold-eth/contract\";\n\n";
const TS_DECL: &str = "const deployedContracts = ";
const TS_FOOTER: &str =
    " as const;\n\nexport default deployedContracts satisfies GenericContractsDeclaration;\n";

impl ContractsDeclaration {
    pub fn insert(&mut self, chain_id: u64, name: impl Into<String>, desc: ContractDescriptor) {
        self.chains
            .entry(chain_id)
            .or_default()
            .insert(name.into(), desc);
    }

    pub fn contracts_on(&self, chain_id: u64) -> Option<&BTreeMap<String, ContractDescriptor>> {
        self.chains.get(&chain_id).filter(|c| !c.is_empty())
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.values().all(BTreeMap::is_empty)
    }

    pub fn render(&self, format: ArtifactFormat) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(match format {
            ArtifactFormat::Json => format!("{json}\n"),
            ArtifactFormat::TypeScript => format!("{TS_HEADER}{TS_DECL}{json}{TS_FOOTER}"),
        })
    }

    pub fn parse(raw: &str, format: ArtifactFormat) -> Result<Self, ArtifactParseError> {
        let json = match format {
            ArtifactFormat::Json => raw,
            ArtifactFormat::TypeScript => {
                let start = raw
                    .find(TS_DECL)
                    .ok_or(ArtifactParseError::MissingDeclaration)?
                    + TS_DECL.len();
                let end = raw
                    .rfind(" as const;")
                    .filter(|end| *end >= start)
                    .ok_or(ArtifactParseError::MissingDeclaration)?;
                &raw[start..end]
            }
        };
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ContractsDeclaration {
        let mut decl = ContractsDeclaration::default();
        decl.insert(
            59_902,
            "YourContract",
            ContractDescriptor {
                address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
                abi: json!([{ "type": "function", "name": "greeting", "inputs": [], "outputs": [] }]),
                inherited_functions: BTreeMap::new(),
            },
        );
        decl.insert(
            31_337,
            "YourContract",
            ContractDescriptor {
                address: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".into(),
                abi: json!([]),
                inherited_functions: BTreeMap::new(),
            },
        );
        decl
    }

    #[test]
    fn chains_render_in_ascending_order() {
        let out = sample().render(ArtifactFormat::Json).unwrap();
        let local = out.find("\"31337\"").unwrap();
        let metis = out.find("\"59902\"").unwrap();
        assert!(local < metis);
        assert!(out.contains("\"inheritedFunctions\""));
    }

    #[test]
    fn typescript_module_wraps_and_parses_back() {
        let decl = sample();
        let module = decl.render(ArtifactFormat::TypeScript).unwrap();
        assert!(module.starts_with("/**\n * This file is autogenerated"));
        assert!(module.ends_with("satisfies GenericContractsDeclaration;\n"));
        let parsed = ContractsDeclaration::parse(&module, ArtifactFormat::TypeScript).unwrap();
        assert_eq!(parsed, decl);
    }

    #[test]
    fn module_without_declaration_is_rejected() {
        let err = ContractsDeclaration::parse("export {};", ArtifactFormat::TypeScript).unwrap_err();
        assert!(matches!(err, ArtifactParseError::MissingDeclaration));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ArtifactFormat::for_path(Path::new("contracts/deployedContracts.ts")),
            ArtifactFormat::TypeScript
        );
        assert_eq!(
            ArtifactFormat::for_path(Path::new("out/deployedContracts.json")),
            ArtifactFormat::Json
        );
    }
}
