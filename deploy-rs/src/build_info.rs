//! Inheritance data from the compiler's build-info files.
//!
//! Each artifact `<Name>.json` has a `<Name>.dbg.json` sibling pointing at the build-info file
//! of the compilation that produced it. Its AST gives the linearized base contracts, and its
//! output gives each base contract's abi.

use eyre::{eyre, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Function name → source file of the base contract declaring it.
///
/// Empty when the contract inherits nothing or no build-info is available.
pub fn inherited_functions(
    artifact: &Path,
    source_name: &str,
    contract: &str,
) -> BTreeMap<String, String> {
    match load(artifact, contract) {
        Ok(Some(info)) => from_build_info(&info, source_name, contract),
        Ok(None) => {
            tracing::debug!(contract = %contract, "no build-info next to artifact; no inherited functions");
            BTreeMap::new()
        }
        Err(e) => {
            tracing::warn!(contract = %contract, error = %e, "unreadable build-info; no inherited functions");
            BTreeMap::new()
        }
    }
}

fn load(artifact: &Path, contract: &str) -> Result<Option<Value>> {
    let dbg = artifact.with_file_name(format!("{contract}.dbg.json"));
    if !dbg.exists() {
        return Ok(None);
    }
    let dbg_json = read_json(&dbg)?;
    let Some(rel) = dbg_json["buildInfo"].as_str() else {
        return Ok(None);
    };
    let path: PathBuf = dbg.parent().unwrap_or(Path::new(".")).join(rel);
    read_json(&path).map(Some)
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .map_err(|e| eyre!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| eyre!("failed to parse {}: {e}", path.display()))
}

pub fn from_build_info(info: &Value, source_name: &str, contract: &str) -> BTreeMap<String, String> {
    let output = &info["output"];

    // AST id → (source, contract name)
    let mut definitions: HashMap<u64, (&str, &str)> = HashMap::new();
    let mut bases: Vec<u64> = Vec::new();
    for (source, unit) in output["sources"].as_object().into_iter().flatten() {
        for node in unit["ast"]["nodes"].as_array().into_iter().flatten() {
            if node["nodeType"] != "ContractDefinition" {
                continue;
            }
            let (Some(id), Some(name)) = (node["id"].as_u64(), node["name"].as_str()) else {
                continue;
            };
            definitions.insert(id, (source.as_str(), name));
            if source == source_name && name == contract {
                bases = node["linearizedBaseContracts"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_u64)
                    .collect();
            }
        }
    }

    // Linearization lists the contract itself first and the root base last. Walking from the
    // root lets closer bases win.
    let mut functions = BTreeMap::new();
    for id in bases.iter().skip(1).rev() {
        let Some(&(source, name)) = definitions.get(id) else {
            continue;
        };
        for item in output["contracts"][source][name]["abi"]
            .as_array()
            .into_iter()
            .flatten()
        {
            if item["type"] != "function" {
                continue;
            }
            if let Some(function) = item["name"].as_str() {
                functions.insert(function.to_string(), source.to_string());
            }
        }
    }
    functions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn function(name: &str) -> Value {
        json!({ "type": "function", "name": name, "inputs": [], "outputs": [], "stateMutability": "view" })
    }

    fn contract_node(id: u64, name: &str, bases: &[u64]) -> Value {
        json!({ "nodeType": "ContractDefinition", "id": id, "name": name, "linearizedBaseContracts": bases })
    }

    /// YourContract is Ownable, Ownable is Context.
    fn build_info() -> Value {
        json!({
            "output": {
                "sources": {
                    "contracts/YourContract.sol": { "ast": { "nodes": [
                        { "nodeType": "PragmaDirective", "id": 1 },
                        contract_node(30, "YourContract", &[30, 20, 10])
                    ] } },
                    "@openzeppelin/contracts/access/Ownable.sol": { "ast": { "nodes": [
                        contract_node(20, "Ownable", &[20, 10])
                    ] } },
                    "@openzeppelin/contracts/utils/Context.sol": { "ast": { "nodes": [
                        contract_node(10, "Context", &[10])
                    ] } }
                },
                "contracts": {
                    "contracts/YourContract.sol": { "YourContract": { "abi": [function("greeting"), function("owner")] } },
                    "@openzeppelin/contracts/access/Ownable.sol": { "Ownable": { "abi": [
                        function("owner"), function("transferOwnership"),
                        { "type": "event", "name": "OwnershipTransferred", "inputs": [], "anonymous": false }
                    ] } },
                    "@openzeppelin/contracts/utils/Context.sol": { "Context": { "abi": [] } }
                }
            }
        })
    }

    #[test]
    fn base_functions_map_to_their_source() {
        let functions =
            from_build_info(&build_info(), "contracts/YourContract.sol", "YourContract");
        let ownable = "@openzeppelin/contracts/access/Ownable.sol".to_string();
        assert_eq!(
            functions,
            BTreeMap::from([
                ("owner".to_string(), ownable.clone()),
                ("transferOwnership".to_string(), ownable),
            ])
        );
    }

    #[test]
    fn root_contract_inherits_nothing() {
        let functions = from_build_info(
            &build_info(),
            "@openzeppelin/contracts/utils/Context.sol",
            "Context",
        );
        assert!(functions.is_empty());
    }

    #[test]
    fn follows_the_dbg_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_dir = dir.path().join("contracts/YourContract.sol");
        fs::create_dir_all(&artifact_dir).unwrap();
        fs::create_dir_all(dir.path().join("build-info")).unwrap();
        fs::write(
            dir.path().join("build-info/abc123.json"),
            build_info().to_string(),
        )
        .unwrap();
        fs::write(
            artifact_dir.join("YourContract.dbg.json"),
            json!({ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc123.json" })
                .to_string(),
        )
        .unwrap();

        let functions = inherited_functions(
            &artifact_dir.join("YourContract.json"),
            "contracts/YourContract.sol",
            "YourContract",
        );
        assert_eq!(functions.len(), 2);

        let missing = inherited_functions(
            &dir.path().join("Other.sol/Other.json"),
            "contracts/Other.sol",
            "Other",
        );
        assert!(missing.is_empty());
    }
}
