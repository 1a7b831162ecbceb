use crate::build_info;
use crate::error::SetupError;
use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Compiler output for one contract: interface + creation bytecode.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub name: String,
    pub abi_json: serde_json::Value,
    pub abi: Abi,
    pub bytecode: Bytes,
    /// Function name → source file of the base contract declaring it.
    pub inherited_functions: BTreeMap<String, String>,
}

/// Accepts both `"bytecode": "0x.."` and `"bytecode": { "object": "0x.." }` layouts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Plain(String),
    Object { object: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompiledRaw {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    abi: serde_json::Value,
    bytecode: BytecodeField,
}

impl CompiledContract {
    /// Finds `<name>.json` anywhere below `dir` and loads it.
    pub fn find(dir: impl AsRef<Path>, name: &str) -> Result<Self, SetupError> {
        let dir = dir.as_ref();
        let path = find_artifact_file(dir, name)?.ok_or_else(|| SetupError::MissingArtifact {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })?;
        Self::load(&path, name)
    }

    pub fn load(path: &Path, name: &str) -> Result<Self, SetupError> {
        let raw = fs::read_to_string(path).map_err(|e| SetupError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let raw: CompiledRaw = serde_json::from_str(&raw).map_err(|e| SetupError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let invalid = |reason: String| SetupError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        if let Some(declared) = raw.contract_name.as_deref() {
            if declared != name {
                return Err(invalid(format!(
                    "{} declares contractName '{declared}'",
                    path.display()
                )));
            }
        }

        let abi: Abi = serde_json::from_value(raw.abi.clone())
            .map_err(|e| invalid(format!("invalid abi: {e}")))?;

        let hex_str = match &raw.bytecode {
            BytecodeField::Plain(s) => s.as_str(),
            BytecodeField::Object { object } => object.as_str(),
        };
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        if hex_str.is_empty() {
            return Err(invalid(
                "empty bytecode (abstract contract or interface?)".to_string(),
            ));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| invalid(format!("invalid bytecode hex (unlinked library?): {e}")))?;

        let inherited_functions = raw
            .source_name
            .as_deref()
            .map(|source| build_info::inherited_functions(path, source, name))
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            inherited_functions,
            abi_json: raw.abi,
            abi,
            bytecode: Bytes::from(bytes),
        })
    }

    /// keccak256 of the creation bytecode, used to detect unchanged contracts.
    pub fn bytecode_hash(&self) -> String {
        format!(
            "0x{}",
            hex::encode(ethers::utils::keccak256(self.bytecode.as_ref()))
        )
    }
}

fn find_artifact_file(dir: &Path, name: &str) -> Result<Option<PathBuf>, SetupError> {
    let file_name = format!("{name}.json");
    let entries = fs::read_dir(dir).map_err(|e| SetupError::Read {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut subdirs = Vec::new();
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            // build-info holds compiler inputs, not per-contract artifacts.
            if path.file_name().and_then(|n| n.to_str()) != Some("build-info") {
                subdirs.push(path);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name.as_str()) {
            return Ok(Some(path));
        }
    }

    for sub in subdirs {
        if let Some(found) = find_artifact_file(&sub, name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
