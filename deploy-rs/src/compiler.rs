use crate::error::SetupError;
use semver::Version;
use serde::Deserialize;
use std::{fs, path::Path};

const DEFAULT_RUNS: u32 = 200;

/// One entry of a compiler list file, in the same shape the JS toolchains use:
/// `{ "version": "0.8.20", "settings": { "optimizer": { "enabled": true, "runs": 200 } } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerEntryRaw {
    pub version: String,
    #[serde(default)]
    pub settings: SettingsRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRaw {
    #[serde(default)]
    pub optimizer: OptimizerRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizerRaw {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub runs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerProfile {
    pub version: Version,
    pub optimizer_enabled: bool,
    pub optimizer_runs: u32,
}

impl CompilerProfile {
    /// The `settings` fragment of a solc standard-JSON input.
    pub fn settings_json(&self) -> serde_json::Value {
        serde_json::json!({
            "optimizer": {
                "enabled": self.optimizer_enabled,
                "runs": self.optimizer_runs,
            }
        })
    }
}

/// Non-empty, validated compiler list. The first entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerProfiles(Vec<CompilerProfile>);

impl Default for CompilerProfiles {
    fn default() -> Self {
        Self(vec![CompilerProfile {
            version: Version::new(0, 8, 20),
            optimizer_enabled: true,
            optimizer_runs: DEFAULT_RUNS,
        }])
    }
}

impl CompilerProfiles {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| SetupError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let entries: Vec<CompilerEntryRaw> =
            serde_json::from_str(&raw).map_err(|e| SetupError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::from_entries(entries)
    }

    /// Validates every entry; one bad entry rejects the whole list.
    pub fn from_entries(entries: Vec<CompilerEntryRaw>) -> Result<Self, SetupError> {
        if entries.is_empty() {
            return Err(SetupError::NoCompilers);
        }

        let mut profiles = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let version = Version::parse(entry.version.trim()).map_err(|e| {
                SetupError::InvalidCompilerVersion {
                    index,
                    version: entry.version.clone(),
                    reason: e.to_string(),
                }
            })?;

            let optimizer = entry.settings.optimizer;
            let runs = optimizer.runs.unwrap_or(DEFAULT_RUNS);
            if optimizer.enabled && runs == 0 {
                return Err(SetupError::ZeroOptimizerRuns {
                    index,
                    version: entry.version,
                });
            }

            profiles.push(CompilerProfile {
                version,
                optimizer_enabled: optimizer.enabled,
                optimizer_runs: runs,
            });
        }
        Ok(Self(profiles))
    }

    pub fn default_profile(&self) -> &CompilerProfile {
        // Constructors reject empty lists.
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilerProfile> {
        self.0.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.0
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "version": p.version.to_string(),
                        "settings": p.settings_json(),
                    })
                })
                .collect(),
        )
    }
}
