use std::collections::HashMap;
use std::str::FromStr;

/// Fallback provider API key shared by every scaffold checkout.
///
/// Rate limited and public; set `ALCHEMY_API_KEY` / `NEXT_PUBLIC_ALCHEMY_API_KEY` for real use.
pub const DEFAULT_ALCHEMY_API_KEY: &str = "oKxs-03sij-U_N0iOlrSsZFr29-IqbuF";

pub const DEFAULT_WALLET_CONNECT_PROJECT_ID: &str = "3a8170812b534d0ff9d794f19a901d64";

/// Private key of account #0 on the local simulated node.
///
/// Publicly known. Only ever valid against a local network.
pub const PLACEHOLDER_DEPLOYER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const DEPLOYER_PRIVATE_KEY: &str = "DEPLOYER_PRIVATE_KEY";
pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
pub const MAINNET_FORKING_ENABLED: &str = "MAINNET_FORKING_ENABLED";
pub const NEXT_PUBLIC_ALCHEMY_API_KEY: &str = "NEXT_PUBLIC_ALCHEMY_API_KEY";
pub const NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID: &str = "NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID";

/// Read-only view of environment variables.
///
/// Configuration is built from an explicit `Env` once at startup; nothing below the
/// binaries' `main` reads the process environment directly.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables. Used by tests and by callers that assemble configuration by hand.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Env,
    Fallback,
}

/// A resolved value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// Returns the variable's value, or `fallback` when it is unset or empty.
pub fn resolve(env: &impl Env, key: &str, fallback: &str) -> String {
    resolve_with_source(env, key, fallback).value
}

pub fn resolve_with_source(env: &impl Env, key: &str, fallback: &str) -> Resolved<String> {
    match lookup(env, key) {
        Some(value) => Resolved {
            value,
            source: Source::Env,
        },
        None => Resolved {
            value: fallback.to_string(),
            source: Source::Fallback,
        },
    }
}

/// Like [`resolve`], but parses the value. An unparsable value falls back too.
pub fn resolve_parsed<T>(env: &impl Env, key: &str, fallback: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(env, key) else {
        return fallback;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "could not parse env var; using fallback");
            fallback
        }
    }
}

/// Set-and-non-empty lookup with no fallback.
pub fn lookup(env: &impl Env, key: &str) -> Option<String> {
    env.var(key).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_yields_documented_fallback() {
        let env = MapEnv::new();
        for (key, fallback) in [
            (ALCHEMY_API_KEY, DEFAULT_ALCHEMY_API_KEY),
            (NEXT_PUBLIC_ALCHEMY_API_KEY, DEFAULT_ALCHEMY_API_KEY),
            (
                NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID,
                DEFAULT_WALLET_CONNECT_PROJECT_ID,
            ),
            (DEPLOYER_PRIVATE_KEY, PLACEHOLDER_DEPLOYER_KEY),
        ] {
            let r = resolve_with_source(&env, key, fallback);
            assert_eq!(r.value, fallback);
            assert!(r.is_fallback());
        }
    }

    #[test]
    fn set_key_wins_over_fallback() {
        let env = MapEnv::new().with(ALCHEMY_API_KEY, "my-key");
        let r = resolve_with_source(&env, ALCHEMY_API_KEY, DEFAULT_ALCHEMY_API_KEY);
        assert_eq!(r.value, "my-key");
        assert_eq!(r.source, Source::Env);
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let env = MapEnv::new().with(ALCHEMY_API_KEY, "");
        assert_eq!(
            resolve(&env, ALCHEMY_API_KEY, DEFAULT_ALCHEMY_API_KEY),
            DEFAULT_ALCHEMY_API_KEY
        );
    }

    #[test]
    fn parsed_values_fall_back_on_garbage() {
        let env = MapEnv::new()
            .with(MAINNET_FORKING_ENABLED, "true")
            .with("POLL_MS", "not-a-number");
        assert!(resolve_parsed(&env, MAINNET_FORKING_ENABLED, false));
        assert_eq!(resolve_parsed(&env, "POLL_MS", 30_000u64), 30_000);
        assert_eq!(resolve_parsed(&env, "UNSET", 7u8), 7);
    }
}
