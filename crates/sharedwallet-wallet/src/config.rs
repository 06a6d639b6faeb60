//! Wallet configuration

use serde::{Deserialize, Serialize};
use sharedwallet_types::{Identity, Result};

/// Environment variable naming the owner identity
pub const OWNER_ENV: &str = "SHAREDWALLET_OWNER";
/// Environment variable naming the wallet
pub const NAME_ENV: &str = "SHAREDWALLET_NAME";

/// Configuration for a shared wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Human-readable name, used in logs
    #[serde(default = "default_name")]
    pub name: String,
    /// The initializing identity; owns the wallet for its lifetime
    pub owner: Identity,
}

fn default_name() -> String {
    "shared-wallet".to_string()
}

impl WalletConfig {
    pub fn new(owner: Identity) -> Self {
        Self {
            name: default_name(),
            owner,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load from the process environment, reading a `.env` file first if present
    ///
    /// A missing owner is replaced by a freshly generated identity.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let owner = match lookup(OWNER_ENV) {
            Some(raw) => Identity::parse(&raw)?,
            None => {
                let generated = Identity::generate();
                tracing::warn!(owner = %generated, "{} not set, generated an owner identity", OWNER_ENV);
                generated
            }
        };

        let name = lookup(NAME_ENV)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(default_name);

        Ok(Self { name, owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedwallet_types::WalletError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = WalletConfig::from_lookup(lookup_from(&[
            (OWNER_ENV, "0x00112233445566778899aabbccddeeff00112233"),
            (NAME_ENV, "family"),
        ]))
        .unwrap();

        assert_eq!(config.name, "family");
        assert_eq!(
            config.owner.to_hex(),
            "0x00112233445566778899aabbccddeeff00112233"
        );
    }

    #[test]
    fn test_missing_owner_is_generated() {
        let config = WalletConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.name, "shared-wallet");
    }

    #[test]
    fn test_invalid_owner_rejected() {
        let result = WalletConfig::from_lookup(lookup_from(&[(OWNER_ENV, "not-an-address")]));
        assert!(matches!(result, Err(WalletError::InvalidIdentity { .. })));
    }
}
