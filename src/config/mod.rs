//! Configuration for the wallet session

pub mod env;

use serde::{Deserialize, Serialize};

pub use env::EnvOverrides;

/// Storage namespace the session is persisted under
pub const DEFAULT_NAMESPACE: &str = "voulence-wallet";

/// Stellar networks the explorer links can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Public,
    Testnet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Public => "public",
            Network::Testnet => "testnet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "public" | "mainnet" | "pubnet" => Some(Network::Public),
            "testnet" => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// Where the persisted session subset lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the session document is stored under
    pub namespace: String,
    /// Directory holding `<namespace>.json`. `None` keeps the session in memory only.
    pub state_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            state_dir: Some(".voulence".to_string()),
        }
    }
}

/// Settings for the simulated account provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Artificial latency before the attempt resolves (milliseconds)
    pub latency_ms: u64,
    /// Probability in [0, 1] that an attempt fails
    pub failure_rate: f64,
    /// Account returned on success
    pub address: String,
    /// Balance returned on success
    pub balance: f64,
    /// Message carried by a failed attempt
    pub failure_message: String,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1_500,
            failure_rate: 0.1,
            address: "GDQP2KP7XFNZA5FAFXVK7MNT6GX7YZQKP8WMRPQB3NSLV2DPYHC4TQWM".to_string(),
            balance: 15_420.50,
            failure_message: "Failed to connect wallet. Please try again.".to_string(),
            seed: None,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Network used for explorer links
    #[serde(default)]
    pub network: Network,
    /// Session persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Simulated provider settings
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Path to the session audit log (JSONL)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

impl Config {
    /// Check values that serde cannot constrain
    pub fn validate(&self) -> crate::Result<()> {
        let rate = self.simulator.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(crate::Error::Config(format!(
                "failure_rate must be within [0, 1], got {}",
                rate
            )));
        }
        if !self.simulator.balance.is_finite() || self.simulator.balance < 0.0 {
            return Err(crate::Error::Config(format!(
                "balance must be a non-negative number, got {}",
                self.simulator.balance
            )));
        }
        if self.storage.namespace.is_empty()
            || self
                .storage
                .namespace
                .contains(|c: char| c == '/' || c == '\\')
        {
            return Err(crate::Error::Config(format!(
                "invalid storage namespace: {:?}",
                self.storage.namespace
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_simulated_wallet() {
        let config = Config::default();
        assert_eq!(config.network, Network::Public);
        assert_eq!(config.storage.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.simulator.latency_ms, 1_500);
        assert_eq!(config.simulator.failure_rate, 0.1);
        assert_eq!(config.simulator.balance, 15_420.50);
        assert!(config.audit_log_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let value = serde_json::json!({
            "network": "testnet",
            "simulator": {
                "latency_ms": 0,
                "failure_rate": 1.0,
                "address": "GABC",
                "balance": 5.0,
                "failure_message": "nope"
            }
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.network, Network::Testnet);
        assert_eq!(parsed.storage.namespace, DEFAULT_NAMESPACE);
        assert_eq!(parsed.simulator.failure_message, "nope");
        assert!(parsed.simulator.seed.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_failure_rate() {
        let mut config = Config::default();
        config.simulator.failure_rate = 1.5;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_rejects_path_like_namespace() {
        let mut config = Config::default();
        config.storage.namespace = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parses_network_aliases() {
        assert_eq!(Network::parse("MAINNET"), Some(Network::Public));
        assert_eq!(Network::parse("testnet"), Some(Network::Testnet));
        assert_eq!(Network::parse("futurenet"), None);
    }
}
