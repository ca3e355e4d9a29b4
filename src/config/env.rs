//! Environment overrides
//!
//! Applied on top of the file (or default) configuration, highest priority first:
//!
//! ```bash
//! export VOULENCE_STATE_DIR="$HOME/.local/state/voulence"
//! export VOULENCE_NETWORK="testnet"
//! export VOULENCE_FAILURE_RATE="0"
//! export VOULENCE_LATENCY_MS="200"
//! ```

use super::{Config, Network};
use crate::{Error, Result};

/// Environment variable names
mod env_vars {
    pub const STATE_DIR: &str = "VOULENCE_STATE_DIR";
    pub const NETWORK: &str = "VOULENCE_NETWORK";
    pub const FAILURE_RATE: &str = "VOULENCE_FAILURE_RATE";
    pub const LATENCY_MS: &str = "VOULENCE_LATENCY_MS";
}

/// Overrides collected from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub state_dir: Option<String>,
    pub network: Option<String>,
    pub failure_rate: Option<String>,
    pub latency_ms: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            state_dir: lookup(env_vars::STATE_DIR),
            network: lookup(env_vars::NETWORK),
            failure_rate: lookup(env_vars::FAILURE_RATE),
            latency_ms: lookup(env_vars::LATENCY_MS),
        }
    }

    /// Apply the collected overrides to a config
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(ref dir) = self.state_dir {
            tracing::debug!(state_dir = %dir, "Using {} for session storage", env_vars::STATE_DIR);
            config.storage.state_dir = Some(dir.clone());
        }

        if let Some(ref network) = self.network {
            config.network = Network::parse(network).ok_or_else(|| {
                Error::Config(format!("{}: unknown network {}", env_vars::NETWORK, network))
            })?;
        }

        if let Some(ref rate) = self.failure_rate {
            config.simulator.failure_rate = rate.parse::<f64>().map_err(|e| {
                Error::Config(format!("{}: {}", env_vars::FAILURE_RATE, e))
            })?;
        }

        if let Some(ref latency) = self.latency_ms {
            config.simulator.latency_ms = latency
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{}: {}", env_vars::LATENCY_MS, e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> EnvOverrides {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_changes_nothing() {
        let mut config = Config::default();
        overrides(&[]).apply(&mut config).unwrap();
        assert_eq!(config.storage.state_dir.as_deref(), Some(".voulence"));
        assert_eq!(config.simulator.latency_ms, 1_500);
    }

    #[test]
    fn test_applies_all_overrides() {
        let mut config = Config::default();
        overrides(&[
            ("VOULENCE_STATE_DIR", "/tmp/voulence"),
            ("VOULENCE_NETWORK", "testnet"),
            ("VOULENCE_FAILURE_RATE", "0.5"),
            ("VOULENCE_LATENCY_MS", "20"),
        ])
        .apply(&mut config)
        .unwrap();

        assert_eq!(config.storage.state_dir.as_deref(), Some("/tmp/voulence"));
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.simulator.failure_rate, 0.5);
        assert_eq!(config.simulator.latency_ms, 20);
    }

    #[test]
    fn test_unparseable_values_are_config_errors() {
        let mut config = Config::default();
        let err = overrides(&[("VOULENCE_LATENCY_MS", "soon")])
            .apply(&mut config)
            .unwrap_err();
        assert!(err.to_string().contains("VOULENCE_LATENCY_MS"));

        let err = overrides(&[("VOULENCE_NETWORK", "moon")])
            .apply(&mut config)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
