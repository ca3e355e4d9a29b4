//! Account providers
//!
//! A provider is whatever authorizes a connection and reports the account:
//! a browser extension, a mobile wallet bridge, an SDK. The session only
//! sees the [`AccountProvider`] trait, so the simulated provider below can
//! be swapped for a real integration without touching session logic.

use crate::config::SimulatorConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

/// Account facts returned by a successful connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: String,
    pub balance: f64,
}

/// Capability to open a wallet session
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Human-readable provider name, used in logs
    fn name(&self) -> &str;

    /// Make one connection attempt.
    ///
    /// Failures should be reported as [`Error::ConnectionFailure`] carrying a
    /// message fit for display.
    async fn attempt_connection(&self) -> Result<AccountSnapshot>;
}

/// Stellar wallets offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    #[default]
    Freighter,
    Lobstr,
    Albedo,
    XBull,
}

impl WalletKind {
    pub const ALL: [WalletKind; 4] = [
        WalletKind::Freighter,
        WalletKind::Lobstr,
        WalletKind::Albedo,
        WalletKind::XBull,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            WalletKind::Freighter => "freighter",
            WalletKind::Lobstr => "lobstr",
            WalletKind::Albedo => "albedo",
            WalletKind::XBull => "xbull",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::Freighter => "Freighter",
            WalletKind::Lobstr => "LOBSTR",
            WalletKind::Albedo => "Albedo",
            WalletKind::XBull => "xBull Wallet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WalletKind::Freighter => "Browser extension for Stellar",
            WalletKind::Lobstr => "Mobile wallet for Stellar",
            WalletKind::Albedo => "Web-based Stellar wallet",
            WalletKind::XBull => "Advanced Stellar wallet",
        }
    }

    pub fn is_recommended(&self) -> bool {
        matches!(self, WalletKind::Freighter)
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WalletKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.to_lowercase();
        WalletKind::ALL
            .into_iter()
            .find(|kind| kind.id() == needle)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown wallet: {}", s)))
    }
}

/// Stand-in provider: waits a fixed latency, then succeeds with a fixed
/// account or fails with probability `failure_rate`.
pub struct SimulatedProvider {
    wallet: WalletKind,
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedProvider {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            wallet: WalletKind::default(),
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Label attempts with the wallet the user picked
    pub fn with_wallet(mut self, wallet: WalletKind) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn wallet(&self) -> WalletKind {
        self.wallet
    }
}

#[async_trait]
impl AccountProvider for SimulatedProvider {
    fn name(&self) -> &str {
        self.wallet.id()
    }

    async fn attempt_connection(&self) -> Result<AccountSnapshot> {
        tracing::debug!(
            wallet = %self.wallet,
            latency_ms = self.config.latency_ms,
            "Simulating wallet connection"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let failure_rate = if self.config.failure_rate.is_nan() {
            0.0
        } else {
            self.config.failure_rate.clamp(0.0, 1.0)
        };
        let failed = self.rng.lock().await.gen_bool(failure_rate);
        if failed {
            return Err(Error::ConnectionFailure(self.config.failure_message.clone()));
        }

        Ok(AccountSnapshot {
            address: self.config.address.clone(),
            balance: self.config.balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(failure_rate: f64) -> SimulatorConfig {
        SimulatorConfig {
            latency_ms: 0,
            failure_rate,
            seed: Some(7),
            ..SimulatorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_always_succeeds_at_zero_failure_rate() {
        let provider = SimulatedProvider::new(instant(0.0));
        for _ in 0..10 {
            let account = provider.attempt_connection().await.unwrap();
            assert_eq!(
                account.address,
                "GDQP2KP7XFNZA5FAFXVK7MNT6GX7YZQKP8WMRPQB3NSLV2DPYHC4TQWM"
            );
            assert_eq!(account.balance, 15_420.50);
        }
    }

    #[tokio::test]
    async fn test_always_fails_at_full_failure_rate() {
        let provider = SimulatedProvider::new(instant(1.0));
        let err = provider.attempt_connection().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailure(_)));
        assert_eq!(err.to_string(), "Failed to connect wallet. Please try again.");
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let outcomes = |provider: SimulatedProvider| async move {
            let mut results = Vec::new();
            for _ in 0..20 {
                results.push(provider.attempt_connection().await.is_ok());
            }
            results
        };

        let a = outcomes(SimulatedProvider::new(instant(0.5))).await;
        let b = outcomes(SimulatedProvider::new(instant(0.5))).await;
        assert_eq!(a, b);
    }

    #[test]
    fn test_wallet_catalogue() {
        assert_eq!("Freighter".parse::<WalletKind>().unwrap(), WalletKind::Freighter);
        assert_eq!("xbull".parse::<WalletKind>().unwrap(), WalletKind::XBull);
        assert!("metamask".parse::<WalletKind>().is_err());

        let recommended: Vec<_> = WalletKind::ALL
            .iter()
            .filter(|kind| kind.is_recommended())
            .collect();
        assert_eq!(recommended, vec![&WalletKind::Freighter]);
        assert_eq!(WalletKind::default(), WalletKind::Freighter);
    }

    #[test]
    fn test_provider_is_named_after_wallet() {
        let provider = SimulatedProvider::new(instant(0.0)).with_wallet(WalletKind::Albedo);
        assert_eq!(provider.name(), "albedo");
        assert_eq!(provider.wallet(), WalletKind::Albedo);
    }
}
