//! Durable storage for the persisted session subset
//!
//! Only `is_connected`, `address` and `balance` are ever written. The document
//! is wrapped in a versioned envelope:
//!
//! ```json
//! {"state": {"isConnected": true, "address": "G...", "balance": 15420.5}, "version": 0}
//! ```

mod file;

pub use file::FileSessionStore;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Envelope version written by this crate
pub const STORAGE_VERSION: u32 = 0;

/// The part of the session that survives restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub is_connected: bool,
    pub address: Option<String>,
    pub balance: f64,
}

impl PersistedSession {
    /// Whether the stored values can be trusted on rehydration
    pub fn is_valid(&self) -> bool {
        let address_ok = !self.is_connected
            || self
                .address
                .as_deref()
                .is_some_and(|a| !a.is_empty());
        address_ok && self.balance.is_finite() && self.balance >= 0.0
    }
}

/// On-disk document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    pub state: PersistedSession,
    #[serde(default)]
    pub version: u32,
}

impl StoredDocument {
    pub fn new(state: PersistedSession) -> Self {
        Self {
            state,
            version: STORAGE_VERSION,
        }
    }
}

/// Key-value storage for one session namespace
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Namespace the session is stored under
    fn namespace(&self) -> &str;

    /// Read the stored session, `None` if nothing was stored yet
    async fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replace the stored session
    async fn save(&self, session: &PersistedSession) -> Result<()>;
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    namespace: String,
    slot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            slot: Mutex::new(None),
        }
    }

    /// Pre-populate the store, as if a previous run had saved this session
    pub fn with_session(namespace: impl Into<String>, session: PersistedSession) -> Self {
        Self {
            namespace: namespace.into(),
            slot: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.slot.lock().await = Some(session.clone());
        Ok(())
    }
}
