//! Wallet connection session
//!
//! Holds the connected account, the in-flight/error status of the last
//! attempt, and mirrors the persisted subset into a [`SessionStore`] after
//! every change.
//!
//! Every `connect()` takes a new attempt generation and `disconnect()` bumps
//! it too. An attempt only commits its result if its generation is still
//! current, so a late provider response can never resurrect a session the
//! user already closed or overwrite a newer attempt.

use super::provider::{AccountProvider, AccountSnapshot};
use crate::audit::{AuditEntry, SessionAuditLog, SessionEvent};
use crate::persist::{PersistedSession, SessionStore};
use crate::Error;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};

/// Observable session state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionState {
    /// True iff a session is active
    pub is_connected: bool,
    /// Account identifier once connected
    pub address: Option<String>,
    /// Balance snapshot taken at connect time
    pub balance: f64,
    /// True while a connect attempt is outstanding
    pub is_connecting: bool,
    /// Last connection failure message
    pub error: Option<String>,
}

impl SessionState {
    fn connected(account: AccountSnapshot) -> Self {
        Self {
            is_connected: true,
            address: Some(account.address),
            balance: account.balance,
            is_connecting: false,
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    /// The subset written to durable storage
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            is_connected: self.is_connected,
            address: self.address.clone(),
            balance: self.balance,
        }
    }

    /// Rebuild state from storage; transient fields start at their defaults
    pub fn from_persisted(persisted: PersistedSession) -> Self {
        Self {
            is_connected: persisted.is_connected,
            address: persisted.address,
            balance: persisted.balance,
            is_connecting: false,
            error: None,
        }
    }

    /// Whether the state invariants hold
    pub fn is_consistent(&self) -> bool {
        (!self.is_connected || self.address.is_some()) && !(self.is_connecting && self.is_connected)
    }
}

/// How a `connect()` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Connected(AccountSnapshot),
    Failed(String),
    /// A later `connect()` or `disconnect()` invalidated this attempt
    Superseded,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected(_))
    }
}

struct Inner {
    state: SessionState,
    generation: u64,
}

/// Shared handle to the wallet session. Clones observe the same session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<RwLock<Inner>>,
    updates: Arc<watch::Sender<SessionState>>,
    provider: Arc<dyn AccountProvider>,
    store: Option<Arc<dyn SessionStore>>,
    audit: Option<SessionAuditLog>,
}

impl WalletSession {
    /// Create a disconnected session that is not persisted anywhere
    pub fn new(provider: Arc<dyn AccountProvider>) -> Self {
        Self::from_parts(provider, None, SessionState::default())
    }

    /// Create a session rehydrated from `store`.
    ///
    /// Unreadable or inconsistent stored data falls back to the disconnected
    /// defaults; the next change overwrites it.
    pub async fn load_or_create(
        provider: Arc<dyn AccountProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let state = match store.load().await {
            Ok(Some(persisted)) if persisted.is_valid() => {
                tracing::debug!(
                    namespace = store.namespace(),
                    is_connected = persisted.is_connected,
                    "Rehydrated wallet session"
                );
                SessionState::from_persisted(persisted)
            }
            Ok(Some(persisted)) => {
                tracing::warn!(
                    namespace = store.namespace(),
                    ?persisted,
                    "Discarding inconsistent stored session"
                );
                SessionState::default()
            }
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!(
                    namespace = store.namespace(),
                    error = %e,
                    "Failed to load stored session, starting disconnected"
                );
                SessionState::default()
            }
        };

        Self::from_parts(provider, Some(store), state)
    }

    fn from_parts(
        provider: Arc<dyn AccountProvider>,
        store: Option<Arc<dyn SessionStore>>,
        state: SessionState,
    ) -> Self {
        let (updates, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state,
                generation: 0,
            })),
            updates: Arc::new(updates),
            provider,
            store,
            audit: None,
        }
    }

    /// Record session events to an audit log
    pub fn with_audit_log(mut self, audit: SessionAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.state.clone()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Attempt to open a session with the provider.
    ///
    /// Never fails: the outcome is reflected in the session state and also
    /// returned for convenience.
    pub async fn connect(&self) -> ConnectOutcome {
        let started = Instant::now();

        let (generation, guard) = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            let previous = std::mem::replace(
                &mut inner.state,
                SessionState {
                    is_connecting: true,
                    ..SessionState::default()
                },
            );
            let guard = AttemptGuard::new(self.clone(), inner.generation, previous);
            self.publish(&inner.state).await;
            (inner.generation, guard)
        };

        tracing::info!(provider = self.provider.name(), generation, "Connecting wallet");
        self.audit(AuditEntry {
            provider: Some(self.provider.name().to_string()),
            status: "pending",
            ..AuditEntry::new(SessionEvent::ConnectStart, generation)
        })
        .await;

        let result = self
            .provider
            .attempt_connection()
            .await
            .and_then(validate_account);
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut inner = self.inner.write().await;
        guard.disarm();
        if inner.generation != generation {
            let current = inner.generation;
            drop(inner);
            tracing::debug!(generation, current, "Discarding stale connection attempt");
            self.audit(AuditEntry {
                provider: Some(self.provider.name().to_string()),
                duration_ms,
                status: "discarded",
                ..AuditEntry::new(SessionEvent::ConnectSuperseded, generation)
            })
            .await;
            return ConnectOutcome::Superseded;
        }

        let (outcome, entry) = match result {
            Ok(account) => {
                tracing::info!(
                    address = %account.address,
                    balance = account.balance,
                    "Wallet connected"
                );
                inner.state = SessionState::connected(account.clone());
                let entry = AuditEntry {
                    address: Some(account.address.clone()),
                    ..AuditEntry::new(SessionEvent::ConnectComplete, generation)
                };
                (ConnectOutcome::Connected(account), entry)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Wallet connection failed");
                inner.state = SessionState::failed(message.clone());
                let entry = AuditEntry {
                    error: Some(message.clone()),
                    status: "error",
                    ..AuditEntry::new(SessionEvent::ConnectComplete, generation)
                };
                (ConnectOutcome::Failed(message), entry)
            }
        };
        self.publish(&inner.state).await;
        drop(inner);

        self.audit(AuditEntry {
            provider: Some(self.provider.name().to_string()),
            duration_ms,
            ..entry
        })
        .await;

        outcome
    }

    /// Reset to the disconnected defaults and invalidate any in-flight attempt
    pub async fn disconnect(&self) {
        let generation = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            inner.state = SessionState::default();
            self.publish(&inner.state).await;
            inner.generation
        };

        tracing::info!(generation, "Wallet disconnected");
        self.audit(AuditEntry::new(SessionEvent::Disconnect, generation))
            .await;
    }

    /// Report an error that did not come from a connect attempt
    pub async fn set_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.state.error = Some(message.into());
        self.publish(&inner.state).await;
    }

    /// Dismiss the current error, leaving the connection untouched
    pub async fn clear_error(&self) {
        let mut inner = self.inner.write().await;
        inner.state.error = None;
        self.publish(&inner.state).await;
    }

    /// Persist and broadcast `state`. Called with the write lock held so
    /// storage and subscribers see changes in commit order.
    async fn publish(&self, state: &SessionState) {
        self.persist(state).await;
        self.updates.send_replace(state.clone());
    }

    async fn persist(&self, state: &SessionState) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save(&state.persisted()).await {
                tracing::warn!(
                    namespace = store.namespace(),
                    error = %e,
                    "Failed to persist wallet session"
                );
            }
        }
    }

    /// Put back `restored` if attempt `generation` is still the current one
    async fn abandon_attempt(&self, generation: u64, restored: SessionState) {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return;
        }
        inner.state = restored;
        self.publish(&inner.state).await;
    }

    /// Write the current state to the store without broadcasting it
    async fn persist_current(&self) {
        let inner = self.inner.write().await;
        self.persist(&inner.state).await;
    }

    async fn audit(&self, entry: AuditEntry) {
        if let Some(ref audit) = self.audit {
            audit.record(entry).await;
        }
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("provider", &self.provider.name())
            .field("persisted", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Undoes the connecting state of an attempt whose `connect()` future was
/// dropped before the provider answered. The session that was active before
/// the attempt comes back with `is_connecting` cleared.
struct AttemptGuard {
    session: Option<WalletSession>,
    generation: u64,
    restored: SessionState,
}

impl AttemptGuard {
    fn new(session: WalletSession, generation: u64, previous: SessionState) -> Self {
        Self {
            session: Some(session),
            generation,
            restored: SessionState::from_persisted(previous.persisted()),
        }
    }

    fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let generation = self.generation;
        let restored = std::mem::take(&mut self.restored);
        tracing::debug!(generation, "Connection attempt dropped before completion");

        // Fast path: with the lock free, subscribers see the reset immediately
        // and only the store write is deferred.
        let reset = match session.inner.try_write() {
            Ok(mut inner) => {
                if inner.generation != generation {
                    return;
                }
                inner.state = restored.clone();
                session.updates.send_replace(restored.clone());
                true
            }
            Err(_) => false,
        };
        if reset && session.store.is_none() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                generation,
                "No runtime to finish resetting abandoned connection attempt"
            );
            return;
        };
        if reset {
            handle.spawn(async move { session.persist_current().await });
        } else {
            handle.spawn(async move { session.abandon_attempt(generation, restored).await });
        }
    }
}

/// Reject provider answers that would break the session invariants
fn validate_account(account: AccountSnapshot) -> crate::Result<AccountSnapshot> {
    if account.address.is_empty() {
        return Err(Error::ConnectionFailure(
            "Wallet returned an empty address".to_string(),
        ));
    }
    if !account.balance.is_finite() || account.balance < 0.0 {
        return Err(Error::ConnectionFailure(format!(
            "Wallet returned an invalid balance: {}",
            account.balance
        )));
    }
    Ok(account)
}
