//! Voulence wallet session
//!
//! Client-side wallet connection store for the Voulence escrow marketplace:
//! - Connect to an account provider and cache the returned account
//! - Surface connection failures as displayable messages
//! - Persist the connected identity across restarts
//!
//! # Concurrency Model
//!
//! - Each connect attempt is tagged with a generation
//! - Only the latest attempt may commit, and disconnect invalidates in-flight attempts
//! - Storage writes and subscriber notifications happen in commit order

pub mod audit;
pub mod config;
pub mod format;
pub mod persist;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, Network};
pub use error::{Error, Result};
pub use persist::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
pub use wallet::{
    AccountProvider, AccountSnapshot, ConnectOutcome, SessionState, SimulatedProvider, WalletKind,
    WalletSession,
};
