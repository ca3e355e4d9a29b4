//! Wallet connection management
//!
//! The session owns the connection state; providers only answer
//! "who is the account and what is its balance".

mod provider;
mod session;

pub use provider::{AccountProvider, AccountSnapshot, SimulatedProvider, WalletKind};
pub use session::{ConnectOutcome, SessionState, WalletSession};
