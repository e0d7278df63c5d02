//! tabsaver library crate.
//!
//! Keeps named snapshots of browser windows and reconciles them with the
//! live windows a host reports:
//! - Persistent store of saved windows (JSON file or in-memory)
//! - State index of open and closed saved windows
//! - Reconciliation engine and the event dispatcher feeding it
//! - Read model for listing saved windows

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod host;
pub mod index;
pub mod listing;
pub mod store;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use dispatch::{Dispatcher, Input};
pub use engine::{DeletedWindow, Engine};
pub use error::{Error, HostError, Result, StoreError};
pub use host::{BadgeState, Host, HostEvent, Notifier};
pub use index::StateIndex;
