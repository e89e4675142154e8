//! Storage backends for vault persistence
//!
//! This module provides three backends behind [`KeyValueStore`]:
//! 1. JSON file in the user's data directory
//! 2. OS Keychain (hardware-backed where available)
//! 3. In-memory (tests, ephemeral sessions)
//!
//! [`VaultStorage`] layers the wallet's namespaced keys on top.

mod file;
mod keychain;
mod memory;
mod traits;
mod vault_storage;

pub use file::{default_data_dir, FileStore};
pub use keychain::KeychainStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
pub use vault_storage::{VaultStorage, DEFAULT_NAMESPACE};
