// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use graft_core::config::{ConfigError, ConfigStore, HOOK_CONFIG_KEY};
use graft_core::HookConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share storage, so a test can keep a handle for inspection after
/// moving another into a [`graft_core::ConfigService`].
///
/// # Example
///
/// ```
/// use graft_dry_tests::InMemoryConfigStore;
/// use graft_core::{ConfigService, HookConfig};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// assert_eq!(service.hook_config().unwrap(), HookConfig::default());
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `config` under [`HOOK_CONFIG_KEY`].
    pub fn with_hook_config(config: &HookConfig) -> Result<Self, ConfigError> {
        let store = Self::new();
        store.save_raw(HOOK_CONFIG_KEY, &serde_json::to_vec(config)?)?;
        Ok(store)
    }

    /// Store `raw` bytes verbatim under `key` (e.g. a corrupt document).
    pub fn put_raw(&self, key: &str, raw: &[u8]) {
        self.lock().data.insert(key.to_owned(), raw.to_vec());
    }

    /// Make every subsequent load fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.lock().data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
