//! In-memory [`KvStore`] implementation for testing and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. An optional value-size
//! quota makes `set` fail the way a full browser store does, which lets
//! tests exercise best-effort persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use super::KvStore;

pub struct InMemoryKv {
    values: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            quota_bytes: None,
        }
    }

    /// A store whose `set` fails for values longer than `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Synchronous read, for assertions.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| anyhow!("kv lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                bail!(
                    "quota exceeded: value of {} bytes exceeds {} bytes",
                    value.len(),
                    quota
                );
            }
        }
        let mut values = self.values.write().map_err(|_| anyhow!("kv lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("kv lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}
