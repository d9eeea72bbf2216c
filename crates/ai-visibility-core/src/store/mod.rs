//! Key-value storage abstraction for AI Visibility.
//!
//! The [`KvStore`] trait is the persistence seam of the history log: one
//! text value per key, replaced wholesale on every write. Backends include
//! the in-memory store in this crate and the SQLite store in the
//! application crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Abstract text key-value store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Read the value stored under a key |
/// | [`set`](KvStore::set) | Insert or replace the value under a key |
/// | [`remove`](KvStore::remove) | Delete a key (no-op when absent) |
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
}
