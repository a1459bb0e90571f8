//! Key-value stores backing the result cache.

use crate::errors::IcpError;
use async_trait::async_trait;
use moka::future::Cache;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Durable key-value storage.
///
/// Each call resolves only once the underlying read or write has completed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, IcpError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), IcpError>;
}

/// Single JSON object on disk, one property per key.
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, IcpError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(IcpError::StorageError(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<(), IcpError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, IcpError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), IcpError> {
        let _guard = self.lock.lock().await;
        let mut entries = match self.read_all().await {
            Ok(entries) => entries,
            // an unparseable file would otherwise block every later write
            Err(e @ (IcpError::JsonError(_) | IcpError::StorageError(_))) => {
                warn!("Replacing unreadable cache file {}: {}", self.path.display(), e);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await?;
        debug!("Stored {} in {}", key, self.path.display());
        Ok(())
    }
}

/// In-process store; contents are lost when the process exits.
pub struct MemoryStore {
    cache: Cache<String, Value>,
}

impl MemoryStore {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).build();
        Self { cache }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, IcpError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), IcpError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }
}
