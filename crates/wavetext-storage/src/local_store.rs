use crate::store_trait::BlobStore;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use wavetext_core::StorageError;

/// Directory-backed store: containers are subdirectories of a configured
/// root, blobs are plain files. Also the store the `watch` trigger observes.
pub struct LocalStore {
    root: Mutex<Option<PathBuf>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(None),
        }
    }

    fn root(&self) -> Result<PathBuf, StorageError> {
        self.root
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StorageError::InitializationFailed("not initialized".to_string()))
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), StorageError> {
        let root = config
            .get("root")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                StorageError::InitializationFailed("missing 'root' in config".to_string())
            })?;
        *self.root.lock().unwrap() = Some(PathBuf::from(root));
        Ok(())
    }

    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.root()?.join(container).join(name);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(container, name, bytes = data.len(), "read blob");
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{container}/{name}")))
            }
            Err(e) => Err(StorageError::Transfer(e.to_string())),
        }
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let dir = self.root()?.join(container);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;
        tokio::fs::write(dir.join(name), data)
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;
        tracing::debug!(container, name, bytes = data.len(), "wrote blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_config(root: &std::path::Path) -> toml::Value {
        toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert(
                "root".to_string(),
                toml::Value::String(root.to_string_lossy().to_string()),
            );
            t
        })
    }

    #[test]
    fn test_local_store_name() {
        let store = LocalStore::new();
        assert_eq!(store.name(), "local");
    }

    #[tokio::test]
    async fn test_local_store_initialize_missing_root_fails() {
        let mut store = LocalStore::new();
        let result = store.initialize(toml::Value::Table(Default::default())).await;
        match result {
            Err(StorageError::InitializationFailed(msg)) => assert!(msg.contains("root")),
            _ => panic!("expected InitializationFailed"),
        }
    }

    #[tokio::test]
    async fn test_local_store_get_before_initialize_fails() {
        let store = LocalStore::new();
        let result = store.get("audio", "a.wav").await;
        match result {
            Err(StorageError::InitializationFailed(_)) => {}
            _ => panic!("expected InitializationFailed"),
        }
    }

    #[tokio::test]
    async fn test_local_store_put_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new();
        store.initialize(root_config(dir.path())).await.unwrap();

        store.put("audio", "a.wav", b"RIFFdata").await.unwrap();
        let data = store.get("audio", "a.wav").await.unwrap();
        assert_eq!(data, b"RIFFdata");
    }

    #[tokio::test]
    async fn test_local_store_get_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new();
        store.initialize(root_config(dir.path())).await.unwrap();

        match store.get("audio", "missing.wav").await {
            Err(StorageError::NotFound(name)) => assert_eq!(name, "audio/missing.wav"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_store_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new();
        store.initialize(root_config(dir.path())).await.unwrap();

        store.put("text", "a.txt", b"first").await.unwrap();
        store.put("text", "a.txt", b"second").await.unwrap();
        assert_eq!(store.get("text", "a.txt").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_local_store_containers_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new();
        store.initialize(root_config(dir.path())).await.unwrap();

        store.put("audio", "same.bin", b"in audio").await.unwrap();
        match store.get("text", "same.bin").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_local_store_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LocalStore>();
    }
}
