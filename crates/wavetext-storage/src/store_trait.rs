use async_trait::async_trait;
use wavetext_core::StorageError;

/// A flat namespace of named byte blobs grouped into containers.
///
/// Implementations are created via [`StoreRegistry`](crate::StoreRegistry)
/// and configured once through [`initialize`](Self::initialize). Only the
/// two operations the pipeline needs are exposed: get-by-name and
/// put-by-name with overwrite.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the backend name (e.g. `"local"`, `"azure"`).
    fn name(&self) -> &str;
    /// One-time initialisation with backend-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), StorageError>;
    /// Fetch the full contents of `container/name`.
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError>;
    /// Store `data` as `container/name`, replacing any existing blob.
    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StorageError>;
}
