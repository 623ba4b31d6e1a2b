use crate::store_trait::BlobStore;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;
use wavetext_core::StorageError;

/// Remote blob store speaking the SAS-style HTTP protocol:
/// `GET`/`PUT {endpoint}/{container}/{name}?{sas_token}`.
pub struct AzureStore {
    remote: Mutex<Option<Remote>>,
}

#[derive(Clone)]
struct Remote {
    endpoint: String,
    sas_token: String,
    client: reqwest::Client,
}

fn blob_url(endpoint: &str, sas_token: &str, container: &str, name: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if sas_token.is_empty() {
        format!("{base}/{container}/{name}")
    } else {
        format!("{base}/{container}/{name}?{sas_token}")
    }
}

impl AzureStore {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(None),
        }
    }

    fn remote(&self) -> Result<Remote, StorageError> {
        self.remote
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StorageError::InitializationFailed("not initialized".to_string()))
    }
}

impl Default for AzureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for AzureStore {
    fn name(&self) -> &str {
        "azure"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), StorageError> {
        let endpoint = config
            .get("endpoint")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                StorageError::InitializationFailed("missing 'endpoint' in config".to_string())
            })?;
        Url::parse(endpoint).map_err(|e| {
            StorageError::InitializationFailed(format!("malformed endpoint '{endpoint}': {e}"))
        })?;

        let sas_token = config
            .get("sas_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                StorageError::InitializationFailed("missing 'sas_token' in config".to_string())
            })?;

        let timeout_secs = config
            .get("timeout_secs")
            .and_then(|v| v.as_integer())
            .unwrap_or(60) as u64;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                StorageError::InitializationFailed(format!("failed to build HTTP client: {e}"))
            })?;

        *self.remote.lock().unwrap() = Some(Remote {
            endpoint: endpoint.to_string(),
            sas_token: sas_token.to_string(),
            client,
        });
        Ok(())
    }

    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let remote = self.remote()?;
        let url = blob_url(&remote.endpoint, &remote.sas_token, container, name);

        let response = remote
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(format!("{container}/{name}")));
        }
        if !status.is_success() {
            return Err(StorageError::Transfer(format!(
                "unexpected status {status} downloading {container}/{name}"
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;
        tracing::debug!(container, name, bytes = data.len(), "downloaded blob");
        Ok(data.to_vec())
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let remote = self.remote()?;
        let url = blob_url(&remote.endpoint, &remote.sas_token, container, name);

        let response = remote
            .client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Transfer(format!(
                "unexpected status {status} uploading {container}/{name}"
            )));
        }
        tracing::debug!(container, name, bytes = data.len(), "uploaded blob");
        Ok(())
    }
}
