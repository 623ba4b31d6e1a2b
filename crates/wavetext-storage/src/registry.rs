use crate::store_trait::BlobStore;
use std::collections::HashMap;
use wavetext_core::StorageError;

pub struct StoreRegistry {
    factories: HashMap<String, fn() -> Box<dyn BlobStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("local", || Box::new(crate::local_store::LocalStore::new()));
        registry.register("azure", || Box::new(crate::azure_store::AzureStore::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn BlobStore>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn BlobStore>, StorageError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| StorageError::BackendNotFound(name.to_string()))
    }

    pub fn list_backends(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
