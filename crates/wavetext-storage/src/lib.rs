pub mod azure_store;
pub mod local_store;
pub mod registry;
pub mod store_trait;

pub use azure_store::AzureStore;
pub use local_store::LocalStore;
pub use registry::StoreRegistry;
pub use store_trait::BlobStore;
