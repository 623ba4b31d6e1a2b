pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, AzureStoreConfig, GeneralConfig, LocalStoreConfig, RestSpeechConfig, SpeechConfig,
    StorageConfig,
};
pub use error::{ConfigError, PipelineError, SpeechError, StorageError};
pub use types::{CancelReason, SpeechEvent, UploadEvent};
