use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("missing config section: [{0}]")]
    MissingSection(String),

    #[error("invalid endpoint in {field}: {message}")]
    InvalidEndpoint { field: String, message: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend not found: {0}")]
    BackendNotFound(String),

    #[error("storage initialization failed: {0}")]
    InitializationFailed(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("blob transfer failed: {0}")]
    Transfer(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech engine not found: {0}")]
    EngineNotFound(String),

    #[error("speech engine initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to open transcript output: {0}")]
    TranscriptOpen(String),

    #[error("recognition session failed: {0}")]
    SessionFailed(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to download blob '{blob}': {source}")]
    Download { blob: String, source: StorageError },

    #[error("failed to upload blob '{blob}': {source}")]
    Upload { blob: String, source: StorageError },

    #[error("scratch file I/O failed: {0}")]
    Scratch(#[from] std::io::Error),
}
