use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use wavetext_core::{SpeechError, SpeechEvent};

/// A speech recognition engine that transcribes one audio file per session.
///
/// Engines are created via [`EngineRegistry`](crate::EngineRegistry),
/// receive an event channel through [`set_event_sender`](Self::set_event_sender)
/// and report a session's progress as [`SpeechEvent`]s in recognition order.
/// [`transcribe`](Self::transcribe) drives the full session and queues a
/// terminal event (`Canceled` or `SessionStopped`) before it returns.
/// Session-level failures (unreachable service, unreadable audio) surface
/// as `Canceled` events carrying the error code and details, not as `Err`.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Returns the engine name (e.g. `"rest"`, `"null"`).
    fn name(&self) -> &str;
    /// One-time initialisation with engine-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), SpeechError>;
    /// Install the channel the session reports events on.
    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SpeechEvent>);
    /// Run one full recognition session over the audio file at `audio`.
    async fn transcribe(&self, audio: &Path) -> Result<(), SpeechError>;
    /// Release engine resources and close the event channel.
    async fn shutdown(&self) -> Result<(), SpeechError>;
}
