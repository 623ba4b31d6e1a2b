use crate::engine_trait::SpeechEngine;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use wavetext_core::{CancelReason, SpeechError, SpeechEvent};

/// Diagnostic engine that recognizes nothing.
///
/// With no configuration it reports one segment describing the audio size.
/// A session can be scripted instead: `utterances` lists the segments to
/// report (an empty utterance is reported as a no-match), and `finish`
/// selects the terminal event: `"stop"` (default), `"cancel"` (end of
/// stream) or `"error"` (canceled with `cancel_code`/`cancel_details`).
pub struct NullEngine {
    utterances: Option<Vec<String>>,
    finish: SessionFinish,
    session_count: AtomicUsize,
    event_sender: Mutex<Option<mpsc::UnboundedSender<SpeechEvent>>>,
}

#[derive(Debug, Clone)]
enum SessionFinish {
    Stop,
    Cancel,
    Error {
        code: Option<String>,
        details: Option<String>,
    },
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            utterances: None,
            finish: SessionFinish::Stop,
            session_count: AtomicUsize::new(0),
            event_sender: Mutex::new(None),
        }
    }

    pub fn session_count(&self) -> usize {
        self.session_count.load(Ordering::Relaxed)
    }

    fn sender(&self) -> Result<mpsc::UnboundedSender<SpeechEvent>, SpeechError> {
        self.event_sender
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SpeechError::SessionFailed("no event sender installed".to_string()))
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), SpeechError> {
        self.utterances = config.get("utterances").and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        });

        self.finish = match config.get("finish").and_then(|v| v.as_str()) {
            None | Some("stop") => SessionFinish::Stop,
            Some("cancel") => SessionFinish::Cancel,
            Some("error") => SessionFinish::Error {
                code: config
                    .get("cancel_code")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                details: config
                    .get("cancel_details")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
            },
            Some(other) => {
                return Err(SpeechError::InitializationFailed(format!(
                    "unknown finish mode '{other}'"
                )));
            }
        };
        Ok(())
    }

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SpeechEvent>) {
        *self.event_sender.lock().unwrap() = Some(sender);
    }

    async fn transcribe(&self, audio: &Path) -> Result<(), SpeechError> {
        let sender = self.sender()?;
        let count = self.session_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("NullEngine session #{count}: {}", audio.display());

        let size = match tokio::fs::metadata(audio).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                let _ = sender.send(SpeechEvent::Canceled {
                    reason: CancelReason::Error,
                    error_code: Some("AudioUnreadable".to_string()),
                    error_details: Some(e.to_string()),
                });
                return Ok(());
            }
        };

        match &self.utterances {
            Some(list) => {
                for utterance in list {
                    if utterance.is_empty() {
                        let _ = sender.send(SpeechEvent::NoMatch);
                    } else {
                        let _ = sender.send(SpeechEvent::Recognized {
                            text: utterance.clone(),
                        });
                    }
                }
            }
            None => {
                let _ = sender.send(SpeechEvent::Recognized {
                    text: format!("[null] {size} bytes"),
                });
            }
        }

        let terminal = match &self.finish {
            SessionFinish::Stop => SpeechEvent::SessionStopped,
            SessionFinish::Cancel => SpeechEvent::Canceled {
                reason: CancelReason::EndOfStream,
                error_code: None,
                error_details: None,
            },
            SessionFinish::Error { code, details } => SpeechEvent::Canceled {
                reason: CancelReason::Error,
                error_code: code.clone(),
                error_details: details.clone(),
            },
        };
        let _ = sender.send(terminal);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SpeechError> {
        self.event_sender.lock().unwrap().take();
        Ok(())
    }
}
