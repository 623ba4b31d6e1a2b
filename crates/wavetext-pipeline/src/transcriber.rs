use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use wavetext_core::{CancelReason, SpeechError, SpeechEvent};
use wavetext_engine::EngineRegistry;

/// How a recognition session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Stopped,
    Canceled(CancelReason),
}

/// Outcome of one adapter run over a single audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub segments: usize,
    pub no_matches: usize,
    pub bytes_written: u64,
    pub completion: Completion,
}

/// The transcription adapter: drives one recognition session per audio
/// file and appends every recognized segment, in recognition order and
/// without separators, to a transcript file.
pub struct Transcriber {
    registry: EngineRegistry,
    engine_name: String,
    engine_config: toml::Value,
}

impl Transcriber {
    pub fn new(engine_name: &str, engine_config: toml::Value) -> Self {
        Self::with_registry(EngineRegistry::new(), engine_name, engine_config)
    }

    pub fn with_registry(
        registry: EngineRegistry,
        engine_name: &str,
        engine_config: toml::Value,
    ) -> Self {
        Self {
            registry,
            engine_name: engine_name.to_string(),
            engine_config,
        }
    }

    /// Transcribe `audio` into `transcript`.
    ///
    /// Setup failures (transcript not writable, unknown engine, invalid
    /// engine configuration) return an error before the engine is driven.
    /// Once the session runs, cancellations are a normal termination and
    /// per-segment write failures only cost the affected segment.
    pub async fn transcribe_to_file(
        &self,
        audio: &Path,
        transcript: &Path,
    ) -> Result<SessionSummary, SpeechError> {
        let mut out = tokio::fs::File::create(transcript)
            .await
            .map_err(|e| SpeechError::TranscriptOpen(e.to_string()))?;

        let mut engine = self.registry.create(&self.engine_name)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine.initialize(self.engine_config.clone()).await?;

        engine.transcribe(audio).await?;
        // The session has fully run; release the engine (this also closes
        // the event channel) before consuming the queued events.
        if let Err(e) = engine.shutdown().await {
            tracing::warn!("engine shutdown failed: {e}");
        }
        drop(engine);

        let mut segments = 0usize;
        let mut no_matches = 0usize;
        let mut bytes_written = 0u64;
        let completion = loop {
            match rx.recv().await {
                Some(SpeechEvent::Recognized { text }) => {
                    tracing::info!(%text, "recognized segment");
                    segments += 1;
                    match out.write_all(text.as_bytes()).await {
                        Ok(()) => bytes_written += text.len() as u64,
                        Err(e) => {
                            tracing::warn!("failed to append segment to transcript: {e}");
                        }
                    }
                }
                Some(SpeechEvent::NoMatch) => {
                    tracing::info!("no match: speech could not be recognized");
                    no_matches += 1;
                }
                Some(SpeechEvent::Canceled {
                    reason,
                    error_code,
                    error_details,
                }) => {
                    tracing::info!(%reason, "recognition canceled");
                    if reason == CancelReason::Error {
                        tracing::warn!(
                            code = ?error_code,
                            details = ?error_details,
                            "recognition canceled by error"
                        );
                    }
                    break Completion::Canceled(reason);
                }
                Some(SpeechEvent::SessionStopped) => {
                    tracing::info!("session stopped");
                    break Completion::Stopped;
                }
                None => {
                    tracing::warn!("event channel closed without a terminal event");
                    break Completion::Stopped;
                }
            }
        };

        out.flush()
            .await
            .map_err(|e| SpeechError::SessionFailed(format!("failed to flush transcript: {e}")))?;

        Ok(SessionSummary {
            segments,
            no_matches,
            bytes_written,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wavetext_engine::SpeechEngine;

    fn utterances_config(utterances: &[&str]) -> toml::Value {
        toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert(
                "utterances".to_string(),
                toml::Value::Array(
                    utterances
                        .iter()
                        .map(|s| toml::Value::String(s.to_string()))
                        .collect(),
                ),
            );
            t
        })
    }

    fn scratch_audio(dir: &Path) -> std::path::PathBuf {
        let audio = dir.join("input.wav");
        std::fs::write(&audio, b"fake audio").unwrap();
        audio
    }

    #[tokio::test]
    async fn test_transcriber_concatenates_segments_without_separator() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let transcriber = Transcriber::new("null", utterances_config(&["今日は", "いい天気"]));
        let summary = transcriber
            .transcribe_to_file(&audio, &transcript)
            .await
            .unwrap();

        assert_eq!(summary.segments, 2);
        assert_eq!(summary.completion, Completion::Stopped);
        let contents = std::fs::read_to_string(&transcript).unwrap();
        assert_eq!(contents, "今日はいい天気");
        assert_eq!(summary.bytes_written, contents.len() as u64);
    }

    #[tokio::test]
    async fn test_transcriber_no_match_contributes_no_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let transcriber = Transcriber::new("null", utterances_config(&["a", "", "b"]));
        let summary = transcriber
            .transcribe_to_file(&audio, &transcript)
            .await
            .unwrap();

        assert_eq!(summary.segments, 2);
        assert_eq!(summary.no_matches, 1);
        assert_eq!(std::fs::read_to_string(&transcript).unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_transcriber_cancellation_is_normal_termination() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let config = toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert(
                "utterances".to_string(),
                toml::Value::Array(vec![toml::Value::String("partial".to_string())]),
            );
            t.insert(
                "finish".to_string(),
                toml::Value::String("error".to_string()),
            );
            t.insert(
                "cancel_code".to_string(),
                toml::Value::String("ConnectionFailure".to_string()),
            );
            t
        });
        let transcriber = Transcriber::new("null", config);
        let summary = transcriber
            .transcribe_to_file(&audio, &transcript)
            .await
            .unwrap();

        assert_eq!(summary.completion, Completion::Canceled(CancelReason::Error));
        assert_eq!(std::fs::read_to_string(&transcript).unwrap(), "partial");
    }

    #[tokio::test]
    async fn test_transcriber_unknown_engine_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let transcriber = Transcriber::new("nope", toml::Value::Table(Default::default()));
        match transcriber.transcribe_to_file(&audio, &transcript).await {
            Err(SpeechError::EngineNotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("expected EngineNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcriber_malformed_endpoint_never_drives_engine() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let config = toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert(
                "endpoint".to_string(),
                toml::Value::String("not a url".to_string()),
            );
            t.insert(
                "api_key".to_string(),
                toml::Value::String("key".to_string()),
            );
            t
        });
        let transcriber = Transcriber::new("rest", config);
        match transcriber.transcribe_to_file(&audio, &transcript).await {
            Err(SpeechError::InitializationFailed(msg)) => assert!(msg.contains("malformed")),
            other => panic!("expected InitializationFailed, got {other:?}"),
        }
        // The transcript was opened before the engine was configured, but
        // never written.
        assert_eq!(std::fs::read(&transcript).unwrap(), b"");
    }

    #[tokio::test]
    async fn test_transcriber_unwritable_transcript_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("missing").join("out.txt");

        let transcriber = Transcriber::new("null", toml::Value::Table(Default::default()));
        match transcriber.transcribe_to_file(&audio, &transcript).await {
            Err(SpeechError::TranscriptOpen(_)) => {}
            other => panic!("expected TranscriptOpen, got {other:?}"),
        }
    }

    /// Engine that reports both terminal events; only the first may count.
    struct DoubleTerminalEngine {
        event_sender: Mutex<Option<mpsc::UnboundedSender<SpeechEvent>>>,
    }

    impl DoubleTerminalEngine {
        fn new() -> Self {
            Self {
                event_sender: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SpeechEngine for DoubleTerminalEngine {
        fn name(&self) -> &str {
            "double-terminal"
        }

        async fn initialize(&mut self, _config: toml::Value) -> Result<(), SpeechError> {
            Ok(())
        }

        fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SpeechEvent>) {
            *self.event_sender.lock().unwrap() = Some(sender);
        }

        async fn transcribe(&self, _audio: &Path) -> Result<(), SpeechError> {
            let sender = self.event_sender.lock().unwrap().clone().unwrap();
            let _ = sender.send(SpeechEvent::Recognized {
                text: "before".to_string(),
            });
            let _ = sender.send(SpeechEvent::SessionStopped);
            let _ = sender.send(SpeechEvent::Canceled {
                reason: CancelReason::Error,
                error_code: Some("TooLate".to_string()),
                error_details: None,
            });
            let _ = sender.send(SpeechEvent::Recognized {
                text: "after".to_string(),
            });
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), SpeechError> {
            self.event_sender.lock().unwrap().take();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_transcriber_first_terminal_event_wins() {
        let dir = tempfile::tempdir().unwrap();
        let audio = scratch_audio(dir.path());
        let transcript = dir.path().join("out.txt");

        let mut registry = EngineRegistry::new();
        registry.register("double-terminal", || Box::new(DoubleTerminalEngine::new()));
        let transcriber = Transcriber::with_registry(
            registry,
            "double-terminal",
            toml::Value::Table(Default::default()),
        );
        let summary = transcriber
            .transcribe_to_file(&audio, &transcript)
            .await
            .unwrap();

        // The stop arrived first; the later cancel and segment are discarded.
        assert_eq!(summary.completion, Completion::Stopped);
        assert_eq!(summary.segments, 1);
        assert_eq!(std::fs::read_to_string(&transcript).unwrap(), "before");
    }
}
