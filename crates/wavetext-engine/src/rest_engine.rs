use crate::engine_trait::SpeechEngine;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use wavetext_core::{CancelReason, SpeechError, SpeechEvent};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const DEFAULT_LANGUAGE: &str = "ja-JP";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Hosted recognition service over HTTP: the audio bytes are POSTed to the
/// configured endpoint with a subscription key header and a `language`
/// query parameter; the JSON response carries a recognition status and the
/// recognized text.
pub struct RestEngine {
    service: Option<Service>,
    event_sender: Mutex<Option<mpsc::UnboundedSender<SpeechEvent>>>,
}

struct Service {
    endpoint: Url,
    api_key: String,
    language: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    #[serde(rename = "RecognitionStatus")]
    status: String,

    #[serde(rename = "DisplayText", default)]
    display_text: Option<String>,
}

fn request_url(endpoint: &Url, language: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("language", language)
        .append_pair("format", "simple");
    url
}

fn content_type(sample_rate: u32) -> String {
    format!("audio/wav; codecs=audio/pcm; samplerate={sample_rate}")
}

fn wav_sample_rate(audio: &Path) -> Result<u32, String> {
    hound::WavReader::open(audio)
        .map(|reader| reader.spec().sample_rate)
        .map_err(|e| e.to_string())
}

impl RestEngine {
    pub fn new() -> Self {
        Self {
            service: None,
            event_sender: Mutex::new(None),
        }
    }

    fn sender(&self) -> Result<mpsc::UnboundedSender<SpeechEvent>, SpeechError> {
        self.event_sender
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SpeechError::SessionFailed("no event sender installed".to_string()))
    }
}

impl Default for RestEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn cancel(sender: &mpsc::UnboundedSender<SpeechEvent>, code: &str, details: String) {
    let _ = sender.send(SpeechEvent::Canceled {
        reason: CancelReason::Error,
        error_code: Some(code.to_string()),
        error_details: Some(details),
    });
}

#[async_trait]
impl SpeechEngine for RestEngine {
    fn name(&self) -> &str {
        "rest"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), SpeechError> {
        let endpoint = config
            .get("endpoint")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                SpeechError::InitializationFailed("missing 'endpoint' in config".to_string())
            })?;
        let endpoint = Url::parse(endpoint).map_err(|e| {
            SpeechError::InitializationFailed(format!("malformed endpoint '{endpoint}': {e}"))
        })?;

        let api_key = config
            .get("api_key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                SpeechError::InitializationFailed("missing 'api_key' in config".to_string())
            })?;

        let language = config
            .get("language")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_LANGUAGE);

        let timeout_secs = config
            .get("timeout_secs")
            .and_then(|v| v.as_integer())
            .unwrap_or(DEFAULT_TIMEOUT_SECS as i64) as u64;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                SpeechError::InitializationFailed(format!("failed to build HTTP client: {e}"))
            })?;

        tracing::info!(
            endpoint = %endpoint,
            language,
            "RestEngine initialized"
        );
        self.service = Some(Service {
            endpoint,
            api_key: api_key.to_string(),
            language: language.to_string(),
            client,
        });
        Ok(())
    }

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SpeechEvent>) {
        *self.event_sender.lock().unwrap() = Some(sender);
    }

    async fn transcribe(&self, audio: &Path) -> Result<(), SpeechError> {
        let sender = self.sender()?;
        let service = self.service.as_ref().ok_or_else(|| {
            SpeechError::InitializationFailed("engine not initialized".to_string())
        })?;

        let sample_rate = match wav_sample_rate(audio) {
            Ok(rate) => rate,
            Err(e) => {
                cancel(&sender, "InvalidWavHeader", e);
                return Ok(());
            }
        };
        let bytes = match tokio::fs::read(audio).await {
            Ok(bytes) => bytes,
            Err(e) => {
                cancel(&sender, "AudioUnreadable", e.to_string());
                return Ok(());
            }
        };

        let url = request_url(&service.endpoint, &service.language);
        tracing::debug!(%url, bytes = bytes.len(), "submitting audio for recognition");

        let response = service
            .client
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, &service.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type(sample_rate))
            .header(reqwest::header::ACCEPT, "application/json")
            .body(bytes)
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                cancel(&sender, "ConnectionFailure", e.to_string());
                return Ok(());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                cancel(&sender, "ResponseRead", e.to_string());
                return Ok(());
            }
        };
        if !status.is_success() {
            cancel(&sender, status.as_str(), body);
            return Ok(());
        }

        let parsed: RecognitionResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                cancel(&sender, "InvalidResponse", e.to_string());
                return Ok(());
            }
        };

        match parsed.status.as_str() {
            "Success" => {
                let _ = sender.send(SpeechEvent::Recognized {
                    text: parsed.display_text.unwrap_or_default(),
                });
                let _ = sender.send(SpeechEvent::SessionStopped);
            }
            "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => {
                let _ = sender.send(SpeechEvent::NoMatch);
                let _ = sender.send(SpeechEvent::SessionStopped);
            }
            other => {
                cancel(
                    &sender,
                    other,
                    "service reported a failed recognition".to_string(),
                );
            }
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SpeechError> {
        self.event_sender.lock().unwrap().take();
        Ok(())
    }
}
