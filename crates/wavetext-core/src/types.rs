use std::fmt;

/// Identifies one uploaded audio object; triggers one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub name: String,
}

impl UploadEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Build an event from a `{name}.wav` blob name. Returns `None` for
    /// anything that does not match the trigger pattern.
    pub fn from_blob_name(blob: &str) -> Option<Self> {
        let name = blob.strip_suffix(".wav")?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name))
    }

    pub fn wav_blob(&self) -> String {
        format!("{}.wav", self.name)
    }

    pub fn txt_blob(&self) -> String {
        format!("{}.txt", self.name)
    }
}

/// Why a recognition session was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    EndOfStream,
    Error,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::EndOfStream => write!(f, "end of stream"),
            CancelReason::Error => write!(f, "error"),
        }
    }
}

/// One event reported by a recognition engine during a session.
///
/// `Canceled` and `SessionStopped` are terminal: the first one ends the
/// session from the consumer's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A successfully recognized segment of speech.
    Recognized { text: String },
    /// The engine processed audio but could not recognize speech in it.
    NoMatch,
    /// The session ended early; `error_code` and `error_details` are set
    /// when the reason is [`CancelReason::Error`].
    Canceled {
        reason: CancelReason,
        error_code: Option<String>,
        error_details: Option<String>,
    },
    /// The session ran to the end of the audio.
    SessionStopped,
}

impl SpeechEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SpeechEvent::Canceled { .. } | SpeechEvent::SessionStopped
        )
    }
}
