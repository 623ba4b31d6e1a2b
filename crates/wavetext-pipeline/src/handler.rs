use crate::transcriber::Transcriber;
use std::path::{Path, PathBuf};
use wavetext_core::{PipelineError, UploadEvent};
use wavetext_storage::BlobStore;

/// Scratch file pair owned by one pipeline run; both files are removed
/// best-effort on drop, whichever way the run exits.
struct ScratchPair {
    wav: PathBuf,
    txt: PathBuf,
}

impl ScratchPair {
    fn new(dir: &Path, name: &str) -> Self {
        Self {
            wav: dir.join(format!("{name}.wav")),
            txt: dir.join(format!("{name}.txt")),
        }
    }
}

impl Drop for ScratchPair {
    fn drop(&mut self) {
        for path in [&self.wav, &self.txt] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(
                        path = %path.display(),
                        "failed to remove scratch file: {e}"
                    );
                }
            }
        }
    }
}

/// Runs the whole pipeline for one uploaded audio object: download to a
/// scratch file, transcribe, upload the transcript, clean up.
pub struct TriggerHandler {
    store: Box<dyn BlobStore>,
    transcriber: Transcriber,
    scratch_dir: PathBuf,
    input_container: String,
    output_container: String,
}

impl TriggerHandler {
    pub fn new(
        store: Box<dyn BlobStore>,
        transcriber: Transcriber,
        scratch_dir: PathBuf,
        input_container: &str,
        output_container: &str,
    ) -> Self {
        Self {
            store,
            transcriber,
            scratch_dir,
            input_container: input_container.to_string(),
            output_container: output_container.to_string(),
        }
    }

    /// Process one upload event. Transfer and scratch I/O failures abort
    /// the invocation; a transcription setup failure is logged and skips
    /// the upload step, since no transcript was produced.
    pub async fn handle(&self, event: &UploadEvent) -> Result<(), PipelineError> {
        let wav_blob = event.wav_blob();
        let scratch = ScratchPair::new(&self.scratch_dir, &event.name);

        let audio = self
            .store
            .get(&self.input_container, &wav_blob)
            .await
            .map_err(|source| PipelineError::Download {
                blob: wav_blob.clone(),
                source,
            })?;
        tracing::info!(blob = %wav_blob, bytes = audio.len(), "downloaded uploaded audio blob");

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        tokio::fs::write(&scratch.wav, &audio).await?;

        match self
            .transcriber
            .transcribe_to_file(&scratch.wav, &scratch.txt)
            .await
        {
            Ok(summary) => {
                tracing::info!(
                    segments = summary.segments,
                    no_matches = summary.no_matches,
                    bytes = summary.bytes_written,
                    completion = ?summary.completion,
                    "recognition session finished"
                );
                let transcript = tokio::fs::read(&scratch.txt).await?;
                let txt_blob = event.txt_blob();
                self.store
                    .put(&self.output_container, &txt_blob, &transcript)
                    .await
                    .map_err(|source| PipelineError::Upload {
                        blob: txt_blob.clone(),
                        source,
                    })?;
                tracing::info!(blob = %txt_blob, bytes = transcript.len(), "uploaded transcript");
            }
            Err(e) => {
                // No transcript was produced, so there is nothing to upload.
                tracing::warn!(name = %event.name, "transcription did not run: {e}");
            }
        }

        Ok(())
    }
}
