use crate::handler::TriggerHandler;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc;
use wavetext_core::UploadEvent;

/// Watch a local input container directory and run the pipeline once per
/// newly created `.wav` file. Blocks for the lifetime of the watcher.
pub async fn watch_container(handler: TriggerHandler, dir: PathBuf) -> Result<(), notify::Error> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UploadEvent>();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in &event.paths {
                    let Some(blob) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    match UploadEvent::from_blob_name(blob) {
                        Some(upload) => {
                            let _ = tx.send(upload);
                        }
                        None => tracing::debug!(blob, "ignoring non-wav file"),
                    }
                }
            }
            Err(e) => tracing::error!("watch error: {e}"),
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::info!(dir = %dir.display(), "watching input container for new .wav uploads");

    while let Some(upload) = rx.recv().await {
        tracing::info!(name = %upload.name, "upload detected");
        if let Err(e) = handler.handle(&upload).await {
            tracing::error!(name = %upload.name, "pipeline run failed: {e}");
        }
    }

    Ok(())
}
