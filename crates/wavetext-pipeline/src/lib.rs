pub mod handler;
pub mod transcriber;
pub mod watcher;

pub use handler::TriggerHandler;
pub use transcriber::{Completion, SessionSummary, Transcriber};
pub use watcher::watch_container;
