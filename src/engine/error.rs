use std::path::PathBuf;

use thiserror::Error;

use crate::engine::engine::LifecycleState;

/// Errors raised while bringing a playback session up.
///
/// None of these are retried: the controller aborts startup and tears down
/// whatever was already acquired.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to open '{}': {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open output stream: {0}")]
    StreamOpen(String),

    #[error("Failed to start output stream: {0}")]
    StreamStart(String),

    #[error("Invalid lifecycle transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}
