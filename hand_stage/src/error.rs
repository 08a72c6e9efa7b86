//! Application-level errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use gesture_core::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("cannot open window: {0}")]
    Window(String),

    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("cannot parse config {}: {source}", path.display())]
    ConfigParse { path: PathBuf, source: serde_json::Error },

    #[error("invalid pipeline config: {0}")]
    Invalid(#[from] ConfigError),

    #[error("detector: {0}")]
    Detector(String),

    #[error("this build has no LeapMotion support (rebuild with --features leap)")]
    LeapDisabled,
}
