//! Error types.

use thiserror::Error;

/// Why a landmark source is not delivering frames.
///
/// Cloneable so the last failure can be shown to the UI as a status.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Model or inference resource failed to load.  Worth retrying.
    #[error("hand model failed to load: {0}")]
    ModelLoad(String),

    /// Camera permission denied or device busy.  Needs the user, not a retry.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The source answered with something it should not have.
    #[error("landmark source protocol error: {0}")]
    Protocol(String),

    /// Every initialization attempt failed.
    #[error("hand tracking unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<SourceError> },

    /// The initializer went away without reporting back.
    #[error("landmark source initialization was abandoned")]
    Abandoned,
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::ModelLoad(_) | SourceError::Protocol(_))
    }
}

/// Rejected pipeline configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("history capacity must be at least 1")]
    EmptyHistory,

    #[error("smoothing factor {name} = {value} is outside (0, 1]")]
    SmoothingFactor { name: &'static str, value: f32 },

    #[error("jump threshold {0} must be a finite, non-negative distance")]
    JumpThreshold(f32),
}
