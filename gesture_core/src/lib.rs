//! # gesture_core
//!
//! Turns a per-frame stream of 21 hand landmarks into a stable gesture, a
//! smoothed cursor and debounced scene-mode changes.
//!
//! ```text
//! LandmarkSource ──► classify ──► TemporalStabilizer ──► ModeController ──► AppMode
//!        │
//!        └─ wrist ─► CursorSmoother ─────────────────────────────────────► HandState
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |---|---|
//! | [`landmark`]   | `Landmark`, `HandFrame`, joint indices |
//! | [`classifier`] | `Gesture` and the geometric classifier |
//! | [`stabilizer`] | majority vote over the last 8 gestures |
//! | [`cursor`]     | two-tier exponential smoothing of the wrist |
//! | [`mode`]       | `AppMode` and the debounced transition controller |
//! | [`source`]     | `LandmarkSource` trait and background start-up with retries |
//! | [`pipeline`]   | per-frame driver, `Pipeline` wrapper, stop handle |
//! | [`pose`]       | synthetic hand frames for each gesture |
//! | [`replay`]     | scripted source for headless runs and tests |
//!
//! Everything here is single-writer: the driver owns all mutable state and
//! callers read the snapshots it returns.

pub mod landmark;
pub mod classifier;
pub mod stabilizer;
pub mod cursor;
pub mod mode;
pub mod config;
pub mod error;
pub mod source;
pub mod pipeline;
pub mod pose;
pub mod replay;

pub use classifier::{classify, Gesture};
pub use config::{PipelineConfig, RetryPolicy};
pub use cursor::{Cursor, CursorConfig};
pub use error::{ConfigError, SourceError};
pub use landmark::{HandFrame, Landmark};
pub use mode::{AppMode, ModeTransition};
pub use pipeline::{HandState, Pipeline, PipelineDriver, PipelineStatus, StopHandle, Tick, TickOutcome};
pub use source::{FrameStamp, LandmarkSource, SourceStatus};
