//! # hand_stage
//!
//! Hand-gesture controller for a particle installation: a webcam (or
//! simulator, or LeapMotion) hand steers the scene mode and a cursor, with a
//! software-rendered preview window.
//!
//! ## Gesture → Mode mapping
//!
//! | Stable gesture | Mode |
//! |---|---|
//! | Heart (thumb, index and pinky extended; middle and ring folded) | LOVE |
//! | Victory (index + middle extended) | TEXT |
//! | Closed fist | TREE |
//! | Open hand | SCATTER |
//! | Pinch, none | no change |
//!
//! Mode changes are at least 600 ms apart.  The wrist drives a smoothed,
//! mirrored cursor that tilts the scene.
//!
//! ## Landmark sources
//!
//! * `sim` (default): keyboard and mouse hold up a synthetic hand.
//! * `detector`: an external camera + model process speaking JSON lines.
//! * `leap`: a LeapMotion controller via LeapC (`--features leap`).
//!
//! ### Simulation keys
//!
//! | Key | Hand |
//! |---|---|
//! | `1` | Open hand |
//! | `2` | Closed fist |
//! | `3` | Pinch |
//! | `4` | Victory |
//! | `5` | Heart |
//! | `6` | Relaxed (classifies as nothing) |
//! | `0` | Hide the hand |
//! | `J` | Toggle jitter (every fifth frame relaxed) |
//! | mouse | Move the wrist |
//! | `Q` / `Esc` | Quit |

pub mod error;
pub mod source;
pub mod detector;
pub mod scene;
pub mod visualizer;
pub mod app;

pub use app::{AppConfig, SourceKind};
pub use error::AppError;
