//! Top-level application state and the render loop.
//!
//! `AppState` owns the scene and the latest hand snapshot.  It consumes the
//! [`Tick`]s the pipeline publishes and the pipeline's status, and drives
//! the visualizer each frame.  The application mode lives here; the pipeline
//! only ever proposes a new one.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use gesture_core::stabilizer::GestureHistory;
use gesture_core::{
    AppMode, Gesture, HandState, LandmarkSource, Pipeline, PipelineConfig, PipelineStatus, Tick,
    TickOutcome,
};

use crate::detector::{DetectorConfig, SubprocessSource};
use crate::error::AppError;
use crate::scene::Scene;
use crate::source::{SimInput, SimLandmarkSource};
use crate::visualizer::{View, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where landmarks come from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Keyboard and mouse drive a synthetic hand.
    #[default]
    Sim,
    /// External camera + model process speaking JSON lines.
    Detector(DetectorConfig),
    /// LeapMotion controller (needs the `leap` feature).
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline:              PipelineConfig,
    pub source:                SourceKind,
    pub initial_mode:          AppMode,
    pub particle_count:        usize,
    /// Virtual camera period for the simulator.
    pub sim_frame_interval_ms: u64,
    /// Simulated start-up failures before the simulator comes up.
    pub sim_flaky_starts:      u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pipeline:              PipelineConfig::default(),
            source:                SourceKind::Sim,
            initial_mode:          AppMode::Tree,
            particle_count:        1_500,
            sim_frame_interval_ms: 33,
            sim_flaky_starts:      0,
        }
    }
}

impl AppConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| AppError::ConfigRead { path: path.to_path_buf(), source })?;
        let cfg: AppConfig = serde_json::from_str(&text)
            .map_err(|source| AppError::ConfigParse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.pipeline.validate()?;
        if let SourceKind::Detector(d) = &self.source {
            if d.command.trim().is_empty() {
                return Err(AppError::Detector("no detector command configured".into()));
            }
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Source construction
// ════════════════════════════════════════════════════════════════════════════

/// Build the configured landmark source.  The simulator reads `sim_rx`;
/// other sources drop it.
pub fn build_source(
    cfg: &AppConfig,
    sim_rx: Receiver<SimInput>,
) -> Result<Box<dyn LandmarkSource>, AppError> {
    match &cfg.source {
        SourceKind::Sim => Ok(Box::new(
            SimLandmarkSource::new(sim_rx, cfg.sim_frame_interval_ms)
                .with_flaky_start(cfg.sim_flaky_starts),
        )),
        SourceKind::Detector(d) => {
            if d.command.trim().is_empty() {
                return Err(AppError::Detector("no detector command configured".into()));
            }
            Ok(Box::new(SubprocessSource::new(d.clone())))
        }
        SourceKind::Leap => leap_source(),
    }
}

#[cfg(feature = "leap")]
fn leap_source() -> Result<Box<dyn LandmarkSource>, AppError> {
    Ok(Box::new(crate::source::LeapLandmarkSource::new()))
}

#[cfg(not(feature = "leap"))]
fn leap_source() -> Result<Box<dyn LandmarkSource>, AppError> {
    Err(AppError::LeapDisabled)
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    mode:        AppMode,
    hand:        HandState,
    raw:         Gesture,
    hand_seen:   bool,
    scene:       Scene,
    transitions: usize,
    tracking:    Option<PipelineStatus>,
    pub status:  String,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        AppState {
            mode:        cfg.initial_mode,
            hand:        HandState::default(),
            raw:         Gesture::None,
            hand_seen:   false,
            scene:       Scene::new(cfg.particle_count, cfg.initial_mode),
            transitions: 0,
            tracking:    None,
            status:      format!("Starting in {} mode", cfg.initial_mode),
        }
    }

    // ── pipeline output ──────────────────────────────────────────────────

    pub fn handle_tick(&mut self, tick: &Tick) {
        self.hand      = tick.hand;
        self.raw       = tick.raw;
        self.hand_seen = tick.hand_seen;
        self.mode      = tick.mode;
        if let Some(t) = tick.transition {
            self.transitions += 1;
            self.scene.set_mode(t.to);
            self.status = format!("{} -> {}  ({})", t.from, t.to, t.gesture);
        }
    }

    /// Reflect start-up progress, failure or shutdown in the status line.
    pub fn update_status(&mut self, status: &PipelineStatus) {
        if self.tracking.as_ref() == Some(status) {
            return;
        }
        self.tracking = Some(status.clone());
        self.status = match status {
            PipelineStatus::Starting { attempt: 0 } => "Starting hand tracking...".to_string(),
            PipelineStatus::Starting { attempt }    => format!("Starting hand tracking (attempt {})...", attempt),
            PipelineStatus::Running                 => format!("Tracking  mode {}", self.mode),
            PipelineStatus::Unavailable(e)          => format!("Hand tracking unavailable: {}", e),
            PipelineStatus::Stopped                 => "Hand tracking stopped".to_string(),
        };
    }

    /// Per-frame animation.
    pub fn tick(&mut self) {
        self.scene.tick(self.hand.cursor);
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn mode(&self)        -> AppMode   { self.mode }
    pub fn hand(&self)        -> HandState { self.hand }
    pub fn raw(&self)         -> Gesture   { self.raw }
    pub fn scene(&self)       -> &Scene    { &self.scene }
    pub fn transitions(&self) -> usize     { self.transitions }

    pub fn view<'a>(&'a self, history: &'a GestureHistory) -> View<'a> {
        View {
            scene:     &self.scene,
            hand:      self.hand,
            hand_seen: self.hand_seen,
            mode:      self.mode,
            raw:       self.raw,
            history,
            status:    &self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Opens the preview window, starts the configured landmark source in the
/// background and drives poll → update → render at the window's frame rate
/// until the window closes or the user quits.  The source is released on
/// the way out.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;

    // ── Sim input channel (unused by hardware sources) ───────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let source = build_source(&cfg, sim_rx)?;

    let mut vis = Visualizer::new(sim_tx)?;
    let mut pipeline = Pipeline::new(source, &cfg.pipeline);
    let mut app = AppState::new(&cfg);

    let started = Instant::now();
    while vis.is_open() {
        if !vis.poll_input() { break; }

        let now_ms = started.elapsed().as_millis() as u64;
        if let TickOutcome::Published(tick) = pipeline.poll(app.mode(), now_ms) {
            app.handle_tick(&tick);
        }
        app.update_status(&pipeline.status());
        app.tick();

        vis.render(&app.view(pipeline.driver().stabilizer().history()));
    }

    pipeline.stop();
    log::info!("{} mode change(s) this session", app.transitions());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
