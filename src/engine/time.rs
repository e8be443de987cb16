//! Frame time integration and fps smoothing.

/// Lower bound on a frame delta, in seconds. Protects the first frame (and a
/// stalled scheduler) from a zero or runaway delta.
pub const DT_EPSILON: f64 = 0.0001;

/// Weight of the newest fps sample in the moving average.
const EMA_WEIGHT: f64 = 0.1;

/// Fixed multiplier between `dt * speed` and phase advance.
const PHASE_RATE: f64 = 2.0;

/// Assumed frame rate before the first measured frame.
const INITIAL_FPS: f64 = 60.0;

/// Converts successive frame timestamps into a delta, a smoothed frame-rate
/// estimate, and the animation phase accumulator.
#[derive(Debug, Clone)]
pub struct TimeIntegrator {
    last_ms: f64,
    fps_ema: f64,
    phase: f64,
}

impl TimeIntegrator {
    pub fn new() -> Self {
        Self {
            last_ms: 0.0,
            fps_ema: INITIAL_FPS,
            phase: 0.0,
        }
    }

    /// Record a new integration baseline without advancing anything.
    /// Called when the engine transitions to running so paused wall time is
    /// not integrated into the phase.
    pub fn rebase(&mut self, now_ms: f64) {
        self.last_ms = now_ms;
    }

    /// Integrate one frame. Returns the clamped delta in seconds.
    pub fn advance(&mut self, now_ms: f64, speed: f64) -> f64 {
        let dt = ((now_ms - self.last_ms) / 1000.0).max(DT_EPSILON);
        self.last_ms = now_ms;

        let fps = 1.0 / dt;
        self.fps_ema = self.fps_ema * (1.0 - EMA_WEIGHT) + fps * EMA_WEIGHT;

        self.phase += dt * speed * PHASE_RATE;
        dt
    }

    /// The phase accumulator driving the swirl motion.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Exponentially smoothed frames-per-second estimate.
    pub fn fps_ema(&self) -> f64 {
        self.fps_ema
    }

    /// Rewind the animation to its origin. Leaves the fps estimate and the
    /// integration baseline untouched.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for TimeIntegrator {
    fn default() -> Self {
        Self::new()
    }
}
