//! Telemetry emission.
//!
//! The emitter is a thin forwarding channel: each sample goes straight to
//! the caller-supplied observer, unbatched and unbuffered. An observer
//! failure is returned to the caller, never swallowed or retried.

use serde::Serialize;

/// Error type an observer may return.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Caller-supplied telemetry observer.
pub type StatsObserver = Box<dyn FnMut(&StatsSample) -> Result<(), ObserverError>>;

/// One partial telemetry sample.
///
/// Only a subset of fields is present in any given sample; consumers must
/// treat samples as incremental updates, not complete snapshots. Serializes
/// with absent fields omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSample {
    /// Smoothed frames-per-second estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Points drawn by the last frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    /// Current speed parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Current zoom parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl StatsSample {
    /// The per-frame sample emitted before drawing.
    pub fn frame(fps: f64, speed: f64, zoom: f64) -> Self {
        Self {
            fps: Some(fps),
            speed: Some(speed),
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    /// The per-frame sample emitted after drawing.
    pub fn points(points: u64) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }

    pub fn speed(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }
}

/// Forwards samples to the optional observer.
pub struct StatsEmitter {
    observer: Option<StatsObserver>,
}

impl StatsEmitter {
    pub fn new(observer: Option<StatsObserver>) -> Self {
        Self { observer }
    }

    /// Forward one sample. A no-op without an observer.
    pub fn emit(&mut self, sample: StatsSample) -> Result<(), ObserverError> {
        match self.observer.as_mut() {
            Some(observer) => observer(&sample),
            None => Ok(()),
        }
    }
}
