//! Swirl Field - Real-time procedural swirl animation engine.
//!
//! Given a drawable raster surface, the engine continuously renders a
//! parametric swirl pattern (concentric rings of points warped by a
//! time-varying wobble) and reports performance telemetry to a
//! caller-supplied observer. A small lifecycle contract (`play`, `pause`,
//! `reset`, `set_params`, `destroy`) lets a host embed it without knowledge
//! of its internals.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Construction options and parameter patches (lenient JSON)
//! - `engine`: Surface mapping, time integration, rendering, lifecycle
//!
//! The engine never touches globals. The host injects a [`Clock`], a
//! [`FrameScheduler`], a [`Viewport`] and a [`ResizeSource`], then invokes
//! [`SwirlEngine::frame`] once per granted frame request and
//! [`SwirlEngine::handle_resize`] per resize notification.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use swirl_field::{
//!     Clock, EngineOptions, FixedViewport, HostEnv, ManualClock, ManualResizeSource,
//!     ManualScheduler, RasterSurface, SwirlEngine,
//! };
//!
//! let clock = Rc::new(RefCell::new(ManualClock::new(0.0)));
//! let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
//! let surface = Rc::new(RefCell::new(RasterSurface::new()));
//!
//! let env = HostEnv {
//!     clock: Box::new(Rc::clone(&clock)),
//!     scheduler: Box::new(Rc::clone(&scheduler)),
//!     viewport: Box::new(FixedViewport::new(640.0, 360.0, 1.0)),
//!     resize: Box::new(ManualResizeSource::new()),
//! };
//!
//! let mut engine =
//!     SwirlEngine::new(Box::new(Rc::clone(&surface)), env, EngineOptions::default(), None)
//!         .expect("no observer, construction cannot fail");
//!
//! // Pump the scheduler the way a refresh-driven host would.
//! for _ in 0..60 {
//!     clock.borrow_mut().advance(16.7);
//!     let dispatched = scheduler.borrow_mut().take_next();
//!     if dispatched.is_some() {
//!         let now = clock.borrow().now_ms();
//!         engine.frame(now).expect("no observer, frame cannot fail");
//!     }
//! }
//! engine.destroy();
//! ```

pub mod engine;
pub mod schema;

// Re-export commonly used types
pub use engine::{
    Clock, DrawTarget, EngineError, FixedViewport, FrameScheduler, HostEnv, ManualClock,
    ManualResizeSource, ManualScheduler, RasterSurface, ResizeSource, Rgba, StatsObserver,
    StatsSample, SurfaceDimensions, SwirlEngine, SystemClock, Viewport,
};
pub use schema::{AnimationConfig, EngineOptions, ParamPatch};
