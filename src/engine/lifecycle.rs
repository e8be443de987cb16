//! Engine lifecycle state machine.
//!
//! `SwirlEngine` is either Stopped or Running. `play` records a fresh
//! integration baseline and requests a frame from the host scheduler;
//! `pause` cancels the outstanding request. A frame that was already
//! dispatched before cancellation is tolerated: the callback checks the
//! running flag and does nothing. `destroy` is terminal; every operation
//! afterwards is a safe no-op.

use log::debug;
use thiserror::Error;

use crate::schema::{AnimationConfig, EngineOptions, ParamPatch};

use super::host::{FrameRequestId, HostEnv, SubscriptionId};
use super::render::SwirlRenderer;
use super::stats::{ObserverError, StatsEmitter, StatsObserver, StatsSample};
use super::surface::{DrawTarget, SurfaceAdapter, SurfaceDimensions};
use super::time::TimeIntegrator;

/// Engine failure modes.
///
/// The engine has no recoverable failures of its own; the only error it can
/// surface is one raised by the caller-supplied observer, propagated
/// unmodified out of the frame step.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("stats observer failed: {0}")]
    Observer(ObserverError),
}

/// Real-time swirl animation engine.
pub struct SwirlEngine {
    target: Box<dyn DrawTarget>,
    env: HostEnv,
    config: AnimationConfig,
    integrator: TimeIntegrator,
    adapter: SurfaceAdapter,
    renderer: SwirlRenderer,
    emitter: StatsEmitter,
    running: bool,
    destroyed: bool,
    pending_frame: Option<FrameRequestId>,
    resize_subscription: Option<SubscriptionId>,
}

impl SwirlEngine {
    /// Construct the engine: subscribe to resize notifications, fit the
    /// surface once, apply the initial parameters (emitting a sample per
    /// explicitly supplied field) and auto-start unless `running` is an
    /// explicit `false`.
    ///
    /// The only possible error is an observer failure during the initial
    /// parameter emission.
    pub fn new(
        target: Box<dyn DrawTarget>,
        env: HostEnv,
        options: EngineOptions,
        observer: Option<StatsObserver>,
    ) -> Result<Self, EngineError> {
        let mut engine = Self {
            target,
            env,
            config: AnimationConfig::default(),
            integrator: TimeIntegrator::new(),
            adapter: SurfaceAdapter::new(),
            renderer: SwirlRenderer::new(),
            emitter: StatsEmitter::new(observer),
            running: false,
            destroyed: false,
            pending_frame: None,
            resize_subscription: None,
        };

        let subscription = engine.env.resize.subscribe();
        engine.resize_subscription = Some(subscription);

        engine
            .adapter
            .fit(engine.env.viewport.as_ref(), engine.target.as_mut());

        engine.set_params(options.patch())?;
        if options.auto_start() {
            engine.play();
        }
        Ok(engine)
    }

    /// Transition to Running. A no-op when already Running or destroyed.
    pub fn play(&mut self) {
        if self.destroyed || self.running {
            return;
        }
        self.running = true;
        self.integrator.rebase(self.env.clock.now_ms());
        self.pending_frame = Some(self.env.scheduler.request_frame());
        debug!("engine running");
    }

    /// Transition to Stopped, withdrawing the pending frame request.
    /// A no-op when already Stopped.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(id) = self.pending_frame.take() {
            self.env.scheduler.cancel_frame(id);
        }
        debug!("engine paused");
    }

    /// Rewind the phase accumulator to zero. Never changes the running
    /// state.
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }
        self.integrator.reset_phase();
    }

    /// Apply a partial parameter update. Each present, finite field
    /// overwrites the config value and emits a sample containing only that
    /// field. Unknown fields in the patch source were already dropped at
    /// deserialization.
    pub fn set_params(&mut self, patch: ParamPatch) -> Result<(), EngineError> {
        if self.destroyed {
            return Ok(());
        }
        if let Some(speed) = patch.speed.filter(|v| v.is_finite()) {
            self.config.speed = speed;
            self.emit(StatsSample::speed(speed))?;
        }
        if let Some(zoom) = patch.zoom.filter(|v| v.is_finite()) {
            self.config.zoom = zoom;
            self.emit(StatsSample::zoom(zoom))?;
        }
        Ok(())
    }

    /// Stop rendering and detach from the resize source. Terminal: every
    /// subsequent operation, including another `destroy`, is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pause();
        if let Some(id) = self.resize_subscription.take() {
            self.env.resize.unsubscribe(id);
        }
        self.destroyed = true;
        debug!("engine destroyed");
    }

    /// One scheduled frame callback, invoked by the host for each granted
    /// frame request.
    ///
    /// If the engine stopped after the request was dispatched this does
    /// nothing and does not re-request. Otherwise it integrates time, emits
    /// `{fps, speed, zoom}`, draws, emits `{points}` and requests the next
    /// frame. An observer error propagates before the re-request, halting
    /// the loop.
    pub fn frame(&mut self, now_ms: f64) -> Result<(), EngineError> {
        if !self.running {
            return Ok(());
        }
        // This request is being serviced; a new one is filed below.
        self.pending_frame = None;

        self.integrator.advance(now_ms, self.config.speed);
        self.emit(StatsSample::frame(
            self.integrator.fps_ema(),
            self.config.speed,
            self.config.zoom,
        ))?;

        let points = self.renderer.draw(
            self.target.as_mut(),
            self.integrator.phase(),
            self.config.zoom,
            self.adapter.dimensions(),
        );
        self.emit(StatsSample::points(points))?;

        self.pending_frame = Some(self.env.scheduler.request_frame());
        Ok(())
    }

    /// Refit the surface to the current environment reading. Independent of
    /// the running state; a no-op once destroyed.
    pub fn handle_resize(&mut self) {
        if self.destroyed {
            return;
        }
        self.adapter
            .fit(self.env.viewport.as_ref(), self.target.as_mut());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Current phase accumulator value.
    pub fn phase(&self) -> f64 {
        self.integrator.phase()
    }

    /// Effective animation parameters.
    pub fn config(&self) -> AnimationConfig {
        self.config
    }

    /// Dimensions from the most recent fit.
    pub fn dimensions(&self) -> SurfaceDimensions {
        self.adapter.dimensions()
    }

    fn emit(&mut self, sample: StatsSample) -> Result<(), EngineError> {
        self.emitter.emit(sample).map_err(EngineError::Observer)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::host::{
        Clock, FixedViewport, ManualClock, ManualResizeSource, ManualScheduler,
    };
    use crate::engine::surface::RasterSurface;

    struct Harness {
        engine: SwirlEngine,
        clock: Rc<RefCell<ManualClock>>,
        scheduler: Rc<RefCell<ManualScheduler>>,
        viewport: Rc<RefCell<FixedViewport>>,
        resize: Rc<RefCell<ManualResizeSource>>,
        surface: Rc<RefCell<RasterSurface>>,
        samples: Rc<RefCell<Vec<StatsSample>>>,
    }

    fn harness(options: EngineOptions) -> Harness {
        harness_with_observer(options, None).unwrap()
    }

    fn harness_with_observer(
        options: EngineOptions,
        observer: Option<StatsObserver>,
    ) -> Result<Harness, EngineError> {
        let clock = Rc::new(RefCell::new(ManualClock::new(0.0)));
        let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
        let viewport = Rc::new(RefCell::new(FixedViewport::new(640.0, 360.0, 1.0)));
        let resize = Rc::new(RefCell::new(ManualResizeSource::new()));
        let surface = Rc::new(RefCell::new(RasterSurface::new()));
        let samples = Rc::new(RefCell::new(Vec::new()));

        let observer = observer.unwrap_or_else(|| {
            let sink = Rc::clone(&samples);
            Box::new(move |sample: &StatsSample| {
                sink.borrow_mut().push(*sample);
                Ok(())
            })
        });

        let env = HostEnv {
            clock: Box::new(Rc::clone(&clock)),
            scheduler: Box::new(Rc::clone(&scheduler)),
            viewport: Box::new(Rc::clone(&viewport)),
            resize: Box::new(Rc::clone(&resize)),
        };

        let engine = SwirlEngine::new(Box::new(Rc::clone(&surface)), env, options, Some(observer))?;
        Ok(Harness {
            engine,
            clock,
            scheduler,
            viewport,
            resize,
            surface,
            samples,
        })
    }

    impl Harness {
        /// Advance the clock and dispatch the oldest pending frame request,
        /// the way a refresh-driven host would.
        fn pump(&mut self, advance_ms: f64) -> Result<(), EngineError> {
            self.clock.borrow_mut().advance(advance_ms);
            let dispatched = self.scheduler.borrow_mut().take_next();
            if dispatched.is_some() {
                let now = self.clock.borrow().now_ms();
                self.engine.frame(now)
            } else {
                Ok(())
            }
        }

        fn pending(&self) -> usize {
            self.scheduler.borrow().pending_count()
        }

        fn take_samples(&self) -> Vec<StatsSample> {
            std::mem::take(&mut *self.samples.borrow_mut())
        }
    }

    fn stopped() -> EngineOptions {
        EngineOptions {
            running: Some(false),
            ..EngineOptions::default()
        }
    }

    #[test]
    fn test_defaults_for_missing_params() {
        let h = harness(stopped());
        assert_eq!(h.engine.config().speed, 0.5);
        assert_eq!(h.engine.config().zoom, 1.0);
    }

    #[test]
    fn test_defaults_for_non_numeric_params() {
        let options: EngineOptions =
            serde_json::from_str(r#"{"speed": "quick", "zoom": [], "running": false}"#).unwrap();
        let h = harness(options);
        assert_eq!(h.engine.config().speed, 0.5);
        assert_eq!(h.engine.config().zoom, 1.0);
    }

    #[test]
    fn test_auto_start_default() {
        let h = harness(EngineOptions::default());
        assert!(h.engine.is_running());
        assert_eq!(h.pending(), 1);
    }

    #[test]
    fn test_running_false_schedules_nothing_until_play() {
        let mut h = harness(stopped());
        assert!(!h.engine.is_running());
        assert_eq!(h.pending(), 0);

        h.engine.play();
        assert!(h.engine.is_running());
        assert_eq!(h.pending(), 1);
    }

    #[test]
    fn test_construction_emits_explicit_params() {
        let h = harness(EngineOptions {
            speed: Some(1.5),
            zoom: Some(2.0),
            running: Some(false),
        });
        let samples = h.take_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], StatsSample::speed(1.5));
        assert_eq!(samples[1], StatsSample::zoom(2.0));
    }

    #[test]
    fn test_play_twice_one_request() {
        let mut h = harness(stopped());
        h.engine.play();
        h.engine.play();
        assert_eq!(h.pending(), 1);
    }

    #[test]
    fn test_pause_before_play_and_double_pause() {
        let mut h = harness(stopped());
        h.engine.pause();
        h.engine.pause();
        assert!(!h.engine.is_running());
        assert_eq!(h.pending(), 0);
    }

    #[test]
    fn test_pause_cancels_pending_request() {
        let mut h = harness(EngineOptions::default());
        assert_eq!(h.pending(), 1);
        h.engine.pause();
        assert_eq!(h.pending(), 0);
    }

    #[test]
    fn test_frame_emits_two_samples_and_rerequests() {
        let mut h = harness(EngineOptions::default());
        h.pump(16.7).unwrap();

        let samples = h.take_samples();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].fps.is_some());
        assert_eq!(samples[0].speed, Some(0.5));
        assert_eq!(samples[0].zoom, Some(1.0));
        assert_eq!(samples[0].points, None);
        assert_eq!(samples[1], StatsSample::points(4000));

        // The callback re-requested itself.
        assert_eq!(h.pending(), 1);
    }

    #[test]
    fn test_first_dt_at_least_epsilon() {
        let mut h = harness(EngineOptions {
            speed: Some(1.0),
            ..EngineOptions::default()
        });
        h.take_samples();
        // Dispatch the first frame with zero elapsed wall time.
        h.pump(0.0).unwrap();
        assert_eq!(h.engine.phase(), 0.0001 * 1.0 * 2.0);
    }

    #[test]
    fn test_reset_zeroes_phase_keeps_running() {
        let mut h = harness(EngineOptions::default());
        h.pump(16.7).unwrap();
        assert!(h.engine.phase() > 0.0);

        h.engine.reset();
        assert_eq!(h.engine.phase(), 0.0);
        assert!(h.engine.is_running());

        h.engine.pause();
        h.engine.reset();
        assert_eq!(h.engine.phase(), 0.0);
        assert!(!h.engine.is_running());
    }

    #[test]
    fn test_set_params_speed_only() {
        let mut h = harness(stopped());
        h.take_samples();

        h.engine.set_params(ParamPatch::speed(2.0)).unwrap();
        assert_eq!(h.engine.config().speed, 2.0);
        assert_eq!(h.engine.config().zoom, 1.0);

        let samples = h.take_samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].speed, Some(2.0));
        assert_eq!(samples[0].zoom, None);
    }

    #[test]
    fn test_set_params_ignores_non_finite() {
        let mut h = harness(stopped());
        h.take_samples();
        h.engine.set_params(ParamPatch::speed(f64::NAN)).unwrap();
        h.engine
            .set_params(ParamPatch::zoom(f64::INFINITY))
            .unwrap();
        assert_eq!(h.engine.config().speed, 0.5);
        assert_eq!(h.engine.config().zoom, 1.0);
        assert!(h.take_samples().is_empty());
    }

    #[test]
    fn test_pause_play_pause_without_frame_keeps_phase() {
        let mut h = harness(EngineOptions::default());
        h.pump(16.7).unwrap();
        let phase = h.engine.phase();

        h.clock.borrow_mut().advance(500.0);
        h.engine.pause();
        h.engine.play();
        h.engine.pause();
        assert_eq!(h.engine.phase(), phase);
    }

    #[test]
    fn test_rebase_on_play_skips_paused_time() {
        let mut h = harness(EngineOptions {
            speed: Some(1.0),
            ..EngineOptions::default()
        });
        h.pump(16.0).unwrap();
        let phase = h.engine.phase();

        h.engine.pause();
        // A long stop, then resume and render one 16 ms frame.
        h.clock.borrow_mut().advance(60_000.0);
        h.engine.play();
        h.pump(16.0).unwrap();
        let advanced = h.engine.phase() - phase;
        assert!((advanced - 0.016 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stale_dispatched_frame_is_inert() {
        let mut h = harness(EngineOptions::default());
        h.take_samples();

        // Host pulls the request off its queue, then the engine stops
        // before the callback actually runs.
        let dispatched = h.scheduler.borrow_mut().take_next();
        assert!(dispatched.is_some());
        h.engine.pause();

        h.clock.borrow_mut().advance(16.7);
        let now = h.clock.borrow().now_ms();
        h.engine.frame(now).unwrap();

        assert!(h.take_samples().is_empty());
        assert_eq!(h.engine.phase(), 0.0);
        assert_eq!(h.pending(), 0);
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut h = harness(EngineOptions::default());
        h.engine.destroy();
        assert!(!h.engine.is_running());
        assert!(h.engine.is_destroyed());
        assert_eq!(h.pending(), 0);
        assert_eq!(h.resize.borrow().active_subscriptions(), 0);
        h.take_samples();

        h.engine.play();
        assert!(!h.engine.is_running());
        assert_eq!(h.pending(), 0);

        h.engine.set_params(ParamPatch::speed(3.0)).unwrap();
        assert_eq!(h.engine.config().speed, 0.5);

        h.engine.reset();
        h.engine.pause();
        h.engine.destroy();
        assert!(h.take_samples().is_empty());
    }

    #[test]
    fn test_destroy_unsubscribes_exactly_once() {
        let mut h = harness(stopped());
        assert_eq!(h.resize.borrow().active_subscriptions(), 1);
        h.engine.destroy();
        h.engine.destroy();
        assert_eq!(h.resize.borrow().active_subscriptions(), 0);
    }

    #[test]
    fn test_resize_refits_surface() {
        let mut h = harness(stopped());
        assert_eq!(h.engine.dimensions().logical_width, 640);

        {
            let mut viewport = h.viewport.borrow_mut();
            viewport.width = 1024.0;
            viewport.height = 768.0;
            viewport.dpr = 2.0;
        }
        h.engine.handle_resize();

        let dims = h.engine.dimensions();
        assert_eq!(dims.logical_width, 1024);
        assert_eq!(dims.logical_height, 768);
        assert_eq!(dims.dpr, 2.0);
        assert_eq!(h.surface.borrow().physical_size(), (2048, 1536));
    }

    #[test]
    fn test_resize_after_destroy_is_inert() {
        let mut h = harness(stopped());
        h.engine.destroy();
        h.viewport.borrow_mut().width = 99.0;
        h.engine.handle_resize();
        assert_eq!(h.engine.dimensions().logical_width, 640);
    }

    #[test]
    fn test_observer_failure_halts_loop() {
        let calls = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&calls);
        let observer: StatsObserver = Box::new(move |_| {
            *counter.borrow_mut() += 1;
            Err("observer down".into())
        });
        let mut h = harness_with_observer(stopped(), Some(observer)).unwrap();
        h.engine.play();

        let err = h.pump(16.7).unwrap_err();
        assert!(matches!(err, EngineError::Observer(_)));
        assert_eq!(*calls.borrow(), 1);
        // The failed frame never re-requested itself.
        assert_eq!(h.pending(), 0);
    }

    #[test]
    fn test_observer_failure_at_construction() {
        let observer: StatsObserver = Box::new(|_| Err("observer down".into()));
        let result = harness_with_observer(
            EngineOptions {
                speed: Some(1.0),
                ..EngineOptions::default()
            },
            Some(observer),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_continuous_run_draws_frames() {
        let mut h = harness(EngineOptions::default());
        for _ in 0..10 {
            h.pump(16.7).unwrap();
        }
        let samples = h.take_samples();
        // Two samples per frame, across ten frames.
        assert_eq!(samples.len(), 20);
        assert!(h.engine.phase() > 0.0);
        // Surface holds the near-black background after the last draw.
        assert_eq!(h.surface.borrow().pixel(0, 0), [5, 5, 5, 255]);
    }
}
