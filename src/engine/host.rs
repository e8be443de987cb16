//! Host collaborator seams.
//!
//! The engine never touches a global window, timer, or event loop. Instead
//! the host injects a [`Clock`], a [`FrameScheduler`], a [`Viewport`] and a
//! [`ResizeSource`] at construction. The manual implementations below drive
//! the engine deterministically in tests and in the headless demo binary.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Handle for one outstanding frame request.
pub type FrameRequestId = u64;

/// Handle for one resize-notification subscription.
pub type SubscriptionId = u64;

/// Monotonic timestamp source, in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Display-refresh-driven callback queue.
///
/// The engine calls [`request_frame`](FrameScheduler::request_frame) to ask
/// for one invocation of [`SwirlEngine::frame`](crate::SwirlEngine::frame)
/// before the next repaint, and [`cancel_frame`](FrameScheduler::cancel_frame)
/// to withdraw a request that has not been dispatched yet. The host owns the
/// actual dispatch.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Current environment reading: logical viewport size and pixel density.
pub trait Viewport {
    /// Logical viewport size in CSS-pixel-like units.
    fn size(&self) -> (f64, f64);
    /// Physical-to-logical pixel ratio of the display.
    fn device_pixel_ratio(&self) -> f64;
}

/// Resize notification channel.
///
/// The engine subscribes once at construction and unsubscribes on destroy;
/// the host routes each notification by calling
/// [`SwirlEngine::handle_resize`](crate::SwirlEngine::handle_resize).
pub trait ResizeSource {
    fn subscribe(&mut self) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

// Shared-handle forwarding impls. The engine owns boxed collaborators; tests
// and the demo binary keep an `Rc<RefCell<..>>` twin to inspect or drive the
// same object from outside.
impl<T: Clock> Clock for Rc<RefCell<T>> {
    fn now_ms(&self) -> f64 {
        self.borrow().now_ms()
    }
}

impl<T: FrameScheduler> FrameScheduler for Rc<RefCell<T>> {
    fn request_frame(&mut self) -> FrameRequestId {
        self.borrow_mut().request_frame()
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.borrow_mut().cancel_frame(id)
    }
}

impl<T: Viewport> Viewport for Rc<RefCell<T>> {
    fn size(&self) -> (f64, f64) {
        self.borrow().size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.borrow().device_pixel_ratio()
    }
}

impl<T: ResizeSource> ResizeSource for Rc<RefCell<T>> {
    fn subscribe(&mut self) -> SubscriptionId {
        self.borrow_mut().subscribe()
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.borrow_mut().unsubscribe(id)
    }
}

/// The full set of injected collaborators.
pub struct HostEnv {
    pub clock: Box<dyn Clock>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub viewport: Box<dyn Viewport>,
    pub resize: Box<dyn ResizeSource>,
}

/// Wall clock anchored at process-local epoch.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now_ms: f64,
}

impl ManualClock {
    pub fn new(now_ms: f64) -> Self {
        Self { now_ms }
    }

    pub fn set(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    pub fn advance(&mut self, delta_ms: f64) {
        self.now_ms += delta_ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

/// Hand-driven scheduler that queues requests until the host pumps them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: FrameRequestId,
    pending: Vec<FrameRequestId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that have not been dispatched or cancelled.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch the oldest pending request, if any.
    pub fn take_next(&mut self) -> Option<FrameRequestId> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.pending.retain(|&pending| pending != id);
    }
}

/// Viewport with a fixed size and density.
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl FixedViewport {
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        Self { width, height, dpr }
    }
}

impl Viewport for FixedViewport {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }
}

/// Resize source that records active subscriptions.
#[derive(Debug, Default)]
pub struct ManualResizeSource {
    next_id: SubscriptionId,
    active: Vec<SubscriptionId>,
}

impl ManualResizeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.len()
    }
}

impl ResizeSource for ManualResizeSource {
    fn subscribe(&mut self) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(id);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.active.retain(|&active| active != id);
    }
}
