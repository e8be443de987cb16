//! Engine module - surface mapping, time integration, rendering and the
//! lifecycle state machine.

mod host;
mod lifecycle;
mod render;
mod stats;
mod surface;
mod time;

pub use host::*;
pub use lifecycle::*;
pub use render::*;
pub use stats::*;
pub use surface::*;
pub use time::*;
