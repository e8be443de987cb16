//! Schema module - Configuration types for the swirl engine.

mod config;

pub use config::*;
