//! Configuration types for the swirl animation engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Default phase advance rate when the host supplies none.
fn default_speed() -> f64 {
    0.5
}

/// Default ring radius multiplier when the host supplies none.
fn default_zoom() -> f64 {
    1.0
}

/// Effective animation parameters.
///
/// Both fields are always finite: values arriving through [`EngineOptions`]
/// or [`ParamPatch`] are filtered before they land here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Phase advance rate multiplier.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Ring radius multiplier.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            zoom: default_zoom(),
        }
    }
}

/// Construction options for the engine.
///
/// All fields are optional. Non-numeric `speed`/`zoom` and non-boolean
/// `running` JSON values decay to absent rather than failing
/// deserialization; absent numeric fields fall back to the defaults in
/// [`AnimationConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub zoom: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub running: Option<bool>,
}

impl EngineOptions {
    /// Whether the engine should start rendering at construction.
    /// Anything other than an explicit `false` auto-starts.
    pub fn auto_start(&self) -> bool {
        self.running != Some(false)
    }

    /// The initial parameter overrides carried by these options.
    pub fn patch(&self) -> ParamPatch {
        ParamPatch {
            speed: self.speed,
            zoom: self.zoom,
        }
    }
}

/// Partial parameter update for a live engine.
///
/// Unknown fields (`density`, `zoomAuto`, ...) are accepted and ignored so
/// hosts can send forward-compatible patches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamPatch {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub zoom: Option<f64>,
}

impl ParamPatch {
    pub fn speed(value: f64) -> Self {
        Self {
            speed: Some(value),
            ..Self::default()
        }
    }

    pub fn zoom(value: f64) -> Self {
        Self {
            zoom: Some(value),
            ..Self::default()
        }
    }
}

/// Accept any JSON value, keeping only finite numbers.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

/// Accept any JSON value, keeping only booleans.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}
