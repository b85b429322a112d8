use std::time::Duration;

use kestrel_core::DEFAULT_MAX_CASCADE_DEPTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid loop config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("target_fps must be at least 1")]
    ZeroFrameRate,
}

/// Game loop settings. Missing fields take their defaults.
///
/// ```rust
/// use kestrel_runtime::LoopConfig;
///
/// let config = LoopConfig::from_json_str(r#"{ "target_fps": 30 }"#).unwrap();
/// assert_eq!(config.target_fps, 30);
/// assert_eq!(config.max_frames, None);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub target_fps: u32,
    /// Stop after this many frames. `None` runs until stopped.
    pub max_frames: Option<u64>,
    /// Nesting limit for state notification cascades.
    pub max_cascade_depth: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: None,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }
}

impl LoopConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: LoopConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(())
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }
}
