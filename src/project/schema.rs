//! Project configuration schema
//!
//! Serialized as camelCase JSON so a project file can be shared with other
//! tooling. Every section has sensible defaults and a `validate()` that
//! rejects out-of-range values before any processing starts.

use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::timeline::EffectKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest zoom factor, follow scale or blur radius that still changes the frame
const MIN_PEAK_PARAMETER: f64 = 1.0;

/// Cursor path smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmoothingConfig {
    /// Catmull-Rom knot exponent: 0 uniform, 0.5 centripetal, 1 chordal
    pub alpha: f64,
    /// 0.0 = slow, floaty tracking; 1.0 = snappy tracking
    pub responsiveness: f64,
    /// 0.0 = slight overshoot allowed; 1.0 = heavily damped, no overshoot
    pub smoothness: f64,
    /// Output frames per second
    pub frame_rate: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            responsiveness: 0.5,
            smoothness: 0.7,
            frame_rate: 60.0,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> ProcessingResult<()> {
        check_unit("alpha", self.alpha)?;
        check_unit("responsiveness", self.responsiveness)?;
        check_unit("smoothness", self.smoothness)?;
        check_frame_rate(self.frame_rate)
    }
}

/// Timing and strength of one effect kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectConfig {
    pub enabled: bool,
    /// Seconds the window opens before each click
    pub pre_roll_seconds: f64,
    /// Seconds the window stays open after each click
    pub post_roll_seconds: f64,
    /// Zoom factor, follow scale, or blur radius depending on the effect
    pub peak_parameter: f64,
    /// Cursor speed (px/s) above which movement also opens a window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_threshold: Option<f64>,
}

impl EffectConfig {
    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Follow => Self {
                enabled: true,
                pre_roll_seconds: 1.0,
                post_roll_seconds: 1.0,
                peak_parameter: 2.0,
                movement_threshold: None,
            },
            EffectKind::Zoom => Self {
                enabled: true,
                pre_roll_seconds: 1.0,
                post_roll_seconds: 2.0,
                peak_parameter: 1.5,
                movement_threshold: None,
            },
            EffectKind::Blur => Self {
                enabled: true,
                pre_roll_seconds: 1.0,
                post_roll_seconds: 2.0,
                peak_parameter: 5.0,
                movement_threshold: Some(2000.0),
            },
        }
    }

    /// Disabled copy of the defaults for `kind`
    pub fn disabled(kind: EffectKind) -> Self {
        Self {
            enabled: false,
            ..Self::default_for(kind)
        }
    }

    pub fn validate(&self, kind: EffectKind) -> ProcessingResult<()> {
        if !self.pre_roll_seconds.is_finite() || self.pre_roll_seconds < 0.0 {
            return Err(ProcessingError::invalid_config(format!(
                "{kind} preRollSeconds must be a non-negative number, got {}",
                self.pre_roll_seconds
            )));
        }
        if !self.post_roll_seconds.is_finite() || self.post_roll_seconds < 0.0 {
            return Err(ProcessingError::invalid_config(format!(
                "{kind} postRollSeconds must be a non-negative number, got {}",
                self.post_roll_seconds
            )));
        }

        if !self.peak_parameter.is_finite() || self.peak_parameter < MIN_PEAK_PARAMETER {
            return Err(ProcessingError::invalid_config(format!(
                "{kind} peakParameter must be at least {MIN_PEAK_PARAMETER}, got {}",
                self.peak_parameter
            )));
        }

        if let Some(threshold) = self.movement_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ProcessingError::invalid_config(format!(
                    "{kind} movementThreshold must be positive, got {threshold}"
                )));
            }
        }

        Ok(())
    }
}

/// Per-effect configuration, one entry per stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectsConfig {
    pub follow: EffectConfig,
    pub zoom: EffectConfig,
    pub blur: EffectConfig,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            follow: EffectConfig::default_for(EffectKind::Follow),
            zoom: EffectConfig::default_for(EffectKind::Zoom),
            blur: EffectConfig::default_for(EffectKind::Blur),
        }
    }
}

impl EffectsConfig {
    /// All three effects disabled
    pub fn none() -> Self {
        Self {
            follow: EffectConfig::disabled(EffectKind::Follow),
            zoom: EffectConfig::disabled(EffectKind::Zoom),
            blur: EffectConfig::disabled(EffectKind::Blur),
        }
    }

    pub fn get(&self, kind: EffectKind) -> &EffectConfig {
        match kind {
            EffectKind::Follow => &self.follow,
            EffectKind::Zoom => &self.zoom,
            EffectKind::Blur => &self.blur,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut EffectConfig {
        match kind {
            EffectKind::Follow => &mut self.follow,
            EffectKind::Zoom => &mut self.zoom,
            EffectKind::Blur => &mut self.blur,
        }
    }

    pub fn validate(&self) -> ProcessingResult<()> {
        for kind in EffectKind::PIPELINE_ORDER {
            self.get(kind).validate(kind)?;
        }
        Ok(())
    }
}

/// Encoder settings for re-encoded windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Explicit ffmpeg binary; looked up on PATH when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary; looked up on PATH when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    /// x264 preset for rendered windows
    pub preset: String,
    /// x264 constant rate factor for rendered windows
    pub crf: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            preset: "fast".to_string(),
            crf: 18,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.crf > 51 {
            return Err(ProcessingError::invalid_config(format!(
                "crf must be within 0..=51, got {}",
                self.crf
            )));
        }
        if self.preset.trim().is_empty() {
            return Err(ProcessingError::invalid_config("preset must not be empty"));
        }
        Ok(())
    }
}

/// Complete project configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub smoothing: SmoothingConfig,
    pub effects: EffectsConfig,
    pub render: RenderConfig,
}

impl ProjectConfig {
    /// Load and validate a project configuration from a JSON file
    pub fn load(path: &Path) -> ProcessingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProjectConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded project config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ProcessingResult<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> ProcessingResult<()> {
        self.smoothing.validate()?;
        self.effects.validate()?;
        self.render.validate()
    }
}

fn check_unit(name: &str, value: f64) -> ProcessingResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ProcessingError::invalid_config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

pub(crate) fn check_frame_rate(frame_rate: f64) -> ProcessingResult<()> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(())
    } else {
        Err(ProcessingError::invalid_config(format!(
            "frameRate must be a positive number, got {frame_rate}"
        )))
    }
}
