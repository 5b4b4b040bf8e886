//! Project configuration

pub mod schema;

pub use schema::{EffectConfig, EffectsConfig, ProjectConfig, RenderConfig, SmoothingConfig};
