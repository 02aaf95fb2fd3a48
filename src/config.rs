//! Configuration management for TriMorph

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MorphError;

/// Warp sampling quality
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// One sample per pixel
    #[default]
    Low,
    /// Four samples per pixel
    Medium,
    /// Sixteen samples per pixel
    High,
}

impl Quality {
    /// Sampling stride in pixels
    pub fn delta(&self) -> f64 {
        match self {
            Quality::Low => 1.0,
            Quality::Medium => 0.5,
            Quality::High => 0.25,
        }
    }

    /// Map a slider position (0, 1, 2) to a quality level
    pub fn from_index(index: usize) -> Result<Self, MorphError> {
        match index {
            0 => Ok(Quality::Low),
            1 => Ok(Quality::Medium),
            2 => Ok(Quality::High),
            _ => Err(MorphError::InvalidQuality(index)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

/// How triangles are tied back to the anchors they were built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMatching {
    /// Use the anchor indices the triangulator hands back with each triangle
    #[default]
    Tagged,
    /// Re-match triangle vertices against anchor positions within an epsilon
    Proximity,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub quality: Quality,

    #[serde(default)]
    pub anchor_matching: AnchorMatching,

    /// Maximum per-axis distance for proximity matching
    #[serde(default = "default_match_epsilon")]
    pub match_epsilon: f64,

    /// Blend output rows on the rayon pool
    #[serde(default = "default_parallel_blend")]
    pub parallel_blend: bool,

    /// Phase a freshly loaded project is shown at
    #[serde(default = "default_initial_phase")]
    pub initial_phase: f64,
}

fn default_match_epsilon() -> f64 {
    0.01
}

fn default_parallel_blend() -> bool {
    true
}

fn default_initial_phase() -> f64 {
    0.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            anchor_matching: AnchorMatching::default(),
            match_epsilon: default_match_epsilon(),
            parallel_blend: default_parallel_blend(),
            initial_phase: default_initial_phase(),
        }
    }
}

/// Output rendering settings for the command-line front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Draw the current triangle edges onto written frames
    #[serde(default)]
    pub overlay: bool,

    /// RGBA color of overlay edges
    #[serde(default = "default_overlay_color")]
    pub overlay_color: [u8; 4],

    /// Number of phase steps for sequence rendering (0 = single frame)
    #[serde(default)]
    pub frames: u32,
}

fn default_overlay_color() -> [u8; 4] {
    [255, 0, 0, 255]
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overlay: false,
            overlay_color: default_overlay_color(),
            frames: 0,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a file, or create default if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_delta() {
        assert_eq!(Quality::Low.delta(), 1.0);
        assert_eq!(Quality::Medium.delta(), 0.5);
        assert_eq!(Quality::High.delta(), 0.25);
    }

    #[test]
    fn test_quality_from_index() {
        assert_eq!(Quality::from_index(0), Ok(Quality::Low));
        assert_eq!(Quality::from_index(2), Ok(Quality::High));
        assert_eq!(Quality::from_index(3), Err(MorphError::InvalidQuality(3)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.quality, Quality::Low);
        assert_eq!(config.engine.anchor_matching, AnchorMatching::Tagged);
        assert_eq!(config.engine.match_epsilon, 0.01);
        assert_eq!(config.engine.initial_phase, 0.5);
        assert!(!config.render.overlay);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            quality = "high"
            anchor_matching = "proximity"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.quality, Quality::High);
        assert_eq!(config.engine.anchor_matching, AnchorMatching::Proximity);
        assert!(config.engine.parallel_blend);
        assert_eq!(config.render.overlay_color, [255, 0, 0, 255]);
    }

    #[test]
    fn test_load_or_create_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let mut changed = created.clone();
        changed.engine.quality = Quality::Medium;
        changed.render.frames = 12;
        changed.save(&path).unwrap();

        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(loaded.engine.quality, Quality::Medium);
        assert_eq!(loaded.render.frames, 12);
    }
}
