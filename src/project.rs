//! Project files
//!
//! A project names the two input images and lists the anchors. It is stored
//! as JSON; image paths may be relative to the project file.

use anyhow::{Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::anchor::Anchor;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image: Option<PathBuf>,

    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project from {:?}", path))?;
        let project: Project = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse project from {:?}", path))?;
        tracing::info!(
            "Loaded project {:?} with {} anchors",
            path,
            project.anchors.len()
        );
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize project")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write project to {:?}", path))?;
        tracing::info!("Saved project to {:?}", path);
        Ok(())
    }

    /// Decode both images, resolving relative paths against `base_dir`
    pub fn load_images(&self, base_dir: &Path) -> Result<(Option<RgbaImage>, Option<RgbaImage>)> {
        let source = load_image(self.source_image.as_deref(), base_dir)?;
        let target = load_image(self.target_image.as_deref(), base_dir)?;
        Ok((source, target))
    }
}

fn load_image(path: Option<&Path>, base_dir: &Path) -> Result<Option<RgbaImage>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    tracing::info!("Loading image from {:?}", path);
    let image = image::open(&path)
        .with_context(|| format!("Failed to load image from {:?}", path))?
        .to_rgba8();
    Ok(Some(image))
}
