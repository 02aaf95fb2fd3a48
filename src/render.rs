//! Frame output helpers for the command-line front end

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::{Path, PathBuf};

use crate::mesh::Segment;

/// Draw triangle edges on top of `image`
pub fn draw_edges(image: &mut RgbaImage, edges: &[Segment], color: [u8; 4]) {
    for edge in edges {
        draw_line_segment_mut(
            image,
            (edge.from.x as f32, edge.from.y as f32),
            (edge.to.x as f32, edge.to.y as f32),
            Rgba(color),
        );
    }
}

/// Phases for an `n`-step sequence: 0, 1/n, ..., 1
pub fn frame_phases(frames: u32) -> Vec<f64> {
    if frames == 0 {
        return vec![0.0];
    }
    (0..=frames).map(|i| i as f64 / frames as f64).collect()
}

/// `out.png` -> `out_007.png`
pub fn frame_path(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{}_{:03}.{}", stem, index, ext))
}
