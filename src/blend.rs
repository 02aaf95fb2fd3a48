//! Cross-dissolve of the two warped images

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::{MorphError, Result};

/// Blend two equally sized images channel by channel:
/// `out = s + trunc(phase * (t - s))`.
///
/// Phase 0 reproduces `source` and phase 1 reproduces `target` exactly.
/// Phases outside [0, 1] are clamped.
pub fn blend(source: &RgbaImage, target: &RgbaImage, phase: f64, parallel: bool) -> Result<RgbaImage> {
    if source.dimensions() != target.dimensions() {
        return Err(MorphError::DimensionMismatch {
            source_size: source.dimensions(),
            target_size: target.dimensions(),
        });
    }

    let (width, height) = source.dimensions();
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return Ok(out);
    }

    let phase = if phase.is_nan() { 0.0 } else { phase.clamp(0.0, 1.0) };
    let stride = width as usize * 4;

    if parallel {
        out.par_chunks_mut(stride)
            .zip(source.as_raw().par_chunks(stride))
            .zip(target.as_raw().par_chunks(stride))
            .for_each(|((row, s), t)| blend_row(row, s, t, phase));
    } else {
        out.chunks_mut(stride)
            .zip(source.as_raw().chunks(stride))
            .zip(target.as_raw().chunks(stride))
            .for_each(|((row, s), t)| blend_row(row, s, t, phase));
    }

    Ok(out)
}

#[inline]
fn blend_row(out: &mut [u8], source: &[u8], target: &[u8], phase: f64) {
    for ((o, &s), &t) in out.iter_mut().zip(source).zip(target) {
        *o = mix(s, t, phase);
    }
}

#[inline]
fn mix(s: u8, t: u8, phase: f64) -> u8 {
    let diff = t as i32 - s as i32;
    let value = s as i32 + (diff as f64 * phase) as i32;
    value.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn pair() -> (RgbaImage, RgbaImage) {
        let source = RgbaImage::from_fn(7, 5, |x, y| Rgba([(x * 30) as u8, (y * 50) as u8, 200, 255]));
        let target = RgbaImage::from_fn(7, 5, |x, y| Rgba([(y * 40) as u8, 17, (x * 9) as u8, 128]));
        (source, target)
    }

    #[test]
    fn test_boundary_phases() {
        let (source, target) = pair();
        for parallel in [false, true] {
            assert_eq!(blend(&source, &target, 0.0, parallel).unwrap(), source);
            assert_eq!(blend(&source, &target, 1.0, parallel).unwrap(), target);
        }
    }

    #[test]
    fn test_truncating_mix() {
        assert_eq!(mix(0, 255, 0.5), 127);
        assert_eq!(mix(255, 0, 0.5), 128);
        assert_eq!(mix(10, 13, 0.5), 11);
        assert_eq!(mix(13, 10, 0.5), 12);
        assert_eq!(mix(100, 100, 0.3), 100);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (source, target) = pair();
        for phase in [0.1, 0.37, 0.5, 0.9] {
            assert_eq!(
                blend(&source, &target, phase, true).unwrap(),
                blend(&source, &target, phase, false).unwrap()
            );
        }
    }

    #[test]
    fn test_out_of_range_phase_clamped() {
        let (source, target) = pair();
        assert_eq!(blend(&source, &target, -2.0, false).unwrap(), source);
        assert_eq!(blend(&source, &target, 7.5, true).unwrap(), target);
    }

    #[test]
    fn test_dimension_mismatch() {
        let source = RgbaImage::new(4, 4);
        let target = RgbaImage::new(4, 5);
        assert_eq!(
            blend(&source, &target, 0.5, false),
            Err(MorphError::DimensionMismatch {
                source_size: (4, 4),
                target_size: (4, 5)
            })
        );
    }
}
