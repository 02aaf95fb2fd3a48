//! Forward ("push") warping
//!
//! Every sample of the input image is carried through the affine map of the
//! triangle it falls in and written at the resulting position. Destination
//! pixels that no sample lands on keep the transparent-black initial value,
//! so the output can have holes. Denser sampling (higher quality) makes holes
//! rarer but does not remove them.

use image::RgbaImage;

use crate::anchor::Anchor;
use crate::cache::MorphCache;
use crate::config::Quality;
use crate::locate::locate;
use crate::mesh::{Mesh, Side};
use crate::resolve::Resolver;
use crate::transform::Direction;

/// Positions closer than this to an integer are treated as that integer
/// before truncation, so affine round-off does not shift whole pixels.
const SNAP_EPSILON: f64 = 1e-9;

/// Mesh and anchor state shared by both warps of one recompute
pub struct WarpContext<'a> {
    pub mesh: &'a Mesh,
    pub anchors: &'a [Anchor],
    pub resolver: &'a Resolver,
}

/// Warp `image`, which belongs to `side`, to its shape at `phase`
pub fn warp(
    image: &RgbaImage,
    side: Side,
    phase: f64,
    quality: Quality,
    ctx: &WarpContext<'_>,
    cache: &mut MorphCache,
) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let delta = quality.delta();
    let steps_x = (width as f64 / delta).ceil() as u32;
    let steps_y = (height as f64 / delta).ceil() as u32;
    let direction = Direction::for_side(side);

    for ix in 0..steps_x {
        let x = ix as f64 * delta;
        for iy in 0..steps_y {
            let y = iy as f64 * delta;

            let (dest_x, dest_y) = match locate(ctx.mesh, side, x, y) {
                Some(triangle) => {
                    let transform = cache
                        .anchors_for(triangle, side, ctx.anchors, ctx.resolver)
                        .and_then(|[a, b, c]| {
                            let refs = [&ctx.anchors[a], &ctx.anchors[b], &ctx.anchors[c]];
                            cache.transform_for(triangle.id, phase, direction, refs)
                        });
                    match transform {
                        Some(t) => t.transform_point(x, y),
                        None => (x, y),
                    }
                }
                None => (x, y),
            };

            let pixel = *image.get_pixel(x as u32, y as u32);
            out.put_pixel(
                to_pixel(dest_x, x, width),
                to_pixel(dest_y, y, height),
                pixel,
            );
        }
    }

    out
}

/// Truncate a destination coordinate to a pixel index inside [0, len - 1].
/// Non-finite coordinates fall back to the sample coordinate.
#[inline]
fn to_pixel(value: f64, sample: f64, len: u32) -> u32 {
    let value = if value.is_finite() { value } else { sample };
    let rounded = value.round();
    let value = if (value - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        value
    };
    value.trunc().clamp(0.0, (len - 1) as f64) as u32
}
