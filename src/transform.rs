//! Triangle-to-triangle affine transformation
//!
//! Each mesh triangle gets its own affine map from its reference shape
//! (phase 0 for the source image, phase 1 for the target image) to its shape
//! at the current phase. Three vertex correspondences fix the six unknowns.

use nalgebra::Matrix3;

use crate::anchor::{Anchor, Point};
use crate::error::{MorphError, Result};
use crate::mesh::Side;

/// Below this doubled area a triangle cannot be inverted reliably
const MIN_DOUBLED_AREA: f64 = 1e-10;

/// Which image a transform warps towards the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Phase-0 frame to current-phase frame
    SourceToPhase,
    /// Phase-1 frame to current-phase frame
    TargetToPhase,
}

impl Direction {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Source => Direction::SourceToPhase,
            Side::Target => Direction::TargetToPhase,
        }
    }

    pub fn reference_phase(&self) -> f64 {
        match self {
            Direction::SourceToPhase => 0.0,
            Direction::TargetToPhase => 1.0,
        }
    }
}

/// 2D affine map stored as the top two rows of a 3x3 matrix, row-major:
/// `x' = m[0]*x + m[1]*y + m[2]`, `y' = m[3]*x + m[4]*y + m[5]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: [f64; 6],
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    /// Solve for the affine map sending `from[i]` to `to[i]` for i in 0..3.
    ///
    /// Coinciding triangles give the exact identity. A degenerate `from`
    /// triangle has no solution.
    pub fn between(from: &[Point; 3], to: &[Point; 3]) -> Result<Self> {
        if from == to {
            return Ok(Self::identity());
        }

        let [a, b, c] = from;
        let doubled_area = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
        if doubled_area.abs() < MIN_DOUBLED_AREA {
            return Err(MorphError::DegenerateTriangle);
        }

        // Columns are homogeneous vertices: M * src = dst  =>  M = dst * src^-1
        let src = homogeneous(from);
        let dst = homogeneous(to);
        let inverse = src.try_inverse().ok_or(MorphError::DegenerateTriangle)?;
        let m = dst * inverse;

        Ok(Self {
            matrix: [m[(0, 0)], m[(0, 1)], m[(0, 2)], m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        })
    }

    /// Map from a triangle's reference frame to its frame at `phase`
    pub fn for_anchors(anchors: [&Anchor; 3], direction: Direction, phase: f64) -> Result<Self> {
        let reference = direction.reference_phase();
        let from = anchors.map(|a| a.position(reference));
        let to = anchors.map(|a| a.position(phase));
        Self::between(&from, &to)
    }

    /// Transform a point
    #[inline]
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.matrix;
        (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let (x, y) = self.transform_point(p.x, p.y);
        Point::new(x, y)
    }
}

fn homogeneous(points: &[Point; 3]) -> Matrix3<f64> {
    let [a, b, c] = points;
    Matrix3::new(
        a.x, b.x, c.x, //
        a.y, b.y, c.y, //
        1.0, 1.0, 1.0,
    )
}
