//! Triangulation primitive
//!
//! The engine only needs "points in, triangles out". Triangles are returned
//! as index triples into the input slice so the caller can carry the identity
//! of each point (its anchor) through without re-deriving it by distance.

use crate::anchor::Point;
use crate::error::{MorphError, Result};

/// Capability interface over whatever triangulation algorithm is plugged in
pub trait Triangulator {
    /// Triangulate `points`, returning triangles as indices into `points`.
    ///
    /// Implementations report degenerate configurations (non-finite or all
    /// collinear points) as [`MorphError::GeometryFailure`].
    fn triangulate(&self, points: &[Point]) -> Result<Vec<[usize; 3]>>;
}

/// Delaunay triangulation backed by the `delaunator` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[Point]) -> Result<Vec<[usize; 3]>> {
        if points.len() < 3 {
            return Err(MorphError::InsufficientAnchors(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(MorphError::GeometryFailure(format!(
                "point {} has non-finite coordinates",
                i
            )));
        }

        let delaunator_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();

        let triangulation = delaunator::triangulate(&delaunator_points);

        // Collinear or fully coincident input yields no triangles at all
        if triangulation.triangles.is_empty() {
            return Err(MorphError::GeometryFailure(format!(
                "{} points are collinear or coincident",
                points.len()
            )));
        }

        Ok(triangulation
            .triangles
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect())
    }
}
