//! Point location within a mesh side

use crate::anchor::Point;
use crate::mesh::{Mesh, Side, Triangle};

/// Inclusive point-in-triangle test, independent of winding.
///
/// Zero-area triangles contain nothing.
#[inline]
pub fn contains(triangle: &Triangle, p: Point) -> bool {
    if triangle.is_degenerate() {
        return false;
    }
    let [a, b, c] = triangle.vertices;
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[inline]
fn cross(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// First triangle on `side` containing (x, y), by linear scan
pub fn locate(mesh: &Mesh, side: Side, x: f64, y: f64) -> Option<&Triangle> {
    let p = Point::new(x, y);
    mesh.triangles(side).iter().find(|t| contains(t, p))
}
