//! Source/target triangle meshes
//!
//! The source mesh comes from triangulating the anchors' source positions.
//! The target mesh reuses the same connectivity: triangle `i` of the target
//! list is built from the same three anchors as source triangle `i`,
//! evaluated at their target positions. Nothing is re-triangulated.

use serde::Serialize;
use tracing::{debug, warn};

use crate::anchor::{Anchor, Point};
use crate::cache::MorphCache;
use crate::error::MorphError;
use crate::resolve::Resolver;
use crate::triangulate::Triangulator;

/// Ordinal identity of a triangle, shared by source triangle `i` and target triangle `i`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TriangleId(pub usize);

/// Which image (and which reference phase) a mesh side belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Triangles at phase 0
    Source,
    /// Triangles at phase 1
    Target,
}

impl Side {
    pub fn reference_phase(&self) -> f64 {
        match self {
            Side::Source => 0.0,
            Side::Target => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub id: TriangleId,
    pub vertices: [Point; 3],
    /// Indices into the anchor list, when the triangulator supplied them
    pub tags: Option<[usize; 3]>,
}

impl Triangle {
    pub fn new(id: TriangleId, vertices: [Point; 3]) -> Self {
        Self {
            id,
            vertices,
            tags: None,
        }
    }

    /// Twice the signed area; zero for collinear vertices
    pub fn doubled_area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }

    pub fn is_degenerate(&self) -> bool {
        self.doubled_area().abs() < f64::EPSILON
    }

    pub fn centroid(&self) -> Point {
        let [a, b, c] = self.vertices;
        Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    /// A zero-area stand-in that keeps the source and target lists parallel
    fn placeholder(id: TriangleId, at: Point) -> Self {
        Self::new(id, [at; 3])
    }
}

/// Parallel source and target triangle lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub source: Vec<Triangle>,
    pub target: Vec<Triangle>,
}

impl Mesh {
    pub fn triangles(&self, side: Side) -> &[Triangle] {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Build both sides of the mesh for the current anchor set
    pub fn build(
        anchors: &[Anchor],
        triangulator: &dyn Triangulator,
        resolver: &Resolver,
        cache: &mut MorphCache,
    ) -> Self {
        let source = build_source_mesh(anchors, triangulator);
        let target = build_target_mesh(&source, anchors, resolver, cache);
        Self { source, target }
    }
}

/// A line segment for overlay rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// Triangulate the anchors' source positions.
///
/// Fails soft: fewer than three anchors, or a triangulation failure, yields
/// an empty mesh so both warps degrade to pass-through.
pub fn build_source_mesh(anchors: &[Anchor], triangulator: &dyn Triangulator) -> Vec<Triangle> {
    if anchors.len() < 3 {
        debug!("{}", MorphError::InsufficientAnchors(anchors.len()));
        return Vec::new();
    }

    let points: Vec<Point> = anchors.iter().map(|a| a.position(0.0)).collect();
    let indices = match triangulator.triangulate(&points) {
        Ok(indices) => indices,
        Err(e) => {
            warn!("Falling back to an empty mesh: {}", e);
            return Vec::new();
        }
    };
    if let Some(&bad) = indices.iter().flatten().find(|&&i| i >= points.len()) {
        let e = MorphError::GeometryFailure(format!(
            "vertex index {} out of range for {} points",
            bad,
            points.len()
        ));
        warn!("Falling back to an empty mesh: {}", e);
        return Vec::new();
    }

    indices
        .into_iter()
        .enumerate()
        .map(|(i, [a, b, c])| Triangle {
            id: TriangleId(i),
            vertices: [points[a], points[b], points[c]],
            tags: Some([a, b, c]),
        })
        .collect()
}

/// Build the target-side triangle for every source triangle.
///
/// Source triangles whose anchors cannot be resolved get a zero-area
/// placeholder, so the lists stay the same length and the placeholder is
/// never located.
pub fn build_target_mesh(
    source: &[Triangle],
    anchors: &[Anchor],
    resolver: &Resolver,
    cache: &mut MorphCache,
) -> Vec<Triangle> {
    source
        .iter()
        .map(|triangle| {
            match cache.anchors_for(triangle, Side::Source, anchors, resolver) {
                Some(indices) => Triangle {
                    id: triangle.id,
                    vertices: indices.map(|i| anchors[i].position(1.0)),
                    tags: Some(indices),
                },
                None => Triangle::placeholder(triangle.id, triangle.vertices[0]),
            }
        })
        .collect()
}

/// Edges of every resolvable source triangle, with vertices placed at `phase`
pub fn edges_at(
    mesh: &Mesh,
    anchors: &[Anchor],
    phase: f64,
    resolver: &Resolver,
    cache: &mut MorphCache,
) -> Vec<Segment> {
    let mut edges = Vec::with_capacity(mesh.len() * 3);
    for triangle in &mesh.source {
        let Some(indices) = cache.anchors_for(triangle, Side::Source, anchors, resolver) else {
            continue;
        };
        let [a, b, c] = indices.map(|i| anchors[i].position(phase));
        edges.push(Segment { from: a, to: b });
        edges.push(Segment { from: b, to: c });
        edges.push(Segment { from: c, to: a });
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorId;
    use crate::config::AnchorMatching;
    use crate::triangulate::DelaunayTriangulator;

    fn anchors(pairs: &[((f64, f64), (f64, f64))]) -> Vec<Anchor> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &((sx, sy), (tx, ty)))| {
                Anchor::new(AnchorId(i), Point::new(sx, sy), Point::new(tx, ty)).unwrap()
            })
            .collect()
    }

    fn scenario_anchors() -> Vec<Anchor> {
        anchors(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((10.0, 0.0), (20.0, 0.0)),
            ((0.0, 10.0), (0.0, 20.0)),
        ])
    }

    #[test]
    fn test_fewer_than_three_anchors_empty() {
        let a = anchors(&[((0.0, 0.0), (1.0, 1.0)), ((5.0, 5.0), (6.0, 6.0))]);
        assert!(build_source_mesh(&a, &DelaunayTriangulator).is_empty());
        assert!(build_source_mesh(&[], &DelaunayTriangulator).is_empty());
    }

    #[test]
    fn test_collinear_anchors_empty() {
        let a = anchors(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 0.0), (1.0, 0.0)),
            ((2.0, 0.0), (2.0, 0.0)),
        ]);
        assert!(build_source_mesh(&a, &DelaunayTriangulator).is_empty());
    }

    struct OutOfRangeTriangulator;

    impl Triangulator for OutOfRangeTriangulator {
        fn triangulate(&self, _points: &[Point]) -> crate::error::Result<Vec<[usize; 3]>> {
            Ok(vec![[0, 1, 2], [0, 2, 7]])
        }
    }

    #[test]
    fn test_out_of_range_vertex_index_empty() {
        let a = scenario_anchors();
        assert!(build_source_mesh(&a, &OutOfRangeTriangulator).is_empty());

        let mut cache = MorphCache::new();
        let resolver = Resolver::new(AnchorMatching::Tagged, 0.01);
        let mesh = Mesh::build(&a, &OutOfRangeTriangulator, &resolver, &mut cache);
        assert!(mesh.is_empty());
        assert!(mesh.target.is_empty());
    }

    #[test]
    fn test_parallel_lists() {
        let a = anchors(&[
            ((0.0, 0.0), (1.0, 1.0)),
            ((10.0, 0.0), (12.0, 0.0)),
            ((10.0, 10.0), (9.0, 11.0)),
            ((0.0, 10.0), (0.0, 9.0)),
            ((5.0, 4.0), (6.0, 5.0)),
        ]);
        for matching in [AnchorMatching::Tagged, AnchorMatching::Proximity] {
            let mut cache = MorphCache::new();
            let resolver = Resolver::new(matching, 0.01);
            let mesh = Mesh::build(&a, &DelaunayTriangulator, &resolver, &mut cache);
            assert!(!mesh.is_empty());
            assert_eq!(mesh.source.len(), mesh.target.len());
            for (s, t) in mesh.source.iter().zip(&mesh.target) {
                assert_eq!(s.id, t.id);
            }
        }
    }

    #[test]
    fn test_target_triangle_uses_target_positions() {
        let a = scenario_anchors();
        let mut cache = MorphCache::new();
        let resolver = Resolver::new(AnchorMatching::Tagged, 0.01);
        let mesh = Mesh::build(&a, &DelaunayTriangulator, &resolver, &mut cache);
        assert_eq!(mesh.len(), 1);

        let source = &mesh.source[0];
        let target = &mesh.target[0];
        for (s, t) in source.vertices.iter().zip(&target.vertices) {
            // Every anchor in this scenario doubles its source position
            assert_eq!(t.x, s.x * 2.0);
            assert_eq!(t.y, s.y * 2.0);
        }
    }

    #[test]
    fn test_edges_at_midpoint() {
        let a = scenario_anchors();
        let mut cache = MorphCache::new();
        let resolver = Resolver::new(AnchorMatching::Tagged, 0.01);
        let mesh = Mesh::build(&a, &DelaunayTriangulator, &resolver, &mut cache);

        let edges = edges_at(&mesh, &a, 0.5, &resolver, &mut cache);
        assert_eq!(edges.len(), 3);

        let mut vertices: Vec<(f64, f64)> = edges.iter().map(|e| (e.from.x, e.from.y)).collect();
        vertices.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(vertices, vec![(0.0, 0.0), (0.0, 15.0), (15.0, 0.0)]);
    }

    #[test]
    fn test_unresolved_triangle_gets_placeholder() {
        // Two anchors share a source position, so proximity matching finds
        // four anchors for the triangle touching it
        let a = anchors(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((10.0, 0.0), (10.0, 0.0)),
            ((0.0, 10.0), (0.0, 10.0)),
            ((0.0, 10.0), (3.0, 12.0)),
        ]);
        let mut cache = MorphCache::new();
        let resolver = Resolver::new(AnchorMatching::Proximity, 0.01);
        let mesh = Mesh::build(&a, &DelaunayTriangulator, &resolver, &mut cache);

        assert_eq!(mesh.source.len(), mesh.target.len());
        assert!(mesh.target.iter().all(|t| t.is_degenerate()));
        assert!(edges_at(&mesh, &a, 0.5, &resolver, &mut cache).is_empty());
    }

    #[test]
    fn test_centroid_and_area() {
        let t = Triangle::new(
            TriangleId(0),
            [Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 3.0)],
        );
        assert_eq!(t.centroid(), Point::new(1.0, 1.0));
        assert_eq!(t.doubled_area(), 9.0);
        assert!(!t.is_degenerate());
    }
}
