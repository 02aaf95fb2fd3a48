//! Morph cache
//!
//! Holds everything that depends on the anchor set, the input images and the
//! quality level: the mesh, resolved anchors per triangle, directional
//! affine transforms per (triangle, phase), and complete results per phase.
//! Phases are matched by exact value. Any change to the inputs clears the
//! whole cache through [`MorphCache::invalidate_all`].

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::anchor::Anchor;
use crate::mesh::{Mesh, Segment, Side, Triangle, TriangleId};
use crate::resolve::Resolver;
use crate::transform::{AffineTransform, Direction};

/// Exact-match key for a phase value. `-0.0` and `0.0` share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseKey(u64);

impl PhaseKey {
    pub fn new(phase: f64) -> Self {
        Self((phase + 0.0).to_bits())
    }
}

/// Everything computed for one phase
#[derive(Debug, Clone, Default)]
pub struct PhaseResult {
    pub phase: f64,
    pub source_warped: Option<RgbaImage>,
    pub target_warped: Option<RgbaImage>,
    pub output: Option<RgbaImage>,
    /// Triangle edges at phase 0
    pub source_edges: Vec<Segment>,
    /// Triangle edges at phase 1
    pub target_edges: Vec<Segment>,
    /// Triangle edges at `phase`
    pub current_edges: Vec<Segment>,
}

/// Cumulative counters, kept across invalidations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub meshes_built: u64,
    pub transforms_built: u64,
    pub anchor_resolutions: u64,
    pub invalidations: u64,
}

#[derive(Debug, Default)]
pub struct MorphCache {
    results: HashMap<PhaseKey, Arc<PhaseResult>>,
    transforms: HashMap<(TriangleId, PhaseKey, Direction), Option<AffineTransform>>,
    anchors: HashMap<(TriangleId, Side), Option<[usize; 3]>>,
    mesh: Option<Arc<Mesh>>,
    stats: CacheStats,
}

impl MorphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the full result for `phase`, counting the hit or miss
    pub fn result(&mut self, phase: f64) -> Option<Arc<PhaseResult>> {
        match self.results.get(&PhaseKey::new(phase)) {
            Some(result) => {
                self.stats.hits += 1;
                debug!("Cache hit for phase {}", phase);
                Some(result.clone())
            }
            None => {
                self.stats.misses += 1;
                debug!("Cache miss for phase {}", phase);
                None
            }
        }
    }

    pub fn store_result(&mut self, result: Arc<PhaseResult>) {
        self.results.insert(PhaseKey::new(result.phase), result);
    }

    pub fn contains_result(&self, phase: f64) -> bool {
        self.results.contains_key(&PhaseKey::new(phase))
    }

    /// The current mesh, building it with `build` if none is cached
    pub fn mesh_or_build(&mut self, build: impl FnOnce(&mut Self) -> Mesh) -> Arc<Mesh> {
        if let Some(mesh) = &self.mesh {
            return mesh.clone();
        }
        let mesh = Arc::new(build(self));
        self.stats.meshes_built += 1;
        self.mesh = Some(mesh.clone());
        mesh
    }

    /// Resolved anchor indices of `triangle`, or `None` if resolution failed.
    ///
    /// Failures are logged once, when first resolved.
    pub fn anchors_for(
        &mut self,
        triangle: &Triangle,
        side: Side,
        anchors: &[Anchor],
        resolver: &Resolver,
    ) -> Option<[usize; 3]> {
        let key = (triangle.id, side);
        if let Some(resolved) = self.anchors.get(&key) {
            return *resolved;
        }

        self.stats.anchor_resolutions += 1;
        let resolved = match resolver.resolve(triangle, side, anchors) {
            Ok(indices) => Some(indices),
            Err(e) => {
                warn!("Skipping triangle: {}", e);
                None
            }
        };
        self.anchors.insert(key, resolved);
        resolved
    }

    /// Directional transform of a triangle at `phase`, or `None` if the
    /// triangle is degenerate.
    pub fn transform_for(
        &mut self,
        triangle: TriangleId,
        phase: f64,
        direction: Direction,
        anchors: [&Anchor; 3],
    ) -> Option<AffineTransform> {
        let key = (triangle, PhaseKey::new(phase), direction);
        if let Some(transform) = self.transforms.get(&key) {
            return *transform;
        }

        self.stats.transforms_built += 1;
        let transform = match AffineTransform::for_anchors(anchors, direction, phase) {
            Ok(t) => Some(t),
            Err(e) => {
                debug!("No transform for triangle {:?} ({:?}): {}", triangle, direction, e);
                None
            }
        };
        self.transforms.insert(key, transform);
        transform
    }

    /// Drop every cached entry for every phase
    pub fn invalidate_all(&mut self) {
        self.results.clear();
        self.transforms.clear();
        self.anchors.clear();
        self.mesh = None;
        self.stats.invalidations += 1;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn cached_phases(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorId, Point};
    use crate::config::AnchorMatching;

    fn anchors() -> Vec<Anchor> {
        vec![
            Anchor::new(AnchorId(0), Point::new(0.0, 0.0), Point::new(0.0, 0.0)).unwrap(),
            Anchor::new(AnchorId(1), Point::new(10.0, 0.0), Point::new(20.0, 0.0)).unwrap(),
            Anchor::new(AnchorId(2), Point::new(0.0, 10.0), Point::new(0.0, 20.0)).unwrap(),
        ]
    }

    #[test]
    fn test_phase_key_exact() {
        assert_eq!(PhaseKey::new(0.0), PhaseKey::new(-0.0));
        assert_eq!(PhaseKey::new(0.5), PhaseKey::new(0.5));
        assert_ne!(PhaseKey::new(0.5), PhaseKey::new(0.5 + f64::EPSILON));
    }

    #[test]
    fn test_result_hit_and_miss() {
        let mut cache = MorphCache::new();
        assert!(cache.result(0.25).is_none());

        cache.store_result(Arc::new(PhaseResult {
            phase: 0.25,
            ..Default::default()
        }));
        let hit = cache.result(0.25).unwrap();
        assert_eq!(hit.phase, 0.25);
        assert!(cache.result(0.26).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_transform_built_once_per_key() {
        let a = anchors();
        let refs = [&a[0], &a[1], &a[2]];
        let mut cache = MorphCache::new();

        let first = cache.transform_for(TriangleId(0), 0.5, Direction::SourceToPhase, refs);
        let second = cache.transform_for(TriangleId(0), 0.5, Direction::SourceToPhase, refs);
        assert_eq!(first, second);
        assert_eq!(cache.stats().transforms_built, 1);

        // Other direction and other phase are separate entries
        cache.transform_for(TriangleId(0), 0.5, Direction::TargetToPhase, refs);
        cache.transform_for(TriangleId(0), 0.75, Direction::SourceToPhase, refs);
        assert_eq!(cache.stats().transforms_built, 3);
    }

    #[test]
    fn test_invalidate_all_clears_everything() {
        let a = anchors();
        let refs = [&a[0], &a[1], &a[2]];
        let mut cache = MorphCache::new();

        cache.store_result(Arc::new(PhaseResult {
            phase: 0.5,
            ..Default::default()
        }));
        cache.transform_for(TriangleId(0), 0.5, Direction::SourceToPhase, refs);
        let resolver = Resolver::new(AnchorMatching::Proximity, 0.01);
        let triangle = Triangle::new(TriangleId(0), [a[0].source, a[1].source, a[2].source]);
        assert_eq!(cache.anchors_for(&triangle, Side::Source, &a, &resolver), Some([0, 1, 2]));
        cache.mesh_or_build(|_| Mesh::default());

        cache.invalidate_all();
        assert!(!cache.contains_result(0.5));
        assert_eq!(cache.cached_phases(), 0);

        cache.transform_for(TriangleId(0), 0.5, Direction::SourceToPhase, refs);
        cache.anchors_for(&triangle, Side::Source, &a, &resolver);
        cache.mesh_or_build(|_| Mesh::default());

        let stats = cache.stats();
        assert_eq!(stats.transforms_built, 2);
        assert_eq!(stats.anchor_resolutions, 2);
        assert_eq!(stats.meshes_built, 2);
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn test_failed_resolution_cached() {
        let a = anchors();
        let mut cache = MorphCache::new();
        let resolver = Resolver::new(AnchorMatching::Proximity, 0.01);
        let triangle = Triangle::new(TriangleId(3), [Point::new(50.0, 50.0); 3]);

        assert_eq!(cache.anchors_for(&triangle, Side::Target, &a, &resolver), None);
        assert_eq!(cache.anchors_for(&triangle, Side::Target, &a, &resolver), None);
        assert_eq!(cache.stats().anchor_resolutions, 1);
    }
}
