//! Morphing engine
//!
//! Owns the input images, the anchor list, the current phase and quality, and
//! the cache. Every mutation invalidates what it affects and recomputes the
//! result for the current phase before returning, so the accessors always
//! describe a consistent state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::anchor::{next_anchor_id, Anchor, AnchorEdit, AnchorId, Point};
use crate::blend::blend;
use crate::cache::{CacheStats, MorphCache, PhaseResult};
use crate::config::{EngineConfig, Quality};
use crate::error::{MorphError, Result};
use crate::mesh::{edges_at, Mesh, Segment, Side};
use crate::resolve::Resolver;
use crate::triangulate::{DelaunayTriangulator, Triangulator};
use crate::warp::{warp, WarpContext};

/// Image slots exposed to a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Source,
    Target,
    SourceWarped,
    TargetWarped,
    Output,
}

pub struct MorphEngine {
    source: Option<RgbaImage>,
    target: Option<RgbaImage>,
    anchors: Vec<Anchor>,
    phase: f64,
    quality: Quality,
    settings: EngineConfig,
    triangulator: Box<dyn Triangulator>,
    cache: MorphCache,
    current: Option<Arc<PhaseResult>>,
}

impl MorphEngine {
    pub fn new(settings: EngineConfig) -> Self {
        Self::with_triangulator(settings, Box::new(DelaunayTriangulator))
    }

    pub fn with_triangulator(settings: EngineConfig, triangulator: Box<dyn Triangulator>) -> Self {
        Self {
            source: None,
            target: None,
            anchors: Vec::new(),
            phase: settings.initial_phase,
            quality: settings.quality,
            settings,
            triangulator,
            cache: MorphCache::new(),
            current: None,
        }
    }

    /// Swap in a whole project and show it at the configured initial phase
    pub fn load_project(
        &mut self,
        source: Option<RgbaImage>,
        target: Option<RgbaImage>,
        anchors: Vec<Anchor>,
    ) -> Result<Arc<PhaseResult>> {
        validate(&anchors)?;
        info!(
            "Loading project: {} anchors, source {:?}, target {:?}",
            anchors.len(),
            source.as_ref().map(|i| i.dimensions()),
            target.as_ref().map(|i| i.dimensions()),
        );
        self.source = source;
        self.target = target;
        self.anchors = anchors;
        self.phase = self.settings.initial_phase;
        self.cache.invalidate_all();
        self.recompute()
    }

    /// Drop images, anchors and results
    pub fn clear_project(&mut self) {
        self.source = None;
        self.target = None;
        self.anchors.clear();
        self.current = None;
        self.cache.invalidate_all();
    }

    pub fn set_source_image(&mut self, image: RgbaImage) -> Result<Arc<PhaseResult>> {
        self.source = Some(image);
        self.cache.invalidate_all();
        self.recompute()
    }

    pub fn set_target_image(&mut self, image: RgbaImage) -> Result<Arc<PhaseResult>> {
        self.target = Some(image);
        self.cache.invalidate_all();
        self.recompute()
    }

    pub fn set_anchors(&mut self, anchors: Vec<Anchor>) -> Result<Arc<PhaseResult>> {
        validate(&anchors)?;
        self.anchors = anchors;
        self.cache.invalidate_all();
        self.recompute()
    }

    /// Append an anchor and return its id
    pub fn add_anchor(&mut self, source: Point, target: Point) -> Result<AnchorId> {
        let anchor = Anchor::new(next_anchor_id(&self.anchors), source, target)?;
        let id = anchor.id;
        debug!("Adding anchor {:?}: {:?} -> {:?}", id, source, target);
        self.anchors.push(anchor);
        self.cache.invalidate_all();
        self.recompute()?;
        Ok(id)
    }

    pub fn move_anchor(&mut self, id: AnchorId, edit: AnchorEdit) -> Result<Arc<PhaseResult>> {
        let anchor = self
            .anchors
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(MorphError::UnknownAnchor(id))?;
        anchor.apply(edit)?;
        debug!("Moved anchor {:?}: {:?}", id, edit);
        self.cache.invalidate_all();
        self.recompute()
    }

    /// Move to `phase`, serving the result from cache when possible
    pub fn set_phase(&mut self, phase: f64) -> Result<Arc<PhaseResult>> {
        if !phase.is_finite() {
            return Err(MorphError::InvalidPhase(phase));
        }
        self.phase = phase;
        self.recompute()
    }

    pub fn set_quality(&mut self, quality: Quality) -> Result<Arc<PhaseResult>> {
        debug!("Quality set to {}", quality.as_str());
        self.quality = quality;
        self.cache.invalidate_all();
        self.recompute()
    }

    /// Set quality from a slider position (0 = low, 1 = medium, 2 = high)
    pub fn set_quality_index(&mut self, index: usize) -> Result<Arc<PhaseResult>> {
        self.set_quality(Quality::from_index(index)?)
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    pub fn result(&self) -> Option<&Arc<PhaseResult>> {
        self.current.as_ref()
    }

    pub fn image(&self, role: Role) -> Option<&RgbaImage> {
        match role {
            Role::Source => self.source.as_ref(),
            Role::Target => self.target.as_ref(),
            Role::SourceWarped => self.current.as_ref()?.source_warped.as_ref(),
            Role::TargetWarped => self.current.as_ref()?.target_warped.as_ref(),
            Role::Output => self.current.as_ref()?.output.as_ref(),
        }
    }

    /// Edges for overlay drawing: phase-0 edges on the source view, phase-1
    /// edges on the target view, current-phase edges everywhere else.
    pub fn triangle_edges(&self, role: Role) -> &[Segment] {
        let Some(current) = &self.current else {
            return &[];
        };
        match role {
            Role::Source => &current.source_edges,
            Role::Target => &current.target_edges,
            _ => &current.current_edges,
        }
    }

    /// The mesh for the current anchor set, built on first use
    pub fn mesh(&mut self) -> Arc<Mesh> {
        let resolver = self.resolver();
        let anchors = &self.anchors;
        let triangulator = self.triangulator.as_ref();
        self.cache
            .mesh_or_build(|cache| Mesh::build(anchors, triangulator, &resolver, cache))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.settings.anchor_matching, self.settings.match_epsilon)
    }

    fn recompute(&mut self) -> Result<Arc<PhaseResult>> {
        let phase = self.phase;
        if let Some(hit) = self.cache.result(phase) {
            self.current = Some(hit.clone());
            return Ok(hit);
        }
        // Nothing from before the mutation may outlive a failed recompute
        self.current = None;

        let started = Instant::now();
        let mesh = self.mesh();
        let resolver = self.resolver();
        let anchors = &self.anchors;
        let cache = &mut self.cache;

        let source_edges = edges_at(&mesh, anchors, 0.0, &resolver, cache);
        let target_edges = edges_at(&mesh, anchors, 1.0, &resolver, cache);
        let current_edges = edges_at(&mesh, anchors, phase, &resolver, cache);

        let ctx = WarpContext {
            mesh: &mesh,
            anchors,
            resolver: &resolver,
        };
        let source_warped = match &self.source {
            Some(image) => Some(warp(image, Side::Source, phase, self.quality, &ctx, cache)),
            None => {
                debug!("{}", MorphError::InputMissing(Role::Source));
                None
            }
        };
        let target_warped = match &self.target {
            Some(image) => Some(warp(image, Side::Target, phase, self.quality, &ctx, cache)),
            None => {
                debug!("{}", MorphError::InputMissing(Role::Target));
                None
            }
        };

        let output = match (&source_warped, &target_warped) {
            (Some(s), Some(t)) => Some(blend(s, t, phase, self.settings.parallel_blend)?),
            _ => None,
        };

        let result = Arc::new(PhaseResult {
            phase,
            source_warped,
            target_warped,
            output,
            source_edges,
            target_edges,
            current_edges,
        });
        self.cache.store_result(result.clone());
        self.current = Some(result.clone());

        info!(
            "Computed phase {} ({} triangles, quality {}) in {:.1} ms",
            phase,
            mesh.len(),
            self.quality.as_str(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }
}

fn validate(anchors: &[Anchor]) -> Result<()> {
    if anchors
        .iter()
        .any(|a| !a.source.is_finite() || !a.target.is_finite())
    {
        return Err(MorphError::NonFiniteCoordinate);
    }
    let mut seen = HashSet::with_capacity(anchors.len());
    if let Some(duplicate) = anchors.iter().find(|a| !seen.insert(a.id)) {
        return Err(MorphError::DuplicateAnchor(duplicate.id));
    }
    Ok(())
}
