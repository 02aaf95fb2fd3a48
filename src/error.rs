//! Error taxonomy for the morphing engine
//!
//! Most geometric and data faults are absorbed inside the engine with a safe
//! fallback (empty mesh, pass-through pixel, skipped triangle). The variants
//! are still typed so the absorbing code can log them uniformly, and so the
//! few hard failures have something precise to return.

use thiserror::Error;

use crate::anchor::AnchorId;
use crate::engine::Role;
use crate::mesh::TriangleId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MorphError {
    /// An input image needed for the operation is absent
    #[error("input image missing: {0:?}")]
    InputMissing(Role),

    /// Fewer than three anchors, so there is nothing to triangulate
    #[error("at least 3 anchors are required for a mesh, got {0}")]
    InsufficientAnchors(usize),

    /// Proximity matching did not find exactly three anchors for a triangle
    #[error("triangle {triangle:?} resolved to {found} anchors instead of 3")]
    AnchorResolutionMismatch { triangle: TriangleId, found: usize },

    /// The triangulation primitive rejected the point configuration
    #[error("triangulation failed: {0}")]
    GeometryFailure(String),

    /// A triangle has (near) zero area and cannot define an affine map
    #[error("degenerate triangle")]
    DegenerateTriangle,

    /// Source and target buffers differ in size and cannot be blended
    #[error("image dimensions differ: source {source_size:?}, target {target_size:?}")]
    DimensionMismatch {
        source_size: (u32, u32),
        target_size: (u32, u32),
    },

    #[error("unknown anchor id {0:?}")]
    UnknownAnchor(AnchorId),

    #[error("anchor id {0:?} appears more than once")]
    DuplicateAnchor(AnchorId),

    #[error("anchor coordinates must be finite")]
    NonFiniteCoordinate,

    #[error("phase must be finite, got {0}")]
    InvalidPhase(f64),

    #[error("invalid quality index {0}")]
    InvalidQuality(usize),
}

pub type Result<T> = std::result::Result<T, MorphError>;
