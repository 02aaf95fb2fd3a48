//! Triangle to anchor resolution
//!
//! Tagged resolution trusts the anchor indices recorded at triangulation
//! time. Proximity resolution re-derives them by matching each vertex against
//! the anchor positions at the side's reference phase, which is fragile when
//! anchors coincide or drift by more than the epsilon.

use crate::anchor::Anchor;
use crate::config::AnchorMatching;
use crate::error::{MorphError, Result};
use crate::mesh::{Side, Triangle};

/// Every anchor whose position at `phase` lies within `epsilon` of a vertex
/// on both axes, in vertex order.
///
/// A well-formed triangle yields exactly three indices. Coincident anchors
/// yield more, vertices that drifted away from their anchor yield fewer.
pub fn anchors_of(triangle: &Triangle, anchors: &[Anchor], phase: f64, epsilon: f64) -> Vec<usize> {
    let mut matched = Vec::with_capacity(3);
    for vertex in &triangle.vertices {
        for (i, anchor) in anchors.iter().enumerate() {
            let p = anchor.position(phase);
            if (p.x - vertex.x).abs() < epsilon && (p.y - vertex.y).abs() < epsilon {
                matched.push(i);
            }
        }
    }
    matched
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    pub matching: AnchorMatching,
    pub epsilon: f64,
}

impl Resolver {
    pub fn new(matching: AnchorMatching, epsilon: f64) -> Self {
        Self { matching, epsilon }
    }

    /// Resolve the three anchors of `triangle`, which lives on `side`
    pub fn resolve(&self, triangle: &Triangle, side: Side, anchors: &[Anchor]) -> Result<[usize; 3]> {
        if self.matching == AnchorMatching::Tagged {
            if let Some(tags) = triangle.tags {
                if tags.iter().all(|&i| i < anchors.len()) {
                    return Ok(tags);
                }
            }
        }

        let matched = anchors_of(triangle, anchors, side.reference_phase(), self.epsilon);
        match matched[..] {
            [a, b, c] => Ok([a, b, c]),
            _ => Err(MorphError::AnchorResolutionMismatch {
                triangle: triangle.id,
                found: matched.len(),
            }),
        }
    }
}
