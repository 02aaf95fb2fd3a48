//! Anchor points
//!
//! An anchor is a user-placed correspondence between a position in the source
//! image and a position in the target image. Every other part of the engine
//! asks an anchor where it sits at some phase in [0, 1].

use serde::{Deserialize, Serialize};

use crate::error::{MorphError, Result};

/// A 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation towards `other`; `t` is not clamped
    #[inline]
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }
}

/// Stable identity of an anchor within a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AnchorId(pub usize);

/// A source/target point correspondence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    pub source: Point,
    pub target: Point,
}

impl Anchor {
    /// Create an anchor, rejecting non-finite coordinates
    pub fn new(id: AnchorId, source: Point, target: Point) -> Result<Self> {
        if !source.is_finite() || !target.is_finite() {
            return Err(MorphError::NonFiniteCoordinate);
        }
        Ok(Self { id, source, target })
    }

    /// Position at `phase`: 0 is the source position, 1 the target position.
    ///
    /// The phase is not clamped. The end points are returned verbatim so that
    /// `position(0.0) == source` and `position(1.0) == target` hold exactly.
    #[inline]
    pub fn position(&self, phase: f64) -> Point {
        if phase == 0.0 {
            self.source
        } else if phase == 1.0 {
            self.target
        } else {
            self.source.lerp(self.target, phase)
        }
    }

    pub fn apply(&mut self, edit: AnchorEdit) -> Result<()> {
        match edit {
            AnchorEdit::Source(p) => {
                if !p.is_finite() {
                    return Err(MorphError::NonFiniteCoordinate);
                }
                self.source = p;
            }
            AnchorEdit::Target(p) => {
                if !p.is_finite() {
                    return Err(MorphError::NonFiniteCoordinate);
                }
                self.target = p;
            }
        }
        Ok(())
    }
}

/// A drag of one side of an anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorEdit {
    Source(Point),
    Target(Point),
}

/// Next free id after the ones already present in `anchors`
pub fn next_anchor_id(anchors: &[Anchor]) -> AnchorId {
    AnchorId(anchors.iter().map(|a| a.id.0 + 1).max().unwrap_or(0))
}
