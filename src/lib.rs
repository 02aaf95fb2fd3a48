//! TriMorph - triangle-mesh image morphing
//!
//! Given a source image, a target image and a set of corresponding anchor
//! points, the engine triangulates the anchors, warps both images piecewise
//! affinely towards the mesh shape at a phase in [0, 1], and cross-dissolves
//! the two warped images. Results, transforms and anchor lookups are cached
//! so that scrubbing back and forth over the same phases is cheap.

pub mod anchor;
pub mod blend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod locate;
pub mod mesh;
pub mod project;
pub mod render;
pub mod resolve;
pub mod transform;
pub mod triangulate;
pub mod warp;

pub use anchor::{Anchor, AnchorEdit, AnchorId, Point};
pub use config::{AnchorMatching, Config, EngineConfig, Quality};
pub use engine::{MorphEngine, Role};
pub use error::MorphError;
pub use triangulate::{DelaunayTriangulator, Triangulator};
