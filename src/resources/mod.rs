//! Resource descriptions
//!
//! Meshes with packed tangent frames, materials, and the buffer and
//! renderable configurations handed to the engine.

mod geometry;
mod material;
mod mesh;

pub use geometry::*;
pub use material::*;
pub use mesh::*;
