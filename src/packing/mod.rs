//! Compact vertex attribute encoding
//!
//! Tangent frames are stored as one quaternion per vertex, quantized to four
//! signed normalized 16-bit integers.

mod prepare;
mod snorm;
mod tangent_frame;

pub use prepare::*;
pub use snorm::*;
pub use tangent_frame::*;
