//! Lit Cube - a small renderer built around packed tangent frames
//!
//! Each vertex carries its tangent, bitangent and normal as one quaternion
//! quantized to four snorm16 values. The sign of `w` records whether the
//! bitangent is mirrored, so a full frame costs 8 bytes per vertex.
//!
//! # Layout
//! - [`packing`]: basis to quaternion conversion and snorm16 quantization
//! - [`resources`]: meshes, materials and buffer layouts
//! - [`scene`]: entities (Bevy ECS), camera and lights
//! - [`engine`]: uploads geometry and draws it through a [`backend::GraphicsBackend`]
//! - [`frame`]: clock driven frame loop
//!
//! The wgpu backend draws into a winit window; the headless backend records
//! commands and runs without a GPU.

pub mod backend;
pub mod engine;
pub mod frame;
pub mod packing;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod window;

// Re-export Bevy ECS prelude for users
pub use bevy_ecs::prelude::*;

pub use backend::{HeadlessBackend, WgpuBackend};
pub use engine::{Engine, EngineError, EngineResult};
pub use frame::{spin_transform, Clock, FrameDriver, FrameTime, SystemClock};
pub use packing::{
    pack_snorm16, pack_tangent_frame, pack_tangent_frames, pack_tangent_frames_indexed,
    unpack_snorm16, unpack_tangent_frame, PackError, PackedTangentFrame, TangentBasis,
};
pub use scene::{Exposure, DEFAULT_CLEAR_COLOR};
pub use window::{FrameControl, Window, WindowError, WindowHost};

/// Configuration for initializing the graphics engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
    /// Background color, linear RGBA
    pub clear_color: [f32; 4],
    /// Camera exposure applied to light intensities
    pub exposure: Exposure,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Lit Cube".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: DEFAULT_CLEAR_COLOR,
            exposure: Exposure::default(),
        }
    }
}

/// Initialize `env_logger` at `info`, overridable with `RUST_LOG`.
/// Calling it again is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
