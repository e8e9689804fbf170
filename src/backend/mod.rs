//! Backend abstraction layer
//!
//! Provides common traits and types implemented by the wgpu backend and the
//! headless recording backend.

pub mod headless;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use headless::HeadlessBackend;
pub use traits::*;
pub use types::*;
pub use wgpu_backend::WgpuBackend;
