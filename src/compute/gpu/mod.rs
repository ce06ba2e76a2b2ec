//! GPU Compute Backend
//!
//! Runs the sketch rules as WGSL compute shaders through WebGPU (wgpu).
//! Ping-pong buffering is done with one bind group per direction; the host
//! only tracks which direction is current.

mod context;
mod particles;
mod reaction_diffusion;
mod vants;

pub use context::GpuContext;
pub use particles::GpuParticles;
pub use reaction_diffusion::GpuReactionDiffusion;
pub use vants::GpuVants;

use crate::schema::ConfigError;
pub use crate::schema::MAX_WORKGROUP_SIZE;

/// Error type for GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("Readback was cancelled before the buffer mapped")]
    ReadbackCanceled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("State does not match configuration: {0}")]
    StateMismatch(&'static str),
}
