//! GPU sketchbook - small generative simulations on WebGPU compute.
//!
//! Five sketches share one runtime: a fractal noise field, Gray-Scott
//! reaction-diffusion, particle advection through an analytic flow field,
//! three populations of virtual ants (vants) on a shared pheromone grid, and a
//! two-cluster gravitational n-body system. Each has a CPU reference
//! propagator; reaction-diffusion, particles and vants also run as wgpu
//! compute pipelines that produce the same state.
//!
//! # Architecture
//!
//! - `schema`: Configuration types, tunable parameters and seeding
//! - `compute`: CPU propagators, wgpu backends and RGBA rendering
//! - `animation`: Recording and playback of grid frames
//! - `sketch`: A single runner over every sketch, used by the CLI and WASM
//!
//! # Example
//!
//! ```rust,no_run
//! use gpu_sketchbook::{
//!     compute::{CpuReactionDiffusion, ReactionDiffusionState, ReactionDiffusionStats},
//!     schema::{ReactionDiffusionConfig, Seed},
//! };
//!
//! let config = ReactionDiffusionConfig::default();
//! let mut state = ReactionDiffusionState::from_seed(&Seed::default(), &config);
//!
//! let propagator = CpuReactionDiffusion::new(config).unwrap();
//! propagator.run(&mut state, 100);
//!
//! let stats = ReactionDiffusionStats::from_state(&state);
//! println!("Total B after 100 frames: {}", stats.total_b);
//! ```

pub mod animation;
pub mod compute;
pub mod schema;
pub mod sketch;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use compute::Pointer;
pub use compute::gpu::{GpuContext, GpuError};
pub use schema::{ConfigError, Seed, SketchConfig};
pub use sketch::{GpuSketch, Sketch, SketchStats};

/// Errors surfaced by the sketch runtime.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sketch {0} has no GPU backend")]
    NoGpuBackend(&'static str),
}
