//! Compute module - CPU reference propagators, index math and colorizers.

mod grid;
mod nbody;
mod noise;
mod particles;
mod pingpong;
mod pointer;
mod reaction_diffusion;
mod vants;

pub mod gpu;
pub mod render;

pub use grid::*;
pub use nbody::*;
pub use noise::*;
pub use particles::*;
pub use pingpong::*;
pub use pointer::*;
pub use reaction_diffusion::*;
pub use vants::*;
