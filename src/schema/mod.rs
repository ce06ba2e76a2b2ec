//! Schema module - Configuration, parameter bindings and seeding for sketches.

mod config;
mod params;
mod seed;

pub use config::*;
pub use params::*;
pub use seed::*;
