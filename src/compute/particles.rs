//! CPU particle advection through an animated flow field.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::schema::{ConfigError, ParticleConfig, Seed};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::PingPong;

/// Particle record, laid out to match the WGSL `Particle` struct.
#[repr(C)]
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
pub struct Particle {
    /// Position in clip space, `[-1, 1)` on both axes.
    pub pos: [f32; 2],
    /// Velocity sampled on the last pass.
    pub vel: [f32; 2],
}
const _: () = assert!(
    std::mem::size_of::<Particle>() == 16,
    "size of Particle does not match WGSL"
);

/// Velocity of the flow field at `pos` and time `t`.
#[inline]
pub fn flow(pos: [f32; 2], t: f32) -> [f32; 2] {
    [(TAU * pos[1] + t).sin(), (TAU * pos[0] + t).cos()]
}

/// Wrap a coordinate into `[-1, 1)`.
#[inline]
pub fn wrap_clip(v: f32) -> f32 {
    let w = (v + 1.0).rem_euclid(2.0) - 1.0;
    if w >= 1.0 { -1.0 } else { w }
}

/// Particle state: ping-ponged particle buffers plus the frame counter.
pub struct ParticleSystem {
    pub particles: PingPong<Vec<Particle>>,
    /// Completed frames; drives the flow field's time uniform.
    pub frame: u64,
}

impl ParticleSystem {
    /// Create state from seed.
    pub fn from_seed(seed: &Seed, config: &ParticleConfig) -> Self {
        let data = seed.particles(config);
        let particles: Vec<Particle> = bytemuck::cast_slice(&data).to_vec();
        Self::from_particles(particles)
    }

    pub fn from_particles(particles: Vec<Particle>) -> Self {
        let scratch = vec![Particle::default(); particles.len()];
        Self {
            particles: PingPong::new(particles, scratch),
            frame: 0,
        }
    }

    /// Particles after the most recent pass.
    #[inline]
    pub fn current(&self) -> &[Particle] {
        self.particles.read()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.current().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Splat particles into a `width × height` density grid (row 0 at the top).
    pub fn rasterize(&self, width: usize, height: usize) -> Vec<f32> {
        let mut density = vec![0.0f32; width * height];
        for p in self.current() {
            let x = ((p.pos[0] + 1.0) * 0.5 * width as f32).floor() as usize;
            let y = ((1.0 - p.pos[1]) * 0.5 * height as f32).floor() as usize;
            let (x, y) = (x.min(width - 1), y.min(height - 1));
            density[y * width + x] += 1.0;
        }
        density
    }

    /// Mean particle speed from the last pass.
    pub fn mean_speed(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .current()
            .iter()
            .map(|p| (p.vel[0] * p.vel[0] + p.vel[1] * p.vel[1]).sqrt())
            .sum();
        total / self.len() as f32
    }
}

/// CPU particle propagator.
pub struct CpuParticles {
    config: ParticleConfig,
}

impl CpuParticles {
    /// Create a new propagator from configuration.
    pub fn new(config: ParticleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "particles: {} particles, {} passes/frame, ts={}",
            config.count,
            config.passes,
            config.ts
        );
        Ok(Self { config })
    }

    /// Perform one advection pass.
    pub fn step(&self, system: &mut ParticleSystem) {
        let ts = self.config.ts;
        let t = system.frame as f32 * ts;
        let (current, next) = system.particles.split_mut();

        let advect = |(out, p): (&mut Particle, &Particle)| {
            let vel = flow(p.pos, t);
            out.vel = vel;
            out.pos = [
                wrap_clip(p.pos[0] + vel[0] * ts),
                wrap_clip(p.pos[1] + vel[1] * ts),
            ];
        };

        #[cfg(not(target_arch = "wasm32"))]
        next.par_iter_mut().zip(current.par_iter()).for_each(advect);

        #[cfg(target_arch = "wasm32")]
        next.iter_mut().zip(current.iter()).for_each(advect);

        system.particles.swap();
    }

    /// Run one frame of `passes` passes.
    pub fn frame(&self, system: &mut ParticleSystem) {
        for _ in 0..self.config.passes {
            self.step(system);
        }
        system.frame += 1;
    }

    /// Run several frames.
    pub fn run(&self, system: &mut ParticleSystem, frames: u64) {
        for _ in 0..frames {
            self.frame(system);
        }
    }

    /// Mutable configuration, e.g. for `Tunable::set_param`.
    pub fn config_mut(&mut self) -> &mut ParticleConfig {
        &mut self.config
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }
}
