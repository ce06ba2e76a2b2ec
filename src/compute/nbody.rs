//! Direct-summation gravitational n-body integration.
//!
//! Every star feels every other star through a Plummer-softened force:
//!
//! ```text
//! a_i = Σ_j G·m_j·(x_j − x_i) / (|x_j − x_i|² + ε²)^{3/2}
//! ```
//!
//! followed by a semi-implicit Euler step (velocity first, then position).

use serde::{Deserialize, Serialize};

use crate::schema::{ConfigError, NbodyConfig, Seed};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Star record, laid out to match the WGSL `Star` struct.
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
pub struct Star {
    pub pos: [f32; 3],
    pub mass: f32,
    pub vel: [f32; 3],
    /// Display brightness in `[0, 1]`.
    pub bright: f32,
}
const _: () = assert!(
    std::mem::size_of::<Star>() == 32,
    "size of Star does not match WGSL"
);

impl Star {
    pub fn at_rest(pos: [f32; 3], mass: f32) -> Self {
        Self {
            pos,
            mass,
            vel: [0.0; 3],
            bright: 1.0,
        }
    }
}

/// Star population plus integration clock.
pub struct NbodySystem {
    pub stars: Vec<Star>,
    /// Simulated time.
    pub time: f64,
    /// Completed integration steps.
    pub step: u64,
}

impl NbodySystem {
    /// Create state from seed.
    pub fn from_seed(seed: &Seed, config: &NbodyConfig) -> Self {
        let data = seed.stars(config);
        Self::from_stars(bytemuck::cast_slice(&data).to_vec())
    }

    pub fn from_stars(stars: Vec<Star>) -> Self {
        Self {
            stars,
            time: 0.0,
            step: 0,
        }
    }

    /// Total linear momentum `Σ m·v`.
    pub fn total_momentum(&self) -> [f64; 3] {
        let mut p = [0.0f64; 3];
        for star in &self.stars {
            for (axis, v) in star.vel.iter().enumerate() {
                p[axis] += star.mass as f64 * *v as f64;
            }
        }
        p
    }

    /// Sum of momentum magnitudes, the natural scale for conservation checks.
    pub fn momentum_scale(&self) -> f64 {
        self.stars
            .iter()
            .map(|s| {
                let v2: f64 = s.vel.iter().map(|&v| (v as f64) * (v as f64)).sum();
                s.mass as f64 * v2.sqrt()
            })
            .sum()
    }

    /// Mass-weighted mean position. Returns the origin for a massless system.
    pub fn center_of_mass(&self) -> [f64; 3] {
        let mut weighted = [0.0f64; 3];
        let mut total = 0.0f64;
        for star in &self.stars {
            total += star.mass as f64;
            for (axis, x) in star.pos.iter().enumerate() {
                weighted[axis] += star.mass as f64 * *x as f64;
            }
        }
        if total > 0.0 {
            weighted.map(|w| w / total)
        } else {
            [0.0; 3]
        }
    }

    /// Orthographic projection onto the xy plane.
    ///
    /// The view is fitted to the bounding box of the stars. Each star adds
    /// its brightness to the cell it lands in (row 0 at the top).
    pub fn project(&self, width: usize, height: usize) -> Vec<f32> {
        let mut grid = vec![0.0f32; width * height];
        if self.stars.is_empty() || width == 0 || height == 0 {
            return grid;
        }

        let (mut min, mut max) = ([f32::MAX; 2], [f32::MIN; 2]);
        for star in &self.stars {
            for axis in 0..2 {
                min[axis] = min[axis].min(star.pos[axis]);
                max[axis] = max[axis].max(star.pos[axis]);
            }
        }
        let span = [
            (max[0] - min[0]).max(f32::EPSILON),
            (max[1] - min[1]).max(f32::EPSILON),
        ];

        for star in &self.stars {
            let u = (star.pos[0] - min[0]) / span[0];
            let v = (star.pos[1] - min[1]) / span[1];
            let x = ((u * width as f32) as usize).min(width - 1);
            let y = (((1.0 - v) * height as f32) as usize).min(height - 1);
            grid[y * width + x] += star.bright;
        }
        grid
    }
}

/// CPU n-body integrator.
pub struct CpuNbody {
    config: NbodyConfig,
}

impl CpuNbody {
    /// Create a new integrator from configuration.
    pub fn new(config: NbodyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "nbody: {} stars, G={:e}, softening={:e}, dt={}",
            config.count,
            config.gravity,
            config.softening,
            config.dt
        );
        Ok(Self { config })
    }

    /// Gravitational acceleration on every star.
    pub fn accelerations(&self, stars: &[Star]) -> Vec<[f32; 3]> {
        let g = self.config.gravity;
        let eps2 = self.config.softening * self.config.softening;

        let accel = |i: usize| {
            let pi = stars[i].pos;
            let mut acc = [0.0f32; 3];
            for (j, other) in stars.iter().enumerate() {
                if i == j {
                    continue;
                }
                let r = [
                    other.pos[0] - pi[0],
                    other.pos[1] - pi[1],
                    other.pos[2] - pi[2],
                ];
                let d2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2] + eps2;
                let inv = g * other.mass / (d2 * d2.sqrt());
                for axis in 0..3 {
                    acc[axis] += r[axis] * inv;
                }
            }
            acc
        };

        #[cfg(not(target_arch = "wasm32"))]
        let result = (0..stars.len()).into_par_iter().map(accel).collect();

        #[cfg(target_arch = "wasm32")]
        let result = (0..stars.len()).map(accel).collect();

        result
    }

    /// Advance one integration step.
    pub fn step(&self, system: &mut NbodySystem) {
        let dt = self.config.dt;
        let acc = self.accelerations(&system.stars);

        for (star, a) in system.stars.iter_mut().zip(&acc) {
            for axis in 0..3 {
                star.vel[axis] += a[axis] * dt;
                star.pos[axis] += star.vel[axis] * dt;
            }
        }

        system.time += dt as f64;
        system.step += 1;
        log::trace!("nbody step {} (t={:.3e})", system.step, system.time);
    }

    /// Run several steps.
    pub fn run(&self, system: &mut NbodySystem, steps: u64) {
        for _ in 0..steps {
            self.step(system);
        }
    }

    pub fn config(&self) -> &NbodyConfig {
        &self.config
    }
}

/// N-body statistics for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbodyStats {
    pub step: u64,
    pub time: f64,
    pub momentum: [f64; 3],
    pub center_of_mass: [f64; 3],
}

impl NbodyStats {
    pub fn from_system(system: &NbodySystem) -> Self {
        Self {
            step: system.step,
            time: system.time,
            momentum: system.total_momentum(),
            center_of_mass: system.center_of_mass(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_config(count: usize) -> NbodyConfig {
        NbodyConfig {
            count,
            gravity: 1.0,
            softening: 0.1,
            dt: 0.01,
            cluster_offset: 2.0,
            cluster_extent: 1.0,
            max_mass: 1.0,
        }
    }

    fn norm(v: [f64; 3]) -> f64 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_two_equal_masses_attract() {
        let integrator = CpuNbody::new(unit_config(2)).unwrap();
        let mut system = NbodySystem::from_stars(vec![
            Star::at_rest([-1.0, 0.0, 0.0], 1.0),
            Star::at_rest([1.0, 0.0, 0.0], 1.0),
        ]);

        integrator.run(&mut system, 10);

        let [a, b] = [system.stars[0], system.stars[1]];
        assert!(a.vel[0] > 0.0 && b.vel[0] < 0.0);
        assert!((a.vel[0] + b.vel[0]).abs() < 1e-6);
        assert!(b.pos[0] - a.pos[0] < 2.0);
        assert_eq!(system.step, 10);
        assert!((system.time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_momentum_conserved() {
        let config = unit_config(64);
        let integrator = CpuNbody::new(config.clone()).unwrap();
        let mut system = NbodySystem::from_seed(&Seed::new(7), &config);
        let com_before = system.center_of_mass();

        integrator.run(&mut system, 50);

        let drift = norm(system.total_momentum());
        let scale = system.momentum_scale();
        assert!(scale > 0.0);
        assert!(drift < 1e-4 * scale, "momentum drift {drift} vs scale {scale}");

        // Zero net momentum keeps the center of mass in place.
        let com_after = system.center_of_mass();
        for axis in 0..3 {
            assert!((com_after[axis] - com_before[axis]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_seeded_clusters() {
        let config = NbodyConfig::default();
        let system = NbodySystem::from_seed(&Seed::default(), &config);
        assert_eq!(system.stars.len(), 1024);
        assert!(system.stars[..512].iter().all(|s| s.pos[0] < 0.0 && s.bright == 1.0));
        assert!(system.stars[512..].iter().all(|s| s.pos[0] > 0.0 && s.bright == 0.5));
    }

    #[test]
    fn test_projection_accumulates_brightness() {
        let config = unit_config(32);
        let system = NbodySystem::from_seed(&Seed::default(), &config);
        let grid = system.project(16, 8);
        assert_eq!(grid.len(), 128);
        let total: f32 = grid.iter().sum();
        assert!((total - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_time_step() {
        let config = NbodyConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            CpuNbody::new(config),
            Err(ConfigError::InvalidTimeStep)
        ));
    }
}
