//! Deterministic initial state for each sketch.
//!
//! Seeds produce packed `f32` records (four or eight floats per entity) so the
//! same data can be uploaded to a storage buffer as-is or viewed as typed
//! records with `bytemuck`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{NbodyConfig, ParticleConfig, ReactionDiffusionConfig, VantConfig};

/// Floats per particle / vant record.
pub const RECORD_FLOATS: usize = 4;

/// Floats per star record.
pub const STAR_FLOATS: usize = 8;

/// Number of vant populations.
pub const VANT_POPULATIONS: usize = 3;

/// RNG seed shared by all sketch initializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub rng_seed: u64,
}

impl Default for Seed {
    fn default() -> Self {
        Self { rng_seed: 42 }
    }
}

impl Seed {
    pub fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.rng_seed)
    }

    /// Initial concentrations `(a, b)`.
    ///
    /// A is uniform noise, B is zero except for a full-strength square around
    /// the configured region. The square wraps around grid edges.
    pub fn reaction_diffusion(&self, config: &ReactionDiffusionConfig) -> (Vec<f32>, Vec<f32>) {
        let (width, height) = (config.width, config.height);
        let mut rng = self.rng();

        let a: Vec<f32> = (0..width * height).map(|_| rng.r#gen::<f32>()).collect();
        let mut b = vec![0.0f32; width * height];

        let region = &config.seed_region;
        let cx = (region.center.0 * width as f32).round() as i64;
        let cy = (region.center.1 * height as f32).round() as i64;
        let half = region.half_extent as i64;
        // A block wider than the grid would revisit cells; cap it at one full wrap.
        let span_x = (2 * half).min(width as i64);
        let span_y = (2 * half).min(height as i64);

        for dy in 0..span_y {
            let y = (cy - half + dy).rem_euclid(height as i64) as usize;
            for dx in 0..span_x {
                let x = (cx - half + dx).rem_euclid(width as i64) as usize;
                b[y * width + x] = 1.0;
            }
        }

        (a, b)
    }

    /// Particle records `{x, y, vx, vy}` with positions uniform in `[-1, 1)`.
    pub fn particles(&self, config: &ParticleConfig) -> Vec<f32> {
        let mut rng = self.rng();
        let mut data = vec![0.0f32; config.count as usize * RECORD_FLOATS];
        for record in data.chunks_exact_mut(RECORD_FLOATS) {
            record[0] = -1.0 + rng.r#gen::<f32>() * 2.0;
            record[1] = -1.0 + rng.r#gen::<f32>() * 2.0;
        }
        data
    }

    /// Vant records `{x, y, heading, flag}` for each population.
    ///
    /// Agents spawn in the central window of the grid with heading 0 and a
    /// random behavior flag of 0 or 1.
    pub fn vants(&self, config: &VantConfig) -> [Vec<f32>; VANT_POPULATIONS] {
        let mut rng = self.rng();
        let (w, h) = (config.grid_width() as f32, config.grid_height() as f32);
        let (start, span) = config.spawn_window;
        let agents = config.agents_per_population as usize;

        let mut populations: [Vec<f32>; VANT_POPULATIONS] =
            std::array::from_fn(|_| vec![0.0f32; agents * RECORD_FLOATS]);

        for i in 0..agents {
            let base = i * RECORD_FLOATS;
            for population in populations.iter_mut() {
                population[base] = ((start + rng.r#gen::<f32>() * span) * w).floor();
                population[base + 1] = ((start + rng.r#gen::<f32>() * span) * h).floor();
                population[base + 2] = 0.0;
                population[base + 3] = rng.r#gen::<f32>().round();
            }
        }

        populations
    }

    /// Star records `{x, y, z, mass, vx, vy, vz, brightness}` in two clusters.
    pub fn stars(&self, config: &NbodyConfig) -> Vec<f32> {
        let mut rng = self.rng();
        let half = config.count / 2;
        let mut data = Vec::with_capacity(config.count * STAR_FLOATS);

        for i in 0..config.count {
            let (shift, bright) = if i < half {
                (-config.cluster_offset, 1.0)
            } else {
                (config.cluster_offset, 0.5)
            };
            let x = rng.r#gen::<f32>() * config.cluster_extent + shift;
            let y = rng.r#gen::<f32>() * config.cluster_extent;
            let z = rng.r#gen::<f32>() * config.cluster_extent;
            let mass = rng.r#gen::<f32>() * config.max_mass;
            data.extend_from_slice(&[x, y, z, mass, 0.0, 0.0, 0.0, bright]);
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SeedRegion;

    fn small_rd() -> ReactionDiffusionConfig {
        ReactionDiffusionConfig {
            width: 32,
            height: 16,
            seed_region: SeedRegion {
                center: (1.0, 0.5),
                half_extent: 4,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_reaction_diffusion_seed_block_wraps() {
        let config = small_rd();
        let (a, b) = Seed::default().reaction_diffusion(&config);

        assert_eq!(a.len(), 32 * 16);
        assert!(a.iter().all(|v| (0.0..1.0).contains(v)));

        // 8x8 block centered on the right edge: 4 columns on each side.
        let seeded = b.iter().filter(|v| **v == 1.0).count();
        assert_eq!(seeded, 64);
        assert_eq!(b[8 * 32 + 31], 1.0);
        assert_eq!(b[8 * 32], 1.0);
        assert_eq!(b[8 * 32 + 15], 0.0);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let config = small_rd();
        let first = Seed::new(7).reaction_diffusion(&config);
        let second = Seed::new(7).reaction_diffusion(&config);
        assert_eq!(first, second);
        assert_ne!(first.0, Seed::new(8).reaction_diffusion(&config).0);
    }

    #[test]
    fn test_particles_in_clip_space() {
        let config = ParticleConfig::default();
        let data = Seed::default().particles(&config);
        assert_eq!(data.len(), 1024 * RECORD_FLOATS);
        for record in data.chunks_exact(RECORD_FLOATS) {
            assert!((-1.0..1.0).contains(&record[0]));
            assert!((-1.0..1.0).contains(&record[1]));
            assert_eq!(record[2], 0.0);
            assert_eq!(record[3], 0.0);
        }
    }

    #[test]
    fn test_vants_spawn_in_center() {
        let config = VantConfig::default();
        let populations = Seed::default().vants(&config);
        let (w, h) = (config.grid_width() as f32, config.grid_height() as f32);

        for population in &populations {
            assert_eq!(population.len(), 128 * RECORD_FLOATS);
            for record in population.chunks_exact(RECORD_FLOATS) {
                assert!(record[0] >= (0.45 * w).floor() && record[0] <= 0.55 * w);
                assert!(record[1] >= (0.45 * h).floor() && record[1] <= 0.55 * h);
                assert_eq!(record[2], 0.0);
                assert!(record[3] == 0.0 || record[3] == 1.0);
            }
        }
    }

    #[test]
    fn test_stars_two_clusters() {
        let config = NbodyConfig {
            count: 64,
            ..Default::default()
        };
        let data = Seed::default().stars(&config);
        let records: Vec<&[f32]> = data.chunks_exact(STAR_FLOATS).collect();
        assert_eq!(records.len(), 64);
        assert!(records[..32].iter().all(|s| s[0] < 0.0 && s[7] == 1.0));
        assert!(records[32..].iter().all(|s| s[0] > 0.0 && s[7] == 0.5));
    }
}
