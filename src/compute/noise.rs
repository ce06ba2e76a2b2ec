//! Animated fractal value noise.

use crate::schema::{ConfigError, NoiseConfig};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::Pointer;

/// Lattice frequency of the first octave at `scale = 1`.
pub const BASE_FREQUENCY: f32 = 8.0;
const LACUNARITY: f32 = 2.0;
const GAIN: f32 = 0.5;

/// Hash a lattice point to `[0, 1)`.
#[inline]
fn lattice(x: i32, y: i32, z: i32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h = (h ^ (h >> 13)).wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Trilinearly interpolated value noise in `[0, 1)`.
pub fn value_noise(p: [f32; 3]) -> f32 {
    let [x, y, z] = p;
    let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
    let (ix, iy, iz) = (x0 as i32, y0 as i32, z0 as i32);
    let (tx, ty, tz) = (smooth(x - x0), smooth(y - y0), smooth(z - z0));

    // Far-out coordinates saturate to the i32 range; the hash wraps with them.
    let (jx, jy) = (ix.wrapping_add(1), iy.wrapping_add(1));
    let plane = |iz: i32| {
        let bottom = lerp(lattice(ix, iy, iz), lattice(jx, iy, iz), tx);
        let top = lerp(lattice(ix, jy, iz), lattice(jx, jy, iz), tx);
        lerp(bottom, top, ty)
    };

    lerp(plane(iz), plane(iz.wrapping_add(1)), tz)
}

/// Fractal sum of `octaves` noise layers, normalized to `[0, 1]`.
///
/// Returns 0 when `octaves` is 0.
pub fn fbm(p: [f32; 3], octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;

    for _ in 0..octaves {
        sum += amplitude * value_noise([p[0] * frequency, p[1] * frequency, p[2]]);
        norm += amplitude;
        amplitude *= GAIN;
        frequency *= LACUNARITY;
    }

    if norm > 0.0 { sum / norm } else { 0.0 }
}

/// Render-only noise sketch.
pub struct NoiseField {
    config: NoiseConfig,
}

impl NoiseField {
    pub fn new(config: NoiseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "noise: {}x{}, octaves={}, scale={}",
            config.width,
            config.height,
            config.octaves,
            config.scale
        );
        Ok(Self { config })
    }

    /// Sample the field at normalized coordinates `(u, v)` for a frame.
    #[inline]
    pub fn sample(&self, u: f32, v: f32, frame: u64, pointer: &Pointer) -> f32 {
        let freq = self.config.scale * BASE_FREQUENCY;
        let p = [
            (u + pointer.x) * freq,
            (v + pointer.y) * freq,
            frame as f32 * self.config.speed,
        ];
        fbm(p, self.config.octaves)
    }

    /// Render a full `width × height` frame.
    pub fn render(&self, frame: u64, pointer: &Pointer) -> Vec<f32> {
        let (width, height) = (self.config.width, self.config.height);
        let mut field = vec![0.0f32; width * height];

        let fill_row = |(y, row): (usize, &mut [f32])| {
            let v = y as f32 / height as f32;
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = self.sample(x as f32 / width as f32, v, frame, pointer);
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        field.par_chunks_mut(width).enumerate().for_each(fill_row);

        #[cfg(target_arch = "wasm32")]
        field.chunks_mut(width).enumerate().for_each(fill_row);

        log::trace!("noise frame {} rendered", frame);
        field
    }

    pub fn config_mut(&mut self) -> &mut NoiseConfig {
        &mut self.config
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }
}
