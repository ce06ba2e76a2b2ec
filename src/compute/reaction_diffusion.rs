//! CPU Gray-Scott reaction-diffusion.
//!
//! Two chemicals A and B diffuse over a toroidal grid. A is fed in, B
//! consumes A to replicate and is killed off. Each pass reads the current
//! fields from one side of a ping-pong pair and writes the other.

use crate::schema::{ConfigError, ReactionDiffusionConfig, ReactionDiffusionParams, Seed};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{GridIndex, PingPong, Pointer};

/// 3x3 Laplacian weights: center, edge neighbors, corner neighbors.
const LAPLACE_CENTER: f32 = -1.0;
const LAPLACE_EDGE: f32 = 0.2;
const LAPLACE_CORNER: f32 = 0.05;

/// B concentration above which a cell counts as active.
const ACTIVE_THRESHOLD: f32 = 1e-3;

/// One full set of chemical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalField {
    /// Concentration of chemical A.
    pub a: Vec<f32>,
    /// Concentration of chemical B.
    pub b: Vec<f32>,
    /// Change in B produced by the last pass.
    pub delta: Vec<f32>,
}

impl ChemicalField {
    pub fn zeros(size: usize) -> Self {
        Self {
            a: vec![0.0; size],
            b: vec![0.0; size],
            delta: vec![0.0; size],
        }
    }
}

/// Reaction-diffusion state: ping-ponged fields plus counters.
pub struct ReactionDiffusionState {
    pub width: usize,
    pub height: usize,
    pub fields: PingPong<ChemicalField>,
    /// Completed frames.
    pub frame: u64,
}

impl ReactionDiffusionState {
    /// Create state from seed.
    pub fn from_seed(seed: &Seed, config: &ReactionDiffusionConfig) -> Self {
        let (a, b) = seed.reaction_diffusion(config);
        let size = config.grid_size();
        let initial = ChemicalField {
            a,
            b,
            delta: vec![0.0; size],
        };
        Self {
            width: config.width,
            height: config.height,
            fields: PingPong::new(initial, ChemicalField::zeros(size)),
            frame: 0,
        }
    }

    /// Create a uniform state (every cell holds `a`, `b`).
    pub fn uniform(width: usize, height: usize, a: f32, b: f32) -> Self {
        let size = width * height;
        let initial = ChemicalField {
            a: vec![a; size],
            b: vec![b; size],
            delta: vec![0.0; size],
        };
        Self {
            width,
            height,
            fields: PingPong::new(initial, ChemicalField::zeros(size)),
            frame: 0,
        }
    }

    /// Fields written by the most recent pass.
    #[inline]
    pub fn current(&self) -> &ChemicalField {
        self.fields.read()
    }

    #[inline]
    pub fn grid(&self) -> GridIndex {
        GridIndex::new(self.width, self.height)
    }

    /// Passes run so far.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.fields.generation()
    }

    /// Paint chemical B at full strength within `radius` cells of `(cx, cy)`.
    pub fn inject(&mut self, cx: f32, cy: f32, radius: f32) {
        let grid = self.grid();
        let r = radius.max(0.0);
        let reach = r.ceil() as i64;
        let (ix, iy) = (cx.floor() as i64, cy.floor() as i64);
        let field = self.fields.read_mut();

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if ((dx * dx + dy * dy) as f32) <= r * r {
                    field.b[grid.wrap(ix + dx, iy + dy)] = 1.0;
                }
            }
        }
    }
}

/// CPU reaction-diffusion propagator.
pub struct CpuReactionDiffusion {
    config: ReactionDiffusionConfig,
    pointer: Pointer,
}

impl CpuReactionDiffusion {
    /// Create a new propagator from configuration.
    pub fn new(config: ReactionDiffusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "reaction-diffusion: {}x{} grid, {} passes/frame",
            config.width,
            config.height,
            config.passes
        );
        Ok(Self {
            config,
            pointer: Pointer::default(),
        })
    }

    /// Perform one compute pass.
    pub fn step(&self, state: &mut ReactionDiffusionState) {
        let width = state.width;
        let height = state.height;
        let params = self.config.params;

        let (current, next) = state.fields.split_mut();

        #[cfg(not(target_arch = "wasm32"))]
        {
            next.a
                .par_chunks_mut(width)
                .zip(next.b.par_chunks_mut(width))
                .zip(next.delta.par_chunks_mut(width))
                .enumerate()
                .for_each(|(y, ((row_a, row_b), row_delta))| {
                    update_row(current, &params, width, height, y, row_a, row_b, row_delta);
                });
        }

        #[cfg(target_arch = "wasm32")]
        {
            next.a
                .chunks_mut(width)
                .zip(next.b.chunks_mut(width))
                .zip(next.delta.chunks_mut(width))
                .enumerate()
                .for_each(|(y, ((row_a, row_b), row_delta))| {
                    update_row(current, &params, width, height, y, row_a, row_b, row_delta);
                });
        }

        state.fields.swap();
    }

    /// Run one frame: pointer painting, then `passes` compute passes.
    pub fn frame(&self, state: &mut ReactionDiffusionState) {
        if self.pointer.pressed {
            let (px, py) = self.pointer.to_cells(state.width, state.height);
            state.inject(px, py, self.config.brush_radius);
        }
        for _ in 0..self.config.passes {
            self.step(state);
        }
        state.frame += 1;
        log::trace!("reaction-diffusion frame {}", state.frame);
    }

    /// Run several frames.
    pub fn run(&self, state: &mut ReactionDiffusionState, frames: u64) {
        for _ in 0..frames {
            self.frame(state);
        }
    }

    pub fn set_pointer(&mut self, pointer: Pointer) {
        self.pointer = pointer;
    }

    /// Mutable parameters, e.g. for `Tunable::set_param`.
    pub fn params_mut(&mut self) -> &mut ReactionDiffusionParams {
        &mut self.config.params
    }

    pub fn config(&self) -> &ReactionDiffusionConfig {
        &self.config
    }
}

#[allow(clippy::too_many_arguments)]
fn update_row(
    current: &ChemicalField,
    params: &ReactionDiffusionParams,
    width: usize,
    height: usize,
    y: usize,
    row_a: &mut [f32],
    row_b: &mut [f32],
    row_delta: &mut [f32],
) {
    let up = (y + height - 1) % height * width;
    let mid = y * width;
    let down = (y + 1) % height * width;

    for x in 0..width {
        let left = (x + width - 1) % width;
        let right = (x + 1) % width;

        let lap = |f: &[f32]| -> f32 {
            LAPLACE_CENTER * f[mid + x]
                + LAPLACE_EDGE * (f[up + x] + f[down + x] + f[mid + left] + f[mid + right])
                + LAPLACE_CORNER
                    * (f[up + left] + f[up + right] + f[down + left] + f[down + right])
        };

        let a = current.a[mid + x];
        let b = current.b[mid + x];
        let reaction = a * b * b;
        let kill = params.kill + params.multiplier * (x as f32 / width as f32);

        let next_a =
            a + (params.da * lap(&current.a) - reaction + params.feed * (1.0 - a)) * params.dt;
        let next_b =
            b + (params.db * lap(&current.b) + reaction - (kill + params.feed) * b) * params.dt;

        let next_a = next_a.clamp(0.0, 1.0);
        let next_b = next_b.clamp(0.0, 1.0);

        row_a[x] = next_a;
        row_b[x] = next_b;
        row_delta[x] = next_b - b;
    }
}

/// Reaction-diffusion statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReactionDiffusionStats {
    pub total_a: f32,
    pub total_b: f32,
    pub min_b: f32,
    pub max_b: f32,
    pub active_cells: usize,
}

impl ReactionDiffusionStats {
    /// Compute statistics from state.
    pub fn from_state(state: &ReactionDiffusionState) -> Self {
        let field = state.current();
        let mut min_b = f32::INFINITY;
        let mut max_b = f32::NEG_INFINITY;
        let mut active_cells = 0usize;

        for &b in &field.b {
            min_b = min_b.min(b);
            max_b = max_b.max(b);
            if b > ACTIVE_THRESHOLD {
                active_cells += 1;
            }
        }

        Self {
            total_a: field.a.iter().sum(),
            total_b: field.b.iter().sum(),
            min_b,
            max_b,
            active_cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SeedRegion;

    fn test_config() -> ReactionDiffusionConfig {
        ReactionDiffusionConfig {
            width: 48,
            height: 32,
            seed_region: SeedRegion {
                center: (0.5, 0.5),
                half_extent: 4,
            },
            passes: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_unreacted_steady_state_is_fixed_point() {
        let config = test_config();
        let propagator = CpuReactionDiffusion::new(config.clone()).unwrap();
        let mut state = ReactionDiffusionState::uniform(config.width, config.height, 1.0, 0.0);

        propagator.run(&mut state, 4);

        let field = state.current();
        assert!(field.a.iter().all(|&a| (a - 1.0).abs() < 1e-6));
        assert!(field.b.iter().all(|&b| b == 0.0));
        assert!(field.delta.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_fields_stay_bounded() {
        let config = test_config();
        let propagator = CpuReactionDiffusion::new(config.clone()).unwrap();
        let mut state = ReactionDiffusionState::from_seed(&Seed::default(), &config);

        propagator.run(&mut state, 20);

        let field = state.current();
        assert!(field.a.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(field.b.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(state.frame, 20);
        assert_eq!(state.passes(), 100);
    }

    #[test]
    fn test_seed_region_spreads() {
        let config = test_config();
        let propagator = CpuReactionDiffusion::new(config.clone()).unwrap();
        let mut state = ReactionDiffusionState::uniform(config.width, config.height, 1.0, 0.0);
        state.inject(24.0, 16.0, 3.0);
        let initial = ReactionDiffusionStats::from_state(&state);

        propagator.frame(&mut state);

        let after = ReactionDiffusionStats::from_state(&state);
        assert!(after.active_cells > initial.active_cells);
        // Cells far from the seed are untouched after a single frame.
        let field = state.current();
        assert_eq!(field.b[0], 0.0);
    }

    #[test]
    fn test_laplacian_wraps_edges() {
        let config = ReactionDiffusionConfig {
            width: 8,
            height: 8,
            passes: 1,
            ..test_config()
        };
        let propagator = CpuReactionDiffusion::new(config).unwrap();
        let mut state = ReactionDiffusionState::uniform(8, 8, 1.0, 0.0);
        state.fields.read_mut().b[0] = 1.0;

        propagator.step(&mut state);

        let field = state.current();
        // Neighbors across both seams receive B by diffusion.
        assert!(field.b[7] > 0.0);
        assert!(field.b[7 * 8] > 0.0);
        assert!(field.b[7 * 8 + 7] > 0.0);
        assert_eq!(field.b[4 * 8 + 4], 0.0);
    }

    #[test]
    fn test_pointer_paints_before_passes() {
        let config = test_config();
        let mut propagator = CpuReactionDiffusion::new(config.clone()).unwrap();
        let mut state = ReactionDiffusionState::uniform(config.width, config.height, 1.0, 0.0);

        propagator.set_pointer(Pointer::new(0.25, 0.25, true));
        propagator.frame(&mut state);
        assert!(state.current().b[8 * 48 + 12] > 0.0);

        let mut idle = ReactionDiffusionState::uniform(config.width, config.height, 1.0, 0.0);
        propagator.set_pointer(Pointer::new(0.25, 0.25, false));
        propagator.frame(&mut idle);
        assert!(idle.current().b.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_kill_gradient_changes_right_side() {
        let mut config = test_config();
        config.params.multiplier = 0.07;
        let graded = CpuReactionDiffusion::new(config.clone()).unwrap();
        config.params.multiplier = 0.0;
        let flat = CpuReactionDiffusion::new(config.clone()).unwrap();

        let mut a = ReactionDiffusionState::uniform(config.width, config.height, 0.5, 0.25);
        let mut b = ReactionDiffusionState::uniform(config.width, config.height, 0.5, 0.25);
        graded.step(&mut a);
        flat.step(&mut b);

        // x = 0 has no extra kill; the right edge loses more B.
        assert_eq!(a.current().b[0], b.current().b[0]);
        assert!(a.current().b[47] < b.current().b[47]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReactionDiffusionConfig {
            passes: 0,
            ..test_config()
        };
        assert!(CpuReactionDiffusion::new(config).is_err());
    }
}
