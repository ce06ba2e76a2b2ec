//! Vants: three populations of virtual ants sharing a pheromone grid.
//!
//! Every agent reads the pheromone under it, turns according to its
//! population's rule, toggles the pheromone, and steps one cell along its
//! new heading. Headings are measured in turns (1.0 = full circle), with
//! heading 0 pointing along +y.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::schema::{ConfigError, Seed, VANT_POPULATIONS, VantConfig};

use super::GridIndex;

/// Flag value a latching vant resets to when it finds a pheromone.
pub const LATCH_RESET: f32 = 10.0;

/// Vant record, laid out to match the WGSL `Vant` struct.
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
pub struct Vant {
    /// Cell position.
    pub pos: [f32; 2],
    /// Heading in turns.
    pub dir: f32,
    /// Behavior flag; its meaning depends on the population.
    pub flag: f32,
}
const _: () = assert!(
    std::mem::size_of::<Vant>() == 16,
    "size of Vant does not match WGSL"
);

impl Vant {
    pub fn new(x: f32, y: f32, dir: f32, flag: f32) -> Self {
        Self {
            pos: [x, y],
            dir,
            flag,
        }
    }
}

/// Turning behavior of a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Population {
    /// Quarter turns; flag selects the handedness (Langton's ant for flag 0).
    Orthogonal,
    /// Eighth turns; flag selects the handedness.
    Diagonal,
    /// Quarter turn on pheromone hits unless the countdown flag is exactly 0.
    Latching,
}

impl Population {
    pub const ALL: [Population; VANT_POPULATIONS] = [
        Population::Orthogonal,
        Population::Diagonal,
        Population::Latching,
    ];

    /// Apply the turning rule for the pheromone value under `vant`.
    ///
    /// Returns the pheromone value to write back to the cell.
    pub fn react(self, vant: &mut Vant, pheromone: f32) -> f32 {
        let found = pheromone != 0.0;
        let flag_clear = vant.flag == 0.0;

        match self {
            Population::Orthogonal | Population::Diagonal => {
                let turn = if self == Population::Orthogonal {
                    0.25
                } else {
                    0.125
                };
                if found {
                    vant.dir += if flag_clear { -turn } else { turn };
                    0.0
                } else {
                    vant.dir += if flag_clear { turn } else { -turn };
                    1.0
                }
            }
            Population::Latching => {
                if found {
                    vant.dir += if flag_clear { 0.0 } else { 0.25 };
                    vant.flag = LATCH_RESET;
                    0.0
                } else {
                    vant.flag -= 1.0;
                    1.0
                }
            }
        }
    }
}

/// Unit step for a heading in turns.
#[inline]
pub fn heading_vector(dir: f32) -> [f32; 2] {
    [(dir * TAU).sin(), (dir * TAU).cos()]
}

/// Shared grid plus the three vant populations.
pub struct VantWorld {
    pub grid: GridIndex,
    pub populations: [Vec<Vant>; VANT_POPULATIONS],
    /// Pheromone flag per cell (0 or 1).
    pub pheromones: Vec<f32>,
    /// Cells visited during the current frame; cleared every frame.
    pub render: Vec<f32>,
    /// Completed frames.
    pub frame: u64,
}

impl VantWorld {
    /// Create a world with explicit populations and an empty grid.
    pub fn new(grid: GridIndex, populations: [Vec<Vant>; VANT_POPULATIONS]) -> Self {
        Self {
            grid,
            populations,
            pheromones: vec![0.0; grid.len()],
            render: vec![0.0; grid.len()],
            frame: 0,
        }
    }

    /// Create state from seed.
    pub fn from_seed(seed: &Seed, config: &VantConfig) -> Self {
        let grid = GridIndex::new(config.grid_width(), config.grid_height());
        let populations = seed
            .vants(config)
            .map(|data| bytemuck::cast_slice::<f32, Vant>(&data).to_vec());
        Self::new(grid, populations)
    }

    /// Update one agent of one population in place.
    pub fn update_agent(&mut self, population: usize, index: usize) {
        let rule = Population::ALL[population];
        let grid = self.grid;
        let vant = &mut self.populations[population][index];

        let cell = grid.from_position(vant.pos);
        self.pheromones[cell] = rule.react(vant, self.pheromones[cell]);
        vant.dir = vant.dir.rem_euclid(1.0);

        let [dx, dy] = heading_vector(vant.dir);
        let moved = [(vant.pos[0] + dx).round(), (vant.pos[1] + dy).round()];
        vant.pos = grid.wrap_position(moved);

        self.render[cell] = 1.0;
    }

    /// Number of cells holding a pheromone.
    pub fn pheromone_cells(&self) -> usize {
        self.pheromones.iter().filter(|&&p| p != 0.0).count()
    }

    /// Number of cells visited this frame.
    pub fn marked_cells(&self) -> usize {
        self.render.iter().filter(|&&r| r > 0.0).count()
    }

    /// Largest population size.
    pub fn max_agents(&self) -> usize {
        self.populations.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// CPU vant propagator.
///
/// Agents are processed in invocation order; each index updates its agent in
/// population 1, then 2, then 3, as a single shader invocation would.
pub struct CpuVants {
    config: VantConfig,
}

impl CpuVants {
    /// Create a new propagator from configuration.
    pub fn new(config: VantConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "vants: {}x{} grid, {} agents x {} populations",
            config.grid_width(),
            config.grid_height(),
            config.agents_per_population,
            VANT_POPULATIONS
        );
        Ok(Self { config })
    }

    /// Run one frame.
    pub fn frame(&self, world: &mut VantWorld) {
        world.render.fill(0.0);

        // Invocations past `agents_per_population` exit early in the shader.
        let active = (self.config.invocations().min(self.config.agents_per_population) as usize)
            .min(world.max_agents());
        for index in 0..active {
            for population in 0..VANT_POPULATIONS {
                if index < world.populations[population].len() {
                    world.update_agent(population, index);
                }
            }
        }

        world.frame += 1;
    }

    /// Run several frames.
    pub fn run(&self, world: &mut VantWorld, frames: u64) {
        for _ in 0..frames {
            self.frame(world);
        }
    }

    pub fn config(&self) -> &VantConfig {
        &self.config
    }
}

/// Vant statistics for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VantStats {
    pub frame: u64,
    pub pheromone_cells: usize,
    pub pheromone_coverage: f32,
    pub marked_cells: usize,
}

impl VantStats {
    pub fn from_world(world: &VantWorld) -> Self {
        let pheromone_cells = world.pheromone_cells();
        Self {
            frame: world.frame,
            pheromone_cells,
            pheromone_coverage: pheromone_cells as f32 / world.grid.len() as f32,
            marked_cells: world.marked_cells(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> VantConfig {
        VantConfig {
            width: 64,
            height: 64,
            grid_size: 2,
            agents_per_population: 1,
            workgroup_size: 8,
            dispatch: [1, 1, 1],
            ..Default::default()
        }
    }

    fn single(population: Population, vant: Vant) -> VantWorld {
        let mut populations: [Vec<Vant>; VANT_POPULATIONS] = Default::default();
        let slot = Population::ALL
            .iter()
            .position(|p| *p == population)
            .unwrap();
        populations[slot] = vec![vant];
        VantWorld::new(GridIndex::new(32, 32), populations)
    }

    #[test]
    fn test_orthogonal_is_langtons_ant() {
        let propagator = CpuVants::new(small_config()).unwrap();
        let mut world = single(Population::Orthogonal, Vant::new(16.0, 16.0, 0.0, 0.0));

        // Empty cells: turn a quarter, leave a pheromone, move.
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [17.0, 16.0]);
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [17.0, 15.0]);
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [16.0, 15.0]);
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [16.0, 16.0]);
        assert_eq!(world.pheromone_cells(), 4);

        // Back on the start cell: pheromone found, turn the other way and clear it.
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [15.0, 16.0]);
        assert_eq!(world.pheromones[world.grid.flat(16, 16)], 0.0);
        assert_eq!(world.pheromone_cells(), 3);
    }

    #[test]
    fn test_flag_mirrors_orthogonal_turns() {
        let propagator = CpuVants::new(small_config()).unwrap();
        let mut world = single(Population::Orthogonal, Vant::new(16.0, 16.0, 0.0, 1.0));
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [15.0, 16.0]);
    }

    #[test]
    fn test_diagonal_moves_diagonally() {
        let propagator = CpuVants::new(small_config()).unwrap();
        let mut world = single(Population::Diagonal, Vant::new(16.0, 16.0, 0.0, 0.0));
        propagator.frame(&mut world);
        let vant = world.populations[1][0];
        assert!((vant.dir - 0.125).abs() < 1e-6);
        assert_eq!(vant.pos, [17.0, 17.0]);
    }

    #[test]
    fn test_agents_past_configured_count_stay_put() {
        let propagator = CpuVants::new(VantConfig {
            agents_per_population: 2,
            ..small_config()
        })
        .unwrap();
        let spawn: Vec<Vant> = (0..4)
            .map(|i| Vant::new(4.0 + 6.0 * i as f32, 8.0, 0.0, 0.0))
            .collect();
        let mut world = VantWorld::new(
            GridIndex::new(32, 32),
            [spawn.clone(), spawn.clone(), spawn.clone()],
        );

        propagator.frame(&mut world);
        for population in &world.populations {
            assert_ne!(population[0].pos, spawn[0].pos);
            assert_ne!(population[1].pos, spawn[1].pos);
            assert_eq!(&population[2..], &spawn[2..]);
        }
    }

    #[test]
    fn test_latching_rule() {
        let mut vant = Vant::new(0.0, 0.0, 0.0, 3.0);
        assert_eq!(Population::Latching.react(&mut vant, 0.0), 1.0);
        assert_eq!(vant.flag, 2.0);
        assert_eq!(vant.dir, 0.0);

        assert_eq!(Population::Latching.react(&mut vant, 1.0), 0.0);
        assert_eq!(vant.flag, LATCH_RESET);
        assert_eq!(vant.dir, 0.25);

        let mut latched = Vant::new(0.0, 0.0, 0.5, 0.0);
        Population::Latching.react(&mut latched, 1.0);
        assert_eq!(latched.dir, 0.5);
        assert_eq!(latched.flag, LATCH_RESET);
    }

    #[test]
    fn test_positions_wrap_around_grid() {
        let propagator = CpuVants::new(small_config()).unwrap();
        let mut world = single(Population::Orthogonal, Vant::new(31.0, 0.0, 0.0, 0.0));
        propagator.frame(&mut world);
        assert_eq!(world.populations[0][0].pos, [0.0, 0.0]);
    }

    #[test]
    fn test_render_marks_visited_cells_and_clears() {
        let propagator = CpuVants::new(small_config()).unwrap();
        let mut world = single(Population::Orthogonal, Vant::new(5.0, 5.0, 0.0, 0.0));

        propagator.frame(&mut world);
        assert_eq!(world.marked_cells(), 1);
        assert_eq!(world.render[world.grid.flat(5, 5)], 1.0);

        propagator.frame(&mut world);
        assert_eq!(world.marked_cells(), 1);
        assert_eq!(world.render[world.grid.flat(6, 5)], 1.0);
        assert_eq!(world.render[world.grid.flat(5, 5)], 0.0);
    }

    #[test]
    fn test_seeded_world_runs() {
        let config = VantConfig::default();
        let propagator = CpuVants::new(config.clone()).unwrap();
        let mut world = VantWorld::from_seed(&Seed::default(), &config);
        assert_eq!(world.max_agents(), 128);

        propagator.run(&mut world, 50);

        let stats = VantStats::from_world(&world);
        assert_eq!(stats.frame, 50);
        assert!(stats.pheromone_cells > 0);
        assert!(stats.marked_cells > 0 && stats.marked_cells <= 3 * 128);
        for population in &world.populations {
            for vant in population {
                assert!(world.grid.from_position(vant.pos) < world.grid.len());
                assert!((0.0..1.0).contains(&vant.dir));
            }
        }
    }
}
