//! Runtime wrapper that drives any sketch from its configuration.

use std::fmt;

use crate::animation::GridFrame;
use crate::compute::gpu::{GpuContext, GpuParticles, GpuReactionDiffusion, GpuVants};
use crate::compute::{
    CpuNbody, CpuParticles, CpuReactionDiffusion, CpuVants, NbodyStats, NbodySystem, NoiseField,
    ParticleSystem, Pointer, ReactionDiffusionState, ReactionDiffusionStats, VantStats, VantWorld,
    render,
};
use crate::schema::{ConfigError, Seed, SketchConfig, Tunable};
use crate::SketchError;

/// Edge length of the density canvas for sketches without a native grid.
pub const CANVAS_SIZE: usize = 256;

/// A sketch with its CPU propagator and state.
pub enum Sketch {
    Noise {
        field: NoiseField,
        pointer: Pointer,
        frame: u64,
    },
    ReactionDiffusion {
        propagator: CpuReactionDiffusion,
        state: ReactionDiffusionState,
    },
    Particles {
        propagator: CpuParticles,
        system: ParticleSystem,
    },
    Vants {
        propagator: CpuVants,
        world: VantWorld,
    },
    Nbody {
        propagator: CpuNbody,
        system: NbodySystem,
    },
}

impl Sketch {
    /// Validate `config` and seed the initial state.
    pub fn new(config: SketchConfig, seed: &Seed) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!("Creating {} sketch (seed {})", config.name(), seed.rng_seed);
        Ok(match config {
            SketchConfig::Noise(c) => Sketch::Noise {
                field: NoiseField::new(c)?,
                pointer: Pointer::default(),
                frame: 0,
            },
            SketchConfig::ReactionDiffusion(c) => Sketch::ReactionDiffusion {
                state: ReactionDiffusionState::from_seed(seed, &c),
                propagator: CpuReactionDiffusion::new(c)?,
            },
            SketchConfig::Particles(c) => Sketch::Particles {
                system: ParticleSystem::from_seed(seed, &c),
                propagator: CpuParticles::new(c)?,
            },
            SketchConfig::Vants(c) => Sketch::Vants {
                world: VantWorld::from_seed(seed, &c),
                propagator: CpuVants::new(c)?,
            },
            SketchConfig::Nbody(c) => Sketch::Nbody {
                system: NbodySystem::from_seed(seed, &c),
                propagator: CpuNbody::new(c)?,
            },
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sketch::Noise { .. } => "noise",
            Sketch::ReactionDiffusion { .. } => "reaction_diffusion",
            Sketch::Particles { .. } => "particles",
            Sketch::Vants { .. } => "vants",
            Sketch::Nbody { .. } => "nbody",
        }
    }

    /// Advance one frame.
    pub fn frame(&mut self) {
        match self {
            Sketch::Noise { frame, .. } => *frame += 1,
            Sketch::ReactionDiffusion { propagator, state } => propagator.frame(state),
            Sketch::Particles { propagator, system } => propagator.frame(system),
            Sketch::Vants { propagator, world } => propagator.frame(world),
            Sketch::Nbody { propagator, system } => propagator.step(system),
        }
    }

    /// Frames completed so far.
    pub fn frame_count(&self) -> u64 {
        match self {
            Sketch::Noise { frame, .. } => *frame,
            Sketch::ReactionDiffusion { state, .. } => state.frame,
            Sketch::Particles { system, .. } => system.frame,
            Sketch::Vants { world, .. } => world.frame,
            Sketch::Nbody { system, .. } => system.step,
        }
    }

    /// Set a tunable parameter, returning the clamped value actually applied.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<f32, ConfigError> {
        match self {
            Sketch::Noise { field, .. } => field.config_mut().set_param(name, value),
            Sketch::ReactionDiffusion { propagator, .. } => {
                propagator.params_mut().set_param(name, value)
            }
            Sketch::Particles { propagator, .. } => propagator.config_mut().set_param(name, value),
            Sketch::Vants { .. } | Sketch::Nbody { .. } => {
                Err(ConfigError::UnknownParam(name.to_string()))
            }
        }
    }

    /// Update the pointer; only the noise and reaction-diffusion sketches use it.
    pub fn set_pointer(&mut self, next: Pointer) {
        match self {
            Sketch::Noise { pointer, .. } => *pointer = next,
            Sketch::ReactionDiffusion { propagator, .. } => propagator.set_pointer(next),
            _ => {}
        }
    }

    /// Simulation grid `(width, height)` in cells.
    pub fn grid_size(&self) -> (usize, usize) {
        match self {
            Sketch::Noise { field, .. } => (field.config().width, field.config().height),
            Sketch::ReactionDiffusion { state, .. } => (state.width, state.height),
            Sketch::Vants { world, .. } => (world.grid.width, world.grid.height),
            Sketch::Particles { .. } | Sketch::Nbody { .. } => (CANVAS_SIZE, CANVAS_SIZE),
        }
    }

    /// Pixel size of [`Sketch::rgba`].
    pub fn canvas_size(&self) -> (usize, usize) {
        let (width, height) = self.grid_size();
        let scale = self.pixel_scale();
        (width * scale, height * scale)
    }

    fn pixel_scale(&self) -> usize {
        match self {
            Sketch::Vants { propagator, .. } => propagator.config().grid_size.max(1),
            _ => 1,
        }
    }

    /// Current state as a multi-channel grid, for recording.
    pub fn grid_frame(&self) -> GridFrame {
        let (width, height) = self.grid_size();
        match self {
            Sketch::Noise {
                field,
                pointer,
                frame,
            } => GridFrame::single(width, height, field.render(*frame, pointer)),
            Sketch::ReactionDiffusion { state, .. } => {
                let current = state.current();
                GridFrame {
                    width,
                    height,
                    channels: vec![current.a.clone(), current.b.clone()],
                }
            }
            Sketch::Particles { system, .. } => {
                GridFrame::single(width, height, system.rasterize(width, height))
            }
            Sketch::Vants { world, .. } => GridFrame {
                width,
                height,
                channels: vec![world.pheromones.clone(), world.render.clone()],
            },
            Sketch::Nbody { system, .. } => {
                GridFrame::single(width, height, system.project(width, height))
            }
        }
    }

    /// Colorized RGBA8 frame of [`Sketch::canvas_size`].
    pub fn rgba(&self) -> Vec<u8> {
        let (width, height) = self.grid_size();
        let pixels = match self {
            Sketch::Noise {
                field,
                pointer,
                frame,
            } => render::grayscale(&field.render(*frame, pointer)),
            Sketch::ReactionDiffusion { propagator, state } => {
                render::reaction_diffusion(state.current(), propagator.config().params.scale)
            }
            Sketch::Particles { system, .. } => render::density(&system.rasterize(width, height)),
            Sketch::Vants { world, .. } => render::vants(&world.pheromones, &world.render),
            Sketch::Nbody { system, .. } => render::density(&system.project(width, height)),
        };
        render::upscale(&pixels, width, height, self.pixel_scale())
    }

    pub fn stats(&self) -> SketchStats {
        match self {
            Sketch::Noise { field, .. } => SketchStats::Noise {
                frame: self.frame_count(),
                octaves: field.config().octaves,
            },
            Sketch::ReactionDiffusion { state, .. } => {
                SketchStats::ReactionDiffusion(ReactionDiffusionStats::from_state(state))
            }
            Sketch::Particles { system, .. } => SketchStats::Particles {
                count: system.len(),
                mean_speed: system.mean_speed(),
            },
            Sketch::Vants { world, .. } => SketchStats::Vants(VantStats::from_world(world)),
            Sketch::Nbody { system, .. } => SketchStats::Nbody(NbodyStats::from_system(system)),
        }
    }
}

/// Per-sketch statistics for reporting.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "sketch", rename_all = "snake_case")]
pub enum SketchStats {
    Noise { frame: u64, octaves: u32 },
    ReactionDiffusion(ReactionDiffusionStats),
    Particles { count: usize, mean_speed: f32 },
    Vants(VantStats),
    Nbody(NbodyStats),
}

impl fmt::Display for SketchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchStats::Noise { frame, octaves } => {
                write!(f, "frame={}, octaves={}", frame, octaves)
            }
            SketchStats::ReactionDiffusion(s) => write!(
                f,
                "total A={:.3}, total B={:.3}, B range=[{:.4}, {:.4}], active={}",
                s.total_a, s.total_b, s.min_b, s.max_b, s.active_cells
            ),
            SketchStats::Particles { count, mean_speed } => {
                write!(f, "particles={}, mean speed={:.4}", count, mean_speed)
            }
            SketchStats::Vants(s) => write!(
                f,
                "pheromones={} ({:.2}%), marked={}",
                s.pheromone_cells,
                s.pheromone_coverage * 100.0,
                s.marked_cells
            ),
            SketchStats::Nbody(s) => write!(
                f,
                "t={:.3e}, momentum=({:.3e}, {:.3e}, {:.3e}), com=({:.3e}, {:.3e}, {:.3e})",
                s.time,
                s.momentum[0],
                s.momentum[1],
                s.momentum[2],
                s.center_of_mass[0],
                s.center_of_mass[1],
                s.center_of_mass[2]
            ),
        }
    }
}

/// GPU propagator mirroring a [`Sketch`]'s state.
pub enum GpuSketch {
    ReactionDiffusion(GpuReactionDiffusion),
    Particles(GpuParticles),
    Vants(GpuVants),
}

impl GpuSketch {
    /// Upload `sketch`'s state to the GPU.
    pub fn new(ctx: &GpuContext, sketch: &Sketch) -> Result<Self, SketchError> {
        Ok(match sketch {
            Sketch::ReactionDiffusion { propagator, state } => GpuSketch::ReactionDiffusion(
                GpuReactionDiffusion::new(ctx, propagator.config().clone(), state)?,
            ),
            Sketch::Particles { propagator, system } => GpuSketch::Particles(GpuParticles::new(
                ctx,
                propagator.config().clone(),
                system,
            )?),
            Sketch::Vants { propagator, world } => {
                GpuSketch::Vants(GpuVants::new(ctx, propagator.config().clone(), world)?)
            }
            other => return Err(SketchError::NoGpuBackend(other.name())),
        })
    }

    pub fn frame(&mut self) {
        match self {
            GpuSketch::ReactionDiffusion(gpu) => gpu.frame(),
            GpuSketch::Particles(gpu) => gpu.frame(),
            GpuSketch::Vants(gpu) => gpu.frame(),
        }
    }

    /// Pointer updates apply to reaction-diffusion only.
    pub fn set_pointer(&mut self, pointer: Pointer) {
        if let GpuSketch::ReactionDiffusion(gpu) = self {
            gpu.set_pointer(pointer);
        }
    }

    /// Read GPU state back into `sketch`.
    pub async fn sync(&self, sketch: &mut Sketch) -> Result<(), SketchError> {
        match (self, sketch) {
            (GpuSketch::ReactionDiffusion(gpu), Sketch::ReactionDiffusion { state, .. }) => {
                gpu.sync_state(state).await?
            }
            (GpuSketch::Particles(gpu), Sketch::Particles { system, .. }) => {
                gpu.sync_state(system).await?
            }
            (GpuSketch::Vants(gpu), Sketch::Vants { world, .. }) => gpu.sync_state(world).await?,
            (_, sketch) => return Err(SketchError::NoGpuBackend(sketch.name())),
        }
        Ok(())
    }
}
