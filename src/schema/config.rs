//! Configuration types for each sketch.

use serde::{Deserialize, Serialize};

use super::{ParamSpec, Tunable};

/// Largest workgroup edge whose square fits the default invocation limit.
pub const MAX_WORKGROUP_SIZE: u32 = 16;

/// Top-level sketch selection, tagged by `"sketch"` in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "sketch", rename_all = "snake_case")]
pub enum SketchConfig {
    Noise(NoiseConfig),
    ReactionDiffusion(ReactionDiffusionConfig),
    Particles(ParticleConfig),
    Vants(VantConfig),
    Nbody(NbodyConfig),
}

impl SketchConfig {
    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            SketchConfig::Noise(_) => "noise",
            SketchConfig::ReactionDiffusion(_) => "reaction_diffusion",
            SketchConfig::Particles(_) => "particles",
            SketchConfig::Vants(_) => "vants",
            SketchConfig::Nbody(_) => "nbody",
        }
    }

    /// Default configuration for a sketch name.
    pub fn default_for(name: &str) -> Option<Self> {
        match name {
            "noise" => Some(SketchConfig::Noise(NoiseConfig::default())),
            "reaction_diffusion" => Some(SketchConfig::ReactionDiffusion(
                ReactionDiffusionConfig::default(),
            )),
            "particles" => Some(SketchConfig::Particles(ParticleConfig::default())),
            "vants" => Some(SketchConfig::Vants(VantConfig::default())),
            "nbody" => Some(SketchConfig::Nbody(NbodyConfig::default())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SketchConfig::Noise(c) => c.validate(),
            SketchConfig::ReactionDiffusion(c) => c.validate(),
            SketchConfig::Particles(c) => c.validate(),
            SketchConfig::Vants(c) => c.validate(),
            SketchConfig::Nbody(c) => c.validate(),
        }
    }
}

/// Fractal noise field parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub width: usize,
    pub height: usize,
    /// Number of fbm octaves (0-10).
    pub octaves: u32,
    /// Spatial frequency multiplier.
    pub scale: f32,
    /// Animation speed per frame.
    pub speed: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            octaves: 3,
            scale: 1.0,
            speed: 0.05,
        }
    }
}

const NOISE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("octaves").range(0.0, 10.0).step(1.0),
    ParamSpec::new("scale").at_least(0.01).step(0.05),
    ParamSpec::new("speed").at_least(0.0).step(0.01),
];

impl Tunable for NoiseConfig {
    fn param_specs() -> &'static [ParamSpec] {
        NOISE_PARAMS
    }

    fn get_param(&self, name: &str) -> Option<f32> {
        match name {
            "octaves" => Some(self.octaves as f32),
            "scale" => Some(self.scale),
            "speed" => Some(self.speed),
            _ => None,
        }
    }

    fn store_param(&mut self, name: &str, value: f32) {
        match name {
            "octaves" => self.octaves = value as u32,
            "scale" => self.scale = value,
            "speed" => self.speed = value,
            _ => {}
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimensions(self.width, self.height)?;
        self.validate_params()
    }
}

/// Gray-Scott reaction rates and display controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionDiffusionParams {
    /// Diffusion rate of chemical A.
    pub da: f32,
    /// Diffusion rate of chemical B.
    pub db: f32,
    /// Feed rate.
    pub feed: f32,
    /// Kill rate.
    pub kill: f32,
    /// Integration step.
    pub dt: f32,
    /// Display gain applied when colorizing.
    pub scale: f32,
    /// Kill-rate gradient across the x axis.
    pub multiplier: f32,
}

impl Default for ReactionDiffusionParams {
    fn default() -> Self {
        Self {
            da: 1.0,
            db: 0.2,
            feed: 0.0367,
            kill: 0.0649,
            dt: 0.75,
            scale: 1.0,
            multiplier: 0.0,
        }
    }
}

const REACTION_DIFFUSION_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("DA").range(0.0, 1.0),
    ParamSpec::new("DB").range(0.0, 1.0),
    ParamSpec::new("F").range(0.0, 0.1),
    ParamSpec::new("K").range(0.0, 0.1),
    ParamSpec::new("DT").range(0.0, 1.0),
    ParamSpec::new("scale").range(0.0, 5.0),
    ParamSpec::new("multiplier").range(-0.07, 0.07),
];

impl Tunable for ReactionDiffusionParams {
    fn param_specs() -> &'static [ParamSpec] {
        REACTION_DIFFUSION_PARAMS
    }

    fn get_param(&self, name: &str) -> Option<f32> {
        match name {
            "DA" => Some(self.da),
            "DB" => Some(self.db),
            "F" => Some(self.feed),
            "K" => Some(self.kill),
            "DT" => Some(self.dt),
            "scale" => Some(self.scale),
            "multiplier" => Some(self.multiplier),
            _ => None,
        }
    }

    fn store_param(&mut self, name: &str, value: f32) {
        match name {
            "DA" => self.da = value,
            "DB" => self.db = value,
            "F" => self.feed = value,
            "K" => self.kill = value,
            "DT" => self.dt = value,
            "scale" => self.scale = value,
            "multiplier" => self.multiplier = value,
            _ => {}
        }
    }
}

/// Square block where chemical B starts at full concentration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedRegion {
    /// Center as a fraction of grid size (may sit on an edge; cells wrap).
    pub center: (f32, f32),
    /// Half the side length, in cells.
    pub half_extent: usize,
}

impl Default for SeedRegion {
    fn default() -> Self {
        Self {
            center: (1.0, 0.5),
            half_extent: 100,
        }
    }
}

/// Reaction-diffusion sketch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionDiffusionConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub params: ReactionDiffusionParams,
    #[serde(default)]
    pub seed_region: SeedRegion,
    /// Compute passes per frame.
    pub passes: u32,
    /// Workgroup edge length for the GPU backend.
    pub workgroup_size: u32,
    /// Radius in cells painted with chemical B while the pointer is pressed.
    #[serde(default = "default_brush_radius")]
    pub brush_radius: f32,
}

fn default_brush_radius() -> f32 {
    8.0
}

impl Default for ReactionDiffusionConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            params: ReactionDiffusionParams::default(),
            seed_region: SeedRegion::default(),
            passes: 5,
            workgroup_size: 8,
            brush_radius: default_brush_radius(),
        }
    }
}

impl ReactionDiffusionConfig {
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimensions(self.width, self.height)?;
        if self.passes == 0 {
            return Err(ConfigError::InvalidPasses);
        }
        check_workgroup_size(self.workgroup_size)?;
        let max_radius = self.width.max(self.height) as f32;
        if !(0.0..=max_radius).contains(&self.brush_radius) {
            return Err(ConfigError::InvalidBrushRadius {
                radius: self.brush_radius,
                max: max_radius,
            });
        }
        self.params.validate_params()
    }
}

/// Particle advection sketch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleConfig {
    /// Number of particles.
    pub count: u32,
    /// Time step per pass.
    pub ts: f32,
    /// Compute passes per frame.
    pub passes: u32,
    /// Workgroup edge length; each workgroup covers `workgroup_size²` particles.
    pub workgroup_size: u32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 1024,
            ts: 0.01,
            passes: 100,
            workgroup_size: 8,
        }
    }
}

const PARTICLE_PARAMS: &[ParamSpec] = &[ParamSpec::new("ts").range(0.01, 1.0).step(0.01)];

impl Tunable for ParticleConfig {
    fn param_specs() -> &'static [ParamSpec] {
        PARTICLE_PARAMS
    }

    fn get_param(&self, name: &str) -> Option<f32> {
        match name {
            "ts" => Some(self.ts),
            _ => None,
        }
    }

    fn store_param(&mut self, name: &str, value: f32) {
        if name == "ts" {
            self.ts = value;
        }
    }
}

impl ParticleConfig {
    /// Workgroups needed to cover all particles.
    #[inline]
    pub fn dispatch_count(&self) -> u32 {
        self.count / self.workgroup_size.saturating_mul(self.workgroup_size).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::InvalidCount);
        }
        if self.passes == 0 {
            return Err(ConfigError::InvalidPasses);
        }
        check_workgroup_size(self.workgroup_size)?;
        let group = self.workgroup_size * self.workgroup_size;
        if self.count % group != 0 {
            return Err(ConfigError::CountNotDivisible {
                count: self.count,
                group,
            });
        }
        self.validate_params()
    }
}

/// Vant (virtual ant) sketch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VantConfig {
    /// Canvas width in pixels.
    pub width: usize,
    /// Canvas height in pixels.
    pub height: usize,
    /// Pixels per grid cell.
    pub grid_size: usize,
    /// Agents in each of the three populations.
    pub agents_per_population: u32,
    /// Workgroup edge length.
    pub workgroup_size: u32,
    /// Workgroups dispatched per frame.
    pub dispatch: [u32; 3],
    /// Fractional window (start, span) agents spawn inside on both axes.
    #[serde(default = "default_spawn_window")]
    pub spawn_window: (f32, f32),
}

fn default_spawn_window() -> (f32, f32) {
    (0.45, 0.1)
}

impl Default for VantConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            grid_size: 2,
            agents_per_population: 128,
            workgroup_size: 8,
            dispatch: [2, 1, 1],
            spawn_window: default_spawn_window(),
        }
    }
}

impl VantConfig {
    /// Grid width in cells.
    #[inline]
    pub fn grid_width(&self) -> usize {
        (self.width as f32 / self.grid_size as f32).round() as usize
    }

    /// Grid height in cells.
    #[inline]
    pub fn grid_height(&self) -> usize {
        (self.height as f32 / self.grid_size as f32).round() as usize
    }

    /// Total shader invocations per frame.
    #[inline]
    pub fn invocations(&self) -> u32 {
        self.dispatch
            .iter()
            .fold(self.workgroup_size.saturating_mul(self.workgroup_size), |acc, &d| {
                acc.saturating_mul(d)
            })
    }

    /// Invocations per row of the global dispatch grid.
    #[inline]
    pub fn row_width(&self) -> u32 {
        self.dispatch[0].saturating_mul(self.workgroup_size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        check_dimensions(self.grid_width(), self.grid_height())?;
        if self.agents_per_population == 0 {
            return Err(ConfigError::InvalidCount);
        }
        check_workgroup_size(self.workgroup_size)?;
        if self.invocations() < self.agents_per_population {
            return Err(ConfigError::DispatchTooSmall {
                invocations: self.invocations(),
                agents: self.agents_per_population,
            });
        }
        let (start, span) = self.spawn_window;
        if !(0.0..=1.0).contains(&start) || span < 0.0 || start + span > 1.0 {
            return Err(ConfigError::InvalidSpawnWindow);
        }
        Ok(())
    }
}

/// Two-cluster gravitational n-body configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbodyConfig {
    /// Number of stars (split evenly across the two clusters).
    pub count: usize,
    /// Gravitational constant.
    pub gravity: f32,
    /// Plummer softening length.
    pub softening: f32,
    /// Integration step.
    pub dt: f32,
    /// Distance of each cluster from the origin along x.
    pub cluster_offset: f32,
    /// Side length of each cluster cube.
    pub cluster_extent: f32,
    /// Upper bound of the uniform mass distribution.
    pub max_mass: f32,
}

impl Default for NbodyConfig {
    fn default() -> Self {
        Self {
            count: 1024,
            gravity: 6.674e-11,
            softening: 1.0e7,
            dt: 10.0,
            cluster_offset: 1.0e9,
            cluster_extent: 9.0e8,
            max_mass: 5.0e29,
        }
    }
}

impl NbodyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::InvalidCount);
        }
        if self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep);
        }
        if self.softening <= 0.0 || self.cluster_extent <= 0.0 || self.max_mass < 0.0 {
            return Err(ConfigError::InvalidCluster);
        }
        Ok(())
    }
}

fn check_workgroup_size(workgroup_size: u32) -> Result<(), ConfigError> {
    if workgroup_size == 0 || workgroup_size > MAX_WORKGROUP_SIZE {
        return Err(ConfigError::InvalidWorkgroupSize);
    }
    Ok(())
}

fn check_dimensions(width: usize, height: usize) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidDimensions);
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Passes per frame must be non-zero")]
    InvalidPasses,
    #[error("Workgroup size must be between 1 and 16")]
    InvalidWorkgroupSize,
    #[error("Agent/particle count must be non-zero")]
    InvalidCount,
    #[error("Time step must be positive")]
    InvalidTimeStep,
    #[error("Cluster extent, softening and mass bound must be positive")]
    InvalidCluster,
    #[error("Brush radius {radius} outside [0, {max}]")]
    InvalidBrushRadius { radius: f32, max: f32 },
    #[error("Spawn window must lie within [0, 1]")]
    InvalidSpawnWindow,
    #[error("Count {count} is not divisible by workgroup population {group}")]
    CountNotDivisible { count: u32, group: u32 },
    #[error("Dispatch covers {invocations} invocations but {agents} agents are configured")]
    DispatchTooSmall { invocations: u32, agents: u32 },
    #[error("Parameter {name} = {value} outside [{min}, {max}]")]
    ParamOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("Parameter {name} must be finite")]
    NonFiniteParam { name: &'static str },
    #[error("Unknown parameter: {0}")]
    UnknownParam(String),
}
