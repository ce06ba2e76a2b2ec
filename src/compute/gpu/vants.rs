//! GPU vants.

use super::{GpuContext, GpuError};
use crate::compute::{Vant, VantWorld};
use crate::schema::{VANT_POPULATIONS, VantConfig};

const SHADER: &str = include_str!("shaders/vants.wgsl");

/// Uniform buffer struct for the vant shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct VantUniforms {
    grid_width: u32,
    grid_height: u32,
    agents: u32,
    row_width: u32,
}

/// GPU vant propagator.
///
/// Agents update in place, so there is no ping-pong pair; the render grid is
/// cleared with `clear_buffer` at the start of every frame.
pub struct GpuVants {
    ctx: GpuContext,
    config: VantConfig,
    pipeline: wgpu::ComputePipeline,
    population_buffers: [wgpu::Buffer; VANT_POPULATIONS],
    pheromone_buffer: wgpu::Buffer,
    render_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    staging_buffer: wgpu::Buffer,
    frame: u64,
}

impl GpuVants {
    /// Upload `world` and build the pipeline.
    pub fn new(ctx: &GpuContext, config: VantConfig, world: &VantWorld) -> Result<Self, GpuError> {
        config.validate()?;
        if world.grid.width != config.grid_width() || world.grid.height != config.grid_height() {
            return Err(GpuError::StateMismatch("grid dimensions"));
        }
        let agents = config.agents_per_population as usize;
        if world.populations.iter().any(|p| p.len() != agents) {
            return Err(GpuError::StateMismatch("population size"));
        }

        let module = ctx.shader("Vant Shader", SHADER);
        let layout = ctx.layout("Vant Bind Group Layout", 5);
        let pipeline = ctx.compute_pipeline(
            "Vant Pipeline",
            &module,
            "main",
            &layout,
            config.workgroup_size,
        );

        let uniform_buffer = ctx.uniform_buffer(
            "Vant Params",
            &VantUniforms {
                grid_width: config.grid_width() as u32,
                grid_height: config.grid_height() as u32,
                agents: config.agents_per_population,
                row_width: config.row_width(),
            },
        );
        let population_buffers: [wgpu::Buffer; VANT_POPULATIONS] = std::array::from_fn(|i| {
            ctx.storage_buffer(
                &format!("Vants {}", i + 1),
                bytemuck::cast_slice(&world.populations[i]),
            )
        });
        let pheromone_buffer =
            ctx.storage_buffer("Pheromones", bytemuck::cast_slice(&world.pheromones));
        let render_buffer = ctx.storage_buffer("Vant Render", bytemuck::cast_slice(&world.render));

        let bind_group = ctx.bind_group(
            "Vant Bind Group",
            &layout,
            &[
                &uniform_buffer,
                &population_buffers[0],
                &population_buffers[1],
                &population_buffers[2],
                &pheromone_buffer,
                &render_buffer,
            ],
        );

        let cells = world.grid.len() * std::mem::size_of::<f32>();
        let records = VANT_POPULATIONS * agents * std::mem::size_of::<Vant>();
        let staging_buffer = ctx.staging_buffer("Vant Staging", (2 * cells + records) as u64);

        log::info!(
            "GPU vants: {}x{} grid, {} agents x {} populations, dispatch {:?}",
            config.grid_width(),
            config.grid_height(),
            config.agents_per_population,
            VANT_POPULATIONS,
            config.dispatch
        );

        Ok(Self {
            ctx: ctx.clone(),
            config,
            pipeline,
            population_buffers,
            pheromone_buffer,
            render_buffer,
            bind_group,
            staging_buffer,
            frame: world.frame,
        })
    }

    /// Run one frame: clear the render grid, then one dispatch.
    pub fn frame(&mut self) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Vant Frame Encoder"),
            });

        encoder.clear_buffer(&self.render_buffer, 0, None);
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Vant Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            let [x, y, z] = self.config.dispatch;
            pass.dispatch_workgroups(x, y, z);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.frame += 1;
        log::trace!("GPU vants frame {}", self.frame);
    }

    /// Run several frames.
    pub fn run(&mut self, frames: u64) {
        for _ in 0..frames {
            self.frame();
        }
    }

    pub fn config(&self) -> &VantConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Copy the GPU state (agents, pheromones, render grid) into `world`.
    pub async fn sync_state(&self, world: &mut VantWorld) -> Result<(), GpuError> {
        let data = self
            .ctx
            .read_buffers(
                &[
                    &self.pheromone_buffer,
                    &self.render_buffer,
                    &self.population_buffers[0],
                    &self.population_buffers[1],
                    &self.population_buffers[2],
                ],
                &self.staging_buffer,
            )
            .await?;

        let cells = world.grid.len();
        world.pheromones.copy_from_slice(&data[..cells]);
        world.render.copy_from_slice(&data[cells..2 * cells]);

        let records: &[Vant] = bytemuck::cast_slice(&data[2 * cells..]);
        let agents = self.config.agents_per_population as usize;
        for (population, chunk) in world.populations.iter_mut().zip(records.chunks(agents)) {
            population.copy_from_slice(chunk);
        }

        world.frame = self.frame;
        Ok(())
    }
}
