//! GPU Gray-Scott reaction-diffusion.

use super::{GpuContext, GpuError};
use crate::compute::{ChemicalField, Pointer, ReactionDiffusionState, workgroups_for};
use crate::schema::{ReactionDiffusionConfig, ReactionDiffusionParams};

const SHADER: &str = include_str!("shaders/reaction_diffusion.wgsl");

/// Uniform buffer struct for the reaction-diffusion shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct RdUniforms {
    width: u32,
    height: u32,
    da: f32,
    db: f32,
    feed: f32,
    kill: f32,
    dt: f32,
    multiplier: f32,
    pointer: [f32; 2],
    radius: f32,
    pressed: f32,
}
const _: () = assert!(
    std::mem::size_of::<RdUniforms>() == 48,
    "size of RdUniforms does not match WGSL"
);

/// One set of chemical buffers.
struct FieldBuffers {
    a: wgpu::Buffer,
    b: wgpu::Buffer,
    delta: wgpu::Buffer,
}

impl FieldBuffers {
    fn new(ctx: &GpuContext, label: &str, field: &ChemicalField) -> Self {
        Self {
            a: ctx.storage_buffer(&format!("{label} A"), bytemuck::cast_slice(&field.a)),
            b: ctx.storage_buffer(&format!("{label} B"), bytemuck::cast_slice(&field.b)),
            delta: ctx.storage_buffer(
                &format!("{label} Delta"),
                bytemuck::cast_slice(&field.delta),
            ),
        }
    }
}

/// GPU reaction-diffusion propagator.
///
/// Bind group `i` reads field set `i` and writes set `1 - i`. A pass runs
/// with the bind group of the current read set and flips `read`.
pub struct GpuReactionDiffusion {
    ctx: GpuContext,
    config: ReactionDiffusionConfig,
    pointer: Pointer,

    step_pipeline: wgpu::ComputePipeline,
    inject_pipeline: wgpu::ComputePipeline,

    uniform_buffer: wgpu::Buffer,
    fields: [FieldBuffers; 2],
    bind_groups: [wgpu::BindGroup; 2],
    staging_buffer: wgpu::Buffer,

    read: usize,
    passes: u64,
    frame: u64,
}

impl GpuReactionDiffusion {
    /// Upload `state` and build the pipelines.
    pub fn new(
        ctx: &GpuContext,
        config: ReactionDiffusionConfig,
        state: &ReactionDiffusionState,
    ) -> Result<Self, GpuError> {
        config.validate()?;
        if state.width != config.width || state.height != config.height {
            return Err(GpuError::StateMismatch("grid dimensions"));
        }

        let module = ctx.shader("Reaction Diffusion Shader", SHADER);
        let layout = ctx.layout("Reaction Diffusion Bind Group Layout", 5);
        let step_pipeline = ctx.compute_pipeline(
            "Reaction Diffusion Pipeline",
            &module,
            "main",
            &layout,
            config.workgroup_size,
        );
        let inject_pipeline = ctx.compute_pipeline(
            "Reaction Diffusion Inject Pipeline",
            &module,
            "inject",
            &layout,
            config.workgroup_size,
        );

        let pointer = Pointer::default();
        let uniform_buffer = ctx.uniform_buffer(
            "Reaction Diffusion Params",
            &uniforms(&config, &pointer),
        );

        let current = state.current();
        let fields = [
            FieldBuffers::new(ctx, "Field 0", current),
            FieldBuffers::new(ctx, "Field 1", &ChemicalField::zeros(config.grid_size())),
        ];
        let bind_groups = [0, 1].map(|i| {
            let (src, dst) = (&fields[i], &fields[1 - i]);
            ctx.bind_group(
                "Reaction Diffusion Bind Group",
                &layout,
                &[&uniform_buffer, &src.a, &src.b, &dst.a, &dst.b, &dst.delta],
            )
        });

        let field_bytes = (config.grid_size() * std::mem::size_of::<f32>()) as u64;
        let staging_buffer = ctx.staging_buffer("Reaction Diffusion Staging", 3 * field_bytes);

        log::info!(
            "GPU reaction-diffusion: {}x{} grid, {} passes/frame, workgroup {}",
            config.width,
            config.height,
            config.passes,
            config.workgroup_size
        );

        Ok(Self {
            ctx: ctx.clone(),
            config,
            pointer,
            step_pipeline,
            inject_pipeline,
            uniform_buffer,
            fields,
            bind_groups,
            staging_buffer,
            read: 0,
            passes: state.passes(),
            frame: state.frame,
        })
    }

    /// Run one frame: pointer painting, then `passes` compute passes, in a
    /// single submission.
    pub fn frame(&mut self) {
        let uniforms = uniforms(&self.config, &self.pointer);
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Reaction Diffusion Frame Encoder"),
            });

        let wg = self.config.workgroup_size;
        let groups_x = workgroups_for(self.config.width as u32, wg);
        let groups_y = workgroups_for(self.config.height as u32, wg);

        if self.pointer.pressed {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Reaction Diffusion Inject Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.inject_pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.read], &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        for _ in 0..self.config.passes {
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Reaction Diffusion Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.step_pipeline);
                pass.set_bind_group(0, &self.bind_groups[self.read], &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }
            self.read = 1 - self.read;
            self.passes += 1;
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.frame += 1;
        log::trace!("GPU reaction-diffusion frame {}", self.frame);
    }

    /// Run several frames.
    pub fn run(&mut self, frames: u64) {
        for _ in 0..frames {
            self.frame();
        }
    }

    pub fn set_pointer(&mut self, pointer: Pointer) {
        self.pointer = pointer;
    }

    /// Mutable parameters; changes are uploaded at the next frame.
    pub fn params_mut(&mut self) -> &mut ReactionDiffusionParams {
        &mut self.config.params
    }

    pub fn config(&self) -> &ReactionDiffusionConfig {
        &self.config
    }

    /// Read back the current field set.
    pub async fn read_field(&self) -> Result<ChemicalField, GpuError> {
        let set = &self.fields[self.read];
        let data = self
            .ctx
            .read_buffers(&[&set.a, &set.b, &set.delta], &self.staging_buffer)
            .await?;

        let size = self.config.grid_size();
        Ok(ChemicalField {
            a: data[..size].to_vec(),
            b: data[size..2 * size].to_vec(),
            delta: data[2 * size..3 * size].to_vec(),
        })
    }

    /// Copy the GPU state into `state`'s read buffer and counters.
    pub async fn sync_state(&self, state: &mut ReactionDiffusionState) -> Result<(), GpuError> {
        let field = self.read_field().await?;
        *state.fields.read_mut() = field;
        state.frame = self.frame;
        Ok(())
    }

    /// Compute passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

fn uniforms(config: &ReactionDiffusionConfig, pointer: &Pointer) -> RdUniforms {
    let params = &config.params;
    let (px, py) = pointer.to_cells(config.width, config.height);
    RdUniforms {
        width: config.width as u32,
        height: config.height as u32,
        da: params.da,
        db: params.db,
        feed: params.feed,
        kill: params.kill,
        dt: params.dt,
        multiplier: params.multiplier,
        pointer: [px, py],
        radius: config.brush_radius,
        pressed: if pointer.pressed { 1.0 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::CpuReactionDiffusion;
    use crate::schema::{SeedRegion, Seed};

    fn test_config() -> ReactionDiffusionConfig {
        ReactionDiffusionConfig {
            width: 48,
            height: 32,
            seed_region: SeedRegion {
                center: (0.5, 0.5),
                half_extent: 6,
            },
            passes: 4,
            workgroup_size: 8,
            ..Default::default()
        }
    }

    fn context() -> Option<GpuContext> {
        match pollster::block_on(GpuContext::new()) {
            Ok(ctx) => Some(ctx),
            Err(GpuError::NoAdapter) => {
                eprintln!("Skipping GPU test: no adapter available");
                None
            }
            Err(e) => panic!("Failed to create GPU context: {:?}", e),
        }
    }

    #[test]
    fn test_gpu_cpu_equivalence() {
        let Some(ctx) = context() else { return };
        let config = test_config();
        let seed = Seed::default();

        let mut cpu_state = ReactionDiffusionState::from_seed(&seed, &config);
        let mut gpu = GpuReactionDiffusion::new(&ctx, config.clone(), &cpu_state).unwrap();
        let cpu = CpuReactionDiffusion::new(config).unwrap();

        cpu.run(&mut cpu_state, 5);
        gpu.run(5);
        assert_eq!(gpu.passes(), cpu_state.passes());

        let field = pollster::block_on(gpu.read_field()).unwrap();
        let expected = cpu_state.current();
        let max_diff = field
            .b
            .iter()
            .zip(&expected.b)
            .map(|(g, c)| (g - c).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff < 1e-4, "GPU/CPU B mismatch: {max_diff}");
    }

    #[test]
    fn test_gpu_pointer_injection() {
        let Some(ctx) = context() else { return };
        let config = ReactionDiffusionConfig {
            passes: 1,
            ..test_config()
        };
        let state = ReactionDiffusionState::uniform(config.width, config.height, 1.0, 0.0);
        let mut gpu = GpuReactionDiffusion::new(&ctx, config, &state).unwrap();

        gpu.set_pointer(Pointer::new(0.25, 0.5, true));
        gpu.frame();

        let field = pollster::block_on(gpu.read_field()).unwrap();
        let center = 16 * 48 + 12;
        assert!(field.b[center] > 0.5);
        assert_eq!(field.b[0], 0.0);
    }

    #[test]
    fn test_state_mismatch_rejected() {
        let Some(ctx) = context() else { return };
        let state = ReactionDiffusionState::uniform(8, 8, 1.0, 0.0);
        assert!(matches!(
            GpuReactionDiffusion::new(&ctx, test_config(), &state),
            Err(GpuError::StateMismatch(_))
        ));
    }
}
