//! GPU particle advection.

use super::{GpuContext, GpuError};
use crate::compute::{Particle, ParticleSystem};
use crate::schema::ParticleConfig;

const SHADER: &str = include_str!("shaders/particles.wgsl");

/// Uniform buffer struct for the particle shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleUniforms {
    ts: f32,
    t: f32,
    count: u32,
    _pad: u32,
}

/// GPU particle propagator with two ping-ponged particle buffers.
pub struct GpuParticles {
    ctx: GpuContext,
    config: ParticleConfig,
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    particle_buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
    staging_buffer: wgpu::Buffer,
    read: usize,
    frame: u64,
}

impl GpuParticles {
    /// Upload `system` and build the pipeline.
    pub fn new(
        ctx: &GpuContext,
        config: ParticleConfig,
        system: &ParticleSystem,
    ) -> Result<Self, GpuError> {
        config.validate()?;
        if system.len() != config.count as usize {
            return Err(GpuError::StateMismatch("particle count"));
        }

        let module = ctx.shader("Particle Shader", SHADER);
        let layout = ctx.layout("Particle Bind Group Layout", 2);
        let pipeline = ctx.compute_pipeline(
            "Particle Pipeline",
            &module,
            "main",
            &layout,
            config.workgroup_size,
        );

        let uniform_buffer =
            ctx.uniform_buffer("Particle Params", &uniforms(&config, system.frame));
        let scratch = vec![Particle::default(); system.len()];
        let particle_buffers = [
            ctx.storage_buffer("Particles 0", bytemuck::cast_slice(system.current())),
            ctx.storage_buffer("Particles 1", bytemuck::cast_slice(&scratch)),
        ];
        let bind_groups = [0, 1].map(|i| {
            ctx.bind_group(
                "Particle Bind Group",
                &layout,
                &[
                    &uniform_buffer,
                    &particle_buffers[i],
                    &particle_buffers[1 - i],
                ],
            )
        });
        let staging_buffer = ctx.staging_buffer(
            "Particle Staging",
            (system.len() * std::mem::size_of::<Particle>()) as u64,
        );

        log::info!(
            "GPU particles: {} particles, {} workgroups x {} passes",
            config.count,
            config.dispatch_count(),
            config.passes
        );

        Ok(Self {
            ctx: ctx.clone(),
            config,
            pipeline,
            uniform_buffer,
            particle_buffers,
            bind_groups,
            staging_buffer,
            read: 0,
            frame: system.frame,
        })
    }

    /// Run one frame of `passes` passes in a single submission.
    pub fn frame(&mut self) {
        let uniforms = uniforms(&self.config, self.frame);
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Frame Encoder"),
            });

        for _ in 0..self.config.passes {
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Particle Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_groups[self.read], &[]);
                pass.dispatch_workgroups(self.config.dispatch_count(), 1, 1);
            }
            self.read = 1 - self.read;
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.frame += 1;
        log::trace!("GPU particles frame {}", self.frame);
    }

    /// Run several frames.
    pub fn run(&mut self, frames: u64) {
        for _ in 0..frames {
            self.frame();
        }
    }

    /// Mutable configuration; `ts` changes are uploaded at the next frame.
    pub fn config_mut(&mut self) -> &mut ParticleConfig {
        &mut self.config
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Read back the current particle buffer.
    pub async fn read_particles(&self) -> Result<Vec<Particle>, GpuError> {
        let data = self
            .ctx
            .read_buffers(&[&self.particle_buffers[self.read]], &self.staging_buffer)
            .await?;
        Ok(bytemuck::cast_slice(&data).to_vec())
    }

    /// Copy the GPU state into `system`.
    pub async fn sync_state(&self, system: &mut ParticleSystem) -> Result<(), GpuError> {
        let particles = self.read_particles().await?;
        system.particles.read_mut().copy_from_slice(&particles);
        system.frame = self.frame;
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

fn uniforms(config: &ParticleConfig, frame: u64) -> ParticleUniforms {
    ParticleUniforms {
        ts: config.ts,
        t: frame as f32 * config.ts,
        count: config.count,
        _pad: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::CpuParticles;
    use crate::schema::Seed;

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

    fn test_config() -> ParticleConfig {
        ParticleConfig {
            count: 256,
            ts: 0.01,
            passes: 5,
            workgroup_size: 8,
        }
    }

    #[test]
    fn test_gpu_cpu_equivalence() {
        let Some(ctx) = context() else { return };
        let config = test_config();

        let mut system = ParticleSystem::from_seed(&Seed::default(), &config);
        let mut gpu = GpuParticles::new(&ctx, config.clone(), &system).unwrap();
        let cpu = CpuParticles::new(config).unwrap();

        cpu.run(&mut system, 3);
        gpu.run(3);

        let particles = pollster::block_on(gpu.read_particles()).unwrap();
        assert_eq!(particles.len(), system.len());
        for (g, c) in particles.iter().zip(system.current()) {
            for axis in 0..2 {
                // Allow for wrap-around at the clip-space seam.
                let d = (g.pos[axis] - c.pos[axis]).abs();
                assert!(d < 1e-3 || (2.0 - d) < 1e-3, "GPU {:?} vs CPU {:?}", g, c);
            }
        }
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let Some(ctx) = context() else { return };
        let system = ParticleSystem::from_particles(vec![Particle::default(); 64]);
        assert!(matches!(
            GpuParticles::new(&ctx, test_config(), &system),
            Err(GpuError::StateMismatch(_))
        ));
    }
}
