//! Benchmarks for the CPU sketch propagators.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use gpu_sketchbook::{
    compute::{
        CpuNbody, CpuParticles, CpuReactionDiffusion, CpuVants, NbodySystem, NoiseField,
        ParticleSystem, Pointer, ReactionDiffusionState, VantWorld,
    },
    schema::{
        NbodyConfig, NoiseConfig, ParticleConfig, ReactionDiffusionConfig, Seed, SeedRegion,
        VantConfig,
    },
};

fn bench_reaction_diffusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("reaction_diffusion_frame");

    for size in [64, 128, 256, 512] {
        let config = ReactionDiffusionConfig {
            width: size,
            height: size,
            seed_region: SeedRegion {
                center: (0.5, 0.5),
                half_extent: size / 8,
            },
            passes: 5,
            ..Default::default()
        };

        let propagator = CpuReactionDiffusion::new(config.clone()).unwrap();
        let mut state = ReactionDiffusionState::from_seed(&Seed::default(), &config);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| {
                    propagator.frame(black_box(&mut state));
                });
            },
        );
    }

    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particles_frame");

    for count in [1024, 4096, 16384] {
        let config = ParticleConfig {
            count,
            passes: 10,
            ..Default::default()
        };

        let propagator = CpuParticles::new(config.clone()).unwrap();
        let mut system = ParticleSystem::from_seed(&Seed::default(), &config);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                propagator.frame(black_box(&mut system));
            });
        });
    }

    group.finish();
}

fn bench_vants(c: &mut Criterion) {
    let config = VantConfig::default();
    let propagator = CpuVants::new(config.clone()).unwrap();
    let mut world = VantWorld::from_seed(&Seed::default(), &config);

    c.bench_function("vants_frame", |b| {
        b.iter(|| {
            propagator.frame(black_box(&mut world));
        });
    });
}

fn bench_nbody(c: &mut Criterion) {
    let mut group = c.benchmark_group("nbody_step");

    for count in [256, 1024] {
        let config = NbodyConfig {
            count,
            ..Default::default()
        };

        let propagator = CpuNbody::new(config.clone()).unwrap();
        let mut system = NbodySystem::from_seed(&Seed::default(), &config);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                propagator.step(black_box(&mut system));
            });
        });
    }

    group.finish();
}

fn bench_noise(c: &mut Criterion) {
    let field = NoiseField::new(NoiseConfig {
        width: 256,
        height: 256,
        ..Default::default()
    })
    .unwrap();
    let pointer = Pointer::new(0.5, 0.5, false);

    c.bench_function("noise_render_256x256", |b| {
        let mut frame = 0;
        b.iter(|| {
            frame += 1;
            black_box(field.render(frame, &pointer));
        });
    });
}

criterion_group!(
    benches,
    bench_reaction_diffusion,
    bench_particles,
    bench_vants,
    bench_nbody,
    bench_noise
);
criterion_main!(benches);
