//! GPU sketchbook CLI - Run a sketch from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use gpu_sketchbook::{
    GpuContext, GpuSketch, Sketch, SketchError,
    animation::{AnimationRecorder, RecorderConfig},
    compute::render,
    schema::{Seed, SketchConfig},
};

/// Parsed command-line options.
struct Options {
    config_path: PathBuf,
    frames: u64,
    record: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    gpu: bool,
    seed: Option<u64>,
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).map(String::as_str) == Some("--example") {
        let name = args.get(2).map(String::as_str).unwrap_or("reaction_diffusion");
        if let Err(e) = print_example_config(name) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let options = match parse_args(&args) {
        Some(options) => options,
        None => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <config.json> [frames] [--record out.skan] [--snapshot out.png] \
         [--gpu] [--seed N]",
        program
    );
    eprintln!();
    eprintln!("Run a sketch from JSON configuration.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json        Path to sketch configuration file");
    eprintln!("  frames             Number of frames to run (default: 100)");
    eprintln!("  --record PATH      Record every frame to a .skan animation");
    eprintln!("  --snapshot PATH    Save the final frame as PNG");
    eprintln!("  --gpu              Run on the wgpu compute backend");
    eprintln!("  --seed N           RNG seed (default: config.seed.json or 42)");
    eprintln!();
    eprintln!("Print a default configuration with --example <sketch>, where sketch is one of");
    eprintln!("noise, reaction_diffusion, particles, vants, nbody.");
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut positional = Vec::new();
    let mut record = None;
    let mut snapshot = None;
    let mut gpu = false;
    let mut seed = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--record" => record = Some(PathBuf::from(iter.next()?)),
            "--snapshot" => snapshot = Some(PathBuf::from(iter.next()?)),
            "--gpu" => gpu = true,
            "--seed" => seed = Some(iter.next()?.parse().ok()?),
            flag if flag.starts_with("--") => return None,
            value => positional.push(value),
        }
    }

    let config_path = PathBuf::from(positional.first()?);
    let frames = match positional.get(1) {
        Some(s) => s.parse().ok()?,
        None => 100,
    };

    Some(Options {
        config_path,
        frames,
        record,
        snapshot,
        gpu,
        seed,
    })
}

fn load_seed(options: &Options) -> Result<Seed, SketchError> {
    if let Some(rng_seed) = options.seed {
        return Ok(Seed::new(rng_seed));
    }
    let seed_path = options.config_path.with_extension("seed.json");
    if seed_path.exists() {
        let seed_str = fs::read_to_string(&seed_path)?;
        return Ok(serde_json::from_str(&seed_str)?);
    }
    Ok(Seed::default())
}

fn run(options: Options) -> Result<(), SketchError> {
    let config_str = fs::read_to_string(&options.config_path)?;
    let config: SketchConfig = serde_json::from_str(&config_str)?;
    let seed = load_seed(&options)?;
    let frames = options.frames;

    println!("GPU Sketchbook");
    println!("==============");
    println!("Sketch: {}", config.name());
    println!("Seed: {}", seed.rng_seed);
    println!("Frames: {}", frames);
    println!("Backend: {}", if options.gpu { "gpu" } else { "cpu" });
    println!();

    let mut sketch = Sketch::new(config, &seed)?;
    let (width, height) = sketch.grid_size();
    println!("Grid: {}x{}", width, height);
    println!("Initial state:");
    println!("  {}", sketch.stats());
    println!();

    let mut gpu = if options.gpu {
        let ctx = pollster::block_on(GpuContext::new())?;
        Some(GpuSketch::new(&ctx, &sketch)?)
    } else {
        None
    };

    let mut recorder = match &options.record {
        Some(path) => Some(AnimationRecorder::create(
            path,
            &sketch.grid_frame(),
            RecorderConfig::default(),
        )?),
        None => None,
    };

    log::info!("Running {} frames...", frames);
    let start = Instant::now();

    for i in 0..frames {
        match &mut gpu {
            Some(backend) => backend.frame(),
            None => sketch.frame(),
        }

        let report = (i + 1) % (frames / 10).max(1) == 0;
        if let Some(backend) = &gpu
            && (recorder.is_some() || report)
        {
            pollster::block_on(backend.sync(&mut sketch))?;
        }

        if let Some(recorder) = &mut recorder {
            recorder.record_frame(&sketch.grid_frame())?;
        }

        // Progress every 10%
        if report {
            let elapsed = start.elapsed().as_secs_f32();
            log::info!(
                "Frame {}/{}: {}, {:.1} frames/s",
                i + 1,
                frames,
                sketch.stats(),
                (i + 1) as f32 / elapsed
            );
        }
    }

    if let Some(backend) = &gpu {
        pollster::block_on(backend.sync(&mut sketch))?;
    }
    let elapsed = start.elapsed();

    if let Some(recorder) = recorder {
        let stats = recorder.finalize()?;
        println!("Recording: {}", stats);
    }

    if let Some(path) = &options.snapshot {
        let (canvas_width, canvas_height) = sketch.canvas_size();
        render::save_png(path, canvas_width, canvas_height, &sketch.rgba())?;
        println!("Snapshot: {} ({}x{})", path.display(), canvas_width, canvas_height);
    }

    println!();
    println!("Final state:");
    println!("  {}", sketch.stats());
    println!();
    println!(
        "Time: {:.2}s ({:.1} frames/s)",
        elapsed.as_secs_f32(),
        frames as f32 / elapsed.as_secs_f32()
    );

    Ok(())
}

fn print_example_config(name: &str) -> Result<(), SketchError> {
    let Some(config) = SketchConfig::default_for(name) else {
        eprintln!("Unknown sketch: {}", name);
        std::process::exit(1);
    };
    let seed = Seed::default();

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("Example seed (config.seed.json):");
    println!("{}", serde_json::to_string_pretty(&seed)?);
    Ok(())
}
