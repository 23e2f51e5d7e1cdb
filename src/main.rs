use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lyra2_vectors::capture::{CaptureSet, VectorLayout};
use lyra2_vectors::config::{DEFAULT_ITERATIONS, DEFAULT_SEED};
use lyra2_vectors::input::RngKind;
use lyra2_vectors::primitives::Lyra2Params;
use lyra2_vectors::{generate_vectors, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(name = "lyra2-vectors")]
#[command(about = "Lyra2REv2 testbench vector generator", long_about = None)]
struct Args {
    /// Number of test vectors per stream
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    count: u64,

    /// Generator seed (0 behaves like srand(0))
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u32,

    /// Input generator
    #[arg(long, value_enum, default_value_t = RngKind::Libc)]
    rng: RngKind,

    /// Stages to capture: names (blake,keccak,cube1,lyra2,skein,cube2,bmw),
    /// ordinals 1..7, or "none"
    #[arg(long, default_value = "lyra2")]
    capture: CaptureSet,

    /// Root of the HDL project
    #[arg(long, default_value = ".")]
    project_path: PathBuf,

    /// Write vector files directly under the project path
    #[arg(long)]
    flat: bool,

    /// Create missing vector directories
    #[arg(long)]
    create_dirs: bool,

    /// Lyra2 time cost
    #[arg(long, default_value_t = 1)]
    time_cost: u64,

    /// Lyra2 matrix rows (power of two, at least 4)
    #[arg(long, default_value_t = 4)]
    rows: u64,

    /// Lyra2 matrix columns (only 4 reproduces the C reference vectors)
    #[arg(long, default_value_t = 4)]
    cols: u64,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            iterations: self.count,
            seed: self.seed,
            rng: self.rng,
            lyra2: Lyra2Params {
                time_cost: self.time_cost,
                rows: self.rows,
                cols: self.cols,
            },
            capture: self.capture.clone(),
            layout: VectorLayout {
                root: self.project_path.clone(),
                flat: self.flat,
            },
            create_dirs: self.create_dirs,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("lyra2_vectors=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lyra2_vectors=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.config();
    info!("Project path: {}", config.layout.root.display());

    let summary = generate_vectors(&config).context("vector generation failed")?;
    for stream in &summary.streams {
        info!("{} ({} lines)", stream.path.display(), stream.lines);
    }

    println!("INFO :: Generated all testbench vectors.");
    Ok(())
}
