use rand::RngCore;
use tracing::{debug, info, warn};

use crate::capture::{StreamReport, Switchboard};
use crate::chain::{ChainPipeline, StageObserver};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::hasher::{Digest, Lyra2Stage, MemoryHardHasher, DIGEST_LEN};
use crate::input::InputGenerator;

const PROGRESS_INTERVAL: u64 = 100;

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub iterations: u64,
    pub streams: Vec<StreamReport>,
    /// Digest(7) of the last iteration, `None` for an empty run.
    pub last_output: Option<Digest>,
}

/// Generate the vector corpus described by `config`.
///
/// Parameters are validated and every capture stream is opened before the
/// first block is drawn. Any failure aborts the run; files already written
/// are left as they are.
pub fn generate_vectors(config: &GeneratorConfig) -> Result<RunSummary> {
    let pipeline = ChainPipeline::new(Lyra2Stage::new(config.lyra2)?);

    info!(
        "Generating {} vectors (seed {}, {} rng, lyra2 {})",
        config.iterations, config.seed, config.rng, config.lyra2
    );
    info!("Capturing: {}", config.capture);
    if !config.lyra2.matches_reference(2 * DIGEST_LEN) {
        warn!(
            "lyra2 {} absorbs its input differently from the C reference; vectors will not match it",
            config.lyra2
        );
    }

    let mut switchboard = Switchboard::open(&config.capture, &config.layout, config.create_dirs)?;
    let mut inputs = InputGenerator::new(config.rng.seeded(config.seed));

    let last_output = run_iterations(&pipeline, &mut inputs, config.iterations, &mut switchboard)?;
    let streams = switchboard.finish()?;

    for stream in &streams {
        debug!("{}: {} lines -> {}", stream.stage, stream.lines, stream.path.display());
    }
    info!("Generated {} vectors", config.iterations);

    Ok(RunSummary {
        iterations: config.iterations,
        streams,
        last_output,
    })
}

/// Draw `iterations` blocks and push each through the chain.
pub fn run_iterations<R, M, O>(
    pipeline: &ChainPipeline<M>,
    inputs: &mut InputGenerator<R>,
    iterations: u64,
    observer: &mut O,
) -> Result<Option<Digest>>
where
    R: RngCore,
    M: MemoryHardHasher,
    O: StageObserver + ?Sized,
{
    let mut last = None;
    for iteration in 0..iterations {
        let block = inputs.next_block();
        let trace = pipeline.run(&block, observer)?;
        last = Some(*trace.output());

        if iteration > 0 && iteration % PROGRESS_INTERVAL == 0 {
            debug!("{} vectors...", iteration);
        }
    }
    Ok(last)
}
