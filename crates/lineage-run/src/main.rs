//! Lineage Run - walks merger-tree files and writes tracked halo output
//!
//! The driver loads a TOML run configuration, builds the physics pipeline
//! and epoch table once, then processes the configured file range.
//! Independent tree files carry no shared state, so they fan out across a
//! rayon pool, each worker owning its per-tree contexts. A missing input
//! file is a normal skip; everything else fatal.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lineage_engine::{IndexCodec, TreeContext};
use lineage_foundation::{EngineConfig, EpochTable, SimParams};
use lineage_io::{snaplist, BinaryOutputSink, LHaloTreeFile, OutputSink, TreeSupplier};
use lineage_physics::{Pipeline, StageParams};

use config::RunConfig;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] lineage_io::Error),

    #[error(transparent)]
    Engine(#[from] lineage_engine::Error),

    #[error(transparent)]
    Physics(#[from] lineage_physics::Error),
}

#[derive(Parser, Debug)]
#[command(name = "lineage")]
#[command(about = "Track halo lineages through merger-tree files")]
struct Cli {
    /// Path to the run configuration (TOML)
    config: PathBuf,

    /// Process files sequentially instead of across a thread pool
    #[arg(long)]
    serial: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lineage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let cfg = RunConfig::load(&cli.config)?;
    let params = cfg.sim_params();

    let factors = snaplist::read_snap_list(&cfg.paths.snap_list)?;
    let epochs = EpochTable::from_expansion_factors(&factors, &params);
    info!(snapshots = epochs.len(), "epoch table built");

    let pipeline = Pipeline::from_names(
        &cfg.physics.stages,
        &StageParams::new(cfg.physics.params.clone()),
    )?;
    info!(stages = pipeline.len(), "physics pipeline assembled");

    let codec = IndexCodec::new(cfg.files.last);
    std::fs::create_dir_all(&cfg.paths.output_dir).map_err(lineage_io::Error::from)?;

    let files: Vec<i32> = (cfg.files.first..=cfg.files.last).collect();
    if cli.serial {
        for &filenr in &files {
            process_file(filenr, &cfg, &params, &epochs, &pipeline, &codec)?;
        }
    } else {
        files
            .par_iter()
            .try_for_each(|&filenr| process_file(filenr, &cfg, &params, &epochs, &pipeline, &codec))?;
    }

    info!(files = files.len(), "run complete");
    Ok(())
}

#[instrument(skip_all, fields(filenr = filenr))]
fn process_file(
    filenr: i32,
    cfg: &RunConfig,
    params: &SimParams,
    epochs: &EpochTable,
    pipeline: &Pipeline,
    codec: &IndexCodec,
) -> Result<(), RunError> {
    let path = cfg.tree_path(filenr);
    if !path.exists() {
        info!(path = %path.display(), "missing tree file, skipping");
        return Ok(());
    }

    let mut supplier = LHaloTreeFile::open(&path)?;
    let ntrees = supplier.tree_count();
    let mut sink = BinaryOutputSink::create(
        &cfg.paths.output_dir,
        &cfg.paths.output_base,
        filenr,
        &cfg.output.snapshots,
        epochs,
        ntrees,
    )?;

    let engine_cfg: EngineConfig = cfg.engine;
    for treenr in 0..ntrees {
        let tree = supplier.load_tree(treenr)?;
        let mut ctx = TreeContext::new(&tree, params, epochs, &engine_cfg, pipeline);
        ctx.process()?;
        let finished = ctx.finish(codec, filenr, treenr as i32, &cfg.output.snapshots)?;
        sink.write_tree(treenr, &finished)?;
    }

    sink.finalize()?;
    info!(filenr, ntrees, "file complete");
    Ok(())
}
