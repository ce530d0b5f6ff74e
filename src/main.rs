use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use ward_fusion::loader::{find_parquet_files, read_parquet_table, read_registry};
use ward_fusion::schema::PERIOD_SAMPLE_SIZE;
use ward_fusion::text::decode_bytes;
use ward_fusion::utils::logging::{create_main_progress_bar, finish_progress_bar};
use ward_fusion::{BoundaryRegistry, FusionConfig, FusionOutput, FusionPipeline, SchemaDetector};

/// Fuse facility test uploads with an administrative boundary registry
#[derive(Parser)]
#[command(name = "ward-fusion")]
#[command(version, about)]
struct Args {
    /// Boundary registry Parquet file
    #[arg(long, short = 'r')]
    registry: PathBuf,

    /// JSON run configuration; defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print each run's summary to stderr
    #[arg(long)]
    summary: bool,

    /// Cells sampled when testing a column for reporting periods
    #[arg(long, default_value_t = PERIOD_SAMPLE_SIZE)]
    period_sample_size: usize,

    /// Upload Parquet files or directories of them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<FusionConfig> {
    let Some(path) = path else {
        return Ok(FusionConfig::default());
    };
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read config: {}", path.display()))?;
    let (json, encoding) = decode_bytes(&bytes);
    if encoding != "UTF-8" {
        info!("Config {} decoded as {encoding}", path.display());
    }
    FusionConfig::from_json(&json)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

fn fuse_file(
    pipeline: &FusionPipeline,
    path: &Path,
    registry: &BoundaryRegistry,
) -> Result<FusionOutput> {
    let table = read_parquet_table(path)?;
    pipeline
        .run(&table, registry)
        .with_context(|| format!("Failed to fuse {}", path.display()))
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    info!("{config}");

    let start = Instant::now();
    let registry = read_registry(&args.registry)?;
    info!(
        "Loaded {} registry units from {} in {:?}",
        registry.len(),
        args.registry.display(),
        start.elapsed()
    );

    let detector = SchemaDetector::new().with_period_sample_size(args.period_sample_size);
    let pipeline = FusionPipeline::new(config)?.with_detector(detector);
    let files = find_parquet_files(&args.inputs)?;
    let pb = create_main_progress_bar(files.len() as u64, Some("Fusing uploads"));

    let outputs: Vec<(PathBuf, Result<FusionOutput>)> = files
        .par_iter()
        .map(|path| {
            let output = fuse_file(&pipeline, path, &registry);
            pb.inc(1);
            (path.clone(), output)
        })
        .collect();
    finish_progress_bar(&pb, Some("Fusion complete"));

    let mut failures = 0;
    for (path, output) in outputs {
        match output {
            Ok(output) => {
                if args.summary {
                    eprintln!("{}\n{}", path.display(), output.report.summary());
                }
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err(e) => {
                error!("{}: {e:#}", path.display());
                failures += 1;
            }
        }
    }

    info!(
        "Processed {} uploads ({failures} failed) in {:?}",
        files.len(),
        start.elapsed()
    );
    if failures > 0 {
        bail!("{failures} uploads failed");
    }
    Ok(())
}
