//! Compute ego graphs for many bands against one loaded graph.
//!
//! Usage: ego-batch <database> <bands.txt> <out_dir> [--workers N]

use anyhow::{bail, Context, Result};
use band_ego_graph::models::{CenterRef, PresentationMode};
use band_ego_graph::progress::{create_progress_bar, create_spinner, format_duration, log_progress};
use band_ego_graph::{run_query, EgoConfig, EgoError, QueryParams, SimilarityGraph};
use clap::Parser;
use log::warn;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ego-batch")]
#[command(about = "Build ego graph JSON files for a list of bands in parallel")]
struct Args {
    database: PathBuf,

    /// One band name per line; blank lines and lines starting with '#' are skipped
    bands: PathBuf,

    /// Directory for <band_id>.json files (created if missing)
    out_dir: PathBuf,

    #[arg(long, default_value = "0")]
    workers: usize,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    radius: Option<i64>,

    #[arg(long)]
    max_nodes: Option<i64>,

    #[arg(long)]
    mode: Option<PresentationMode>,

    #[arg(long)]
    log_only: bool,

    /// Exit non-zero if any band fails (default: only if all fail)
    #[arg(long)]
    strict: bool,
}

fn read_band_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read band list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Decide the exit status from the failure count.
fn check_failures(total: usize, failed: usize, strict: bool) -> Result<()> {
    if total > 0 && failed == total {
        bail!("All {} bands failed", total);
    }
    if strict && failed > 0 {
        bail!("{} of {} bands failed", failed, total);
    }
    Ok(())
}

fn write_one(
    graph: &SimilarityGraph,
    config: &EgoConfig,
    out_dir: &Path,
    band: &str,
) -> std::result::Result<PathBuf, EgoError> {
    let params = QueryParams::new(CenterRef::Name(band.to_string()), config);
    let outcome = run_query(graph, config, &params)?;
    let path = out_dir.join(format!("{}.json", outcome.center));
    let file = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(file), &outcome.response)?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let mut config = match &args.config {
        Some(path) => EgoConfig::from_file(path)?,
        None => EgoConfig::default(),
    };
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    if let Some(max_nodes) = args.max_nodes {
        config.max_nodes = max_nodes;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    config.validate()?;

    let bands = read_band_list(&args.bands)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let start = Instant::now();

    let spinner = create_spinner("Phase 1: Loading similarity graph", args.log_only);
    let graph = SimilarityGraph::open(&args.database)
        .context("Failed to load similarity graph")?;
    spinner.finish_with_message(format!(
        "Phase 1: Loaded {} bands, {} similarities",
        graph.node_count(),
        graph.edge_count()
    ));

    let total = bands.len() as u64;
    let pb = create_progress_bar(total, "Phase 2: Building ego graphs", args.log_only);
    let done = AtomicU64::new(0);

    let failures: Vec<(String, EgoError)> = bands
        .par_iter()
        .filter_map(|band| {
            let result = write_one(&graph, &config, &args.out_dir, band);
            pb.inc(1);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            log_progress("Phase 2", current, total, 100, args.log_only);
            result.err().map(|e| (band.clone(), e))
        })
        .collect();

    pb.finish_with_message(format!(
        "Phase 2: Built {} ego graphs",
        bands.len() - failures.len()
    ));

    for (band, err) in &failures {
        warn!("{}: {}", band, err);
    }

    println!("\n{:=<60}", "");
    println!("Batch complete!");
    println!("  Bands: {}", bands.len());
    println!("  Written: {}", bands.len() - failures.len());
    println!("  Failed: {}", failures.len());
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    check_failures(bands.len(), failures.len(), args.strict)
}
