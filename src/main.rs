use anyhow::{Context, Result};
use band_ego_graph::models::{CenterRef, PresentationMode, RadiusMethod};
use band_ego_graph::progress::{create_spinner, format_duration};
use band_ego_graph::safety::validate_output_path;
use band_ego_graph::{run_query, EgoConfig, QueryParams, SimilarityGraph};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ego-graph")]
#[command(about = "Build a similar-bands ego graph JSON from the similarity database")]
struct Args {
    /// SQLite database with Bands and Similarities tables (opened read-only)
    database: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Band display name (or id with --by-id)
    band: String,

    /// Treat BAND as a numeric band id
    #[arg(long)]
    by_id: bool,

    /// TOML config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    radius: Option<i64>,

    #[arg(long)]
    max_nodes: Option<i64>,

    /// Distance decay in (0, 1)
    #[arg(long)]
    alpha: Option<f64>,

    /// radius (rendering-ready) or path (raw shortest paths)
    #[arg(long)]
    mode: Option<PresentationMode>,

    /// shortest_path (closeness to the center) or weighted_degree (popularity)
    #[arg(long)]
    radius_method: Option<RadiusMethod>,

    /// Write per-query statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide spinners (for logging to files)
    #[arg(long)]
    log_only: bool,
}

fn load_config(args: &Args) -> Result<EgoConfig> {
    let mut config = match &args.config {
        Some(path) => EgoConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => EgoConfig::default(),
    };
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    if let Some(max_nodes) = args.max_nodes {
        config.max_nodes = max_nodes;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(method) = args.radius_method {
        config.radius_method = method;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    validate_output_path(&args.output, "json", &[args.database.as_path()])?;
    let config = load_config(&args)?;

    let center = if args.by_id {
        CenterRef::Id(
            args.band
                .trim()
                .parse()
                .with_context(|| format!("'{}' is not a band id", args.band))?,
        )
    } else {
        CenterRef::Name(args.band.clone())
    };
    let params = QueryParams::new(center, &config);

    let start = Instant::now();

    println!("Opening similarity database: {:?}", args.database);
    let spinner = create_spinner("Loading similarity graph", args.log_only);
    let graph = SimilarityGraph::open(&args.database)
        .context("Failed to load similarity graph")?;
    spinner.finish_with_message(format!(
        "Loaded {} bands, {} similarities",
        graph.node_count(),
        graph.edge_count()
    ));

    let outcome = run_query(&graph, &config, &params)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    serde_json::to_writer(BufWriter::new(file), &outcome.response)
        .context("Failed to write ego graph JSON")?;

    if let Some(path) = &args.stats {
        outcome
            .stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats {}", path.display()))?;
    }
    if args.log_only {
        outcome.stats.log_phase("ego");
    }

    println!("\n{:=<60}", "");
    println!("Ego graph complete!");
    println!(
        "  Center: {} (id {})",
        graph.display_name(outcome.center),
        outcome.center
    );
    println!(
        "  Nodes: {} of {} extracted ({:.1}%)",
        outcome.stats.final_nodes,
        outcome.stats.extracted_nodes,
        outcome.stats.retention_rate()
    );
    println!("  Links: {}", outcome.stats.final_edges);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
