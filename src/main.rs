use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use dedupe_lib::engine::DuplicateEngine;
use dedupe_lib::models::{EngineEvent, StartRequest};
use dedupe_lib::report::DuplicateReport;
use dedupe_lib::synthetic::generate_registry;
use dedupe_lib::update_progress;
use dedupe_lib::utils::config::DetectionConfig;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::progress_bars::progress_callback::{
    create_bar_callback, create_simple_callback, ProgressCallback,
};
use dedupe_lib::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Find clients registered under more than one advisor", long_about = None)]
struct DedupeArgs {
    /// JSON file with `clients` and `advisors` collections
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate a synthetic registry with this many clients instead
    #[arg(long)]
    synthetic: Option<usize>,

    /// Advisors in the synthetic registry
    #[arg(long, default_value_t = 8)]
    advisors: usize,

    /// Seed for the synthetic registry
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Similarity threshold override (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Records between progress events
    #[arg(long)]
    batch_size: Option<usize>,

    /// Write the labeled JSON report here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print every engine event as a JSON line
    #[arg(long)]
    events: bool,
}

fn load_request(args: &DedupeArgs) -> Result<StartRequest> {
    if let Some(path) = &args.input {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse start request from {}", path.display()));
    }
    match args.synthetic {
        Some(count) => {
            info!(
                "Generating synthetic registry: {} clients, {} advisors, seed {}",
                count, args.advisors, args.seed
            );
            Ok(generate_registry(count, args.advisors, args.seed))
        }
        None => bail!("Either --input <FILE> or --synthetic <N> is required"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting cross-advisor duplicate detection");
    load_env();

    let args = DedupeArgs::parse();

    let mut config = DetectionConfig::from_env();
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    let progress_bar = progress_config.create_run_bar();
    let progress_callback: Option<ProgressCallback> = match &progress_bar {
        Some(pb) => Some(create_bar_callback(
            pb.clone(),
            progress_config.should_show_memory(),
        )),
        None => Some(create_simple_callback("dedupe")),
    };

    let request = load_request(&args)?;
    // The engine takes ownership of the collections; keep a copy for labels.
    let labels = request.clone();

    let mut engine = DuplicateEngine::new(config.clone());
    let mut events = engine
        .start(request)
        .context("Failed to start duplicate detection")?;
    let run_id = events.run_id();

    let mut duplicates = None;
    while let Some(event) = events.recv().await {
        if args.events {
            println!(
                "{}",
                serde_json::to_string(&event).context("Failed to serialize engine event")?
            );
        }
        match event {
            EngineEvent::Progress { progress } => update_progress!(progress_callback, progress),
            EngineEvent::Complete { duplicates: groups } => duplicates = Some(groups),
        }
    }
    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Scan complete");
    }

    let Some(groups) = duplicates else {
        warn!("Run {} ended without a result", run_id);
        bail!("Duplicate detection did not complete");
    };

    let report = DuplicateReport::build(run_id, &labels, &groups, config.similarity_threshold);
    report.log_summary();

    let json = report.to_json_pretty()?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None if !args.events => println!("{}", json),
        None => {}
    }

    Ok(())
}
