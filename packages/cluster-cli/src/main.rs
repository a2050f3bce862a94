// Command-line driver: cluster a report file against a headless viewport

mod config;
mod viewport;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use incident_clusters::{
    ChunkedIngestionPipeline, ClusterEngine, ClusterLayer, IncidentReport, IngestStats,
    ReconcileDecision,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Overrides};
use crate::viewport::HeadlessViewport;

#[derive(Parser, Debug)]
#[command(name = "incident-clusters", about = "Cluster incident reports for map display")]
struct Args {
    /// JSON file containing an array of incident reports
    input: PathBuf,

    /// Initial viewport zoom
    #[arg(long, default_value_t = 12.0)]
    zoom: f64,

    /// Zoom levels to step through after the initial load (comma separated)
    #[arg(long, value_delimiter = ',')]
    zoom_path: Vec<f64>,

    /// Override the batch size from the environment
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override the pause between batches, in milliseconds
    #[arg(long)]
    yield_delay_ms: Option<u64>,

    /// Override the zoom distance that triggers a recluster
    #[arg(long)]
    threshold: Option<f64>,

    /// Print the final layer as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ClusterOutput {
    latitude: f64,
    longitude: f64,
    members: usize,
    dominant_type: String,
    average_severity: f64,
    color: String,
    size_px: u32,
    high_severity: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let reports = IncidentReport::parse_many(&raw).context("Failed to parse incident reports")?;
    tracing::info!(reports = reports.len(), "Loaded incident reports");

    let settings = config.pipeline_settings(Overrides {
        batch_size: args.batch_size,
        yield_delay_ms: args.yield_delay_ms,
        recluster_threshold: args.threshold,
    })?;
    let pipeline = ChunkedIngestionPipeline::new(settings).context("Failed to build pipeline")?;
    let (mut engine, _handle) = ClusterEngine::new(HeadlessViewport::new(args.zoom), pipeline);

    let stats = engine.load(reports).await.cloned();

    for zoom in &args.zoom_path {
        let decision = engine.on_zoom_changed(*zoom).await;
        if !args.json {
            print_decision(*zoom, decision);
        }
    }
    engine.fit_to_layer();

    let layer = engine
        .active_layer()
        .context("No cluster layer was attached")?;

    if args.json {
        let clusters = cluster_output(layer);
        println!("{}", serde_json::to_string_pretty(&clusters)?);
    } else {
        print_summary(layer, stats.as_ref());
    }

    Ok(())
}

fn cluster_output(layer: &ClusterLayer) -> Vec<ClusterOutput> {
    layer
        .rendered()
        .into_iter()
        .map(|(cluster, icon)| ClusterOutput {
            latitude: cluster.centroid.lat,
            longitude: cluster.centroid.lng,
            members: cluster.member_count,
            dominant_type: cluster.dominant_type.to_string(),
            average_severity: cluster.average_severity,
            color: icon.color.to_hex(),
            size_px: icon.size_px(),
            high_severity: icon.is_high_severity_ring,
        })
        .collect()
}

fn print_decision(zoom: f64, decision: ReconcileDecision) {
    match decision {
        ReconcileDecision::Recluster { .. } => {
            println!("{} zoom {:>5.1}", "↻ recluster".bright_yellow(), zoom)
        }
        ReconcileDecision::Noop => println!("{} zoom {:>5.1}", "· keep     ".dimmed(), zoom),
    }
}

fn print_summary(layer: &ClusterLayer, stats: Option<&IngestStats>) {
    println!();
    println!(
        "{} {} tier at zoom {:.1} (radius {} px)",
        "Layer".bright_cyan().bold(),
        layer.config().tier.as_str(),
        layer.clustered_zoom(),
        layer.band().radius_px
    );
    println!(
        "  {} markers in {} clusters",
        layer.marker_count().to_string().bold(),
        layer.cluster_count().to_string().bold()
    );

    if let Some(stats) = stats {
        println!(
            "  initial load: avg cluster size {:.2}, {} dropped, {} failed batches",
            stats.average_cluster_size, stats.dropped_invalid, stats.failed_batches
        );
    }

    let mut rendered = layer.rendered();
    rendered.sort_by(|a, b| b.0.member_count.cmp(&a.0.member_count));

    println!();
    for (cluster, icon) in rendered.iter().take(10) {
        let marker = if icon.is_high_severity_ring {
            "●".bright_red().bold()
        } else {
            "●".normal()
        };
        println!(
            "  {} {:>4} × {:<16} sev {:.2}  {}  ({:.5}, {:.5})",
            marker,
            cluster.member_count,
            cluster.dominant_type.label(),
            cluster.average_severity,
            icon.color.to_hex(),
            cluster.centroid.lat,
            cluster.centroid.lng
        );
    }
    if rendered.len() > 10 {
        println!("  … {} more", rendered.len() - 10);
    }
}
