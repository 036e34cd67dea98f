use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use herbtrace_core::aggregation::{BatchAggregator, BatchView, PortalFilter, ScanCancel, ScanOrder};
use herbtrace_core::chain::ChainGateway;
use herbtrace_core::config::HerbTraceConfig;
use herbtrace_core::extraction::MetadataResolver;
use herbtrace_core::init_logger;
use herbtrace_core::portal::{parse_batch_id, timeline, tracking_link, TrackPortal};

#[derive(Parser)]
#[command(name = "herbtrace", version, about = "Read-only HerbTrace batch explorer")]
struct Cli {
    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Every batch in ascending order
    List,
    /// Batches awaiting lab verification, newest first
    Pending,
    /// Verified batches ready for the distributor, newest first
    Ready,
    /// Look up one batch by id or tracking link
    Track {
        /// Batch id (`101`, `#101`) or a `.../track?id=101` link
        target: String,
    },
    /// Print the shareable tracking link for a batch
    Link {
        id: u64,
        /// Origin the tracking page is served from
        #[arg(long, default_value = "http://localhost:5173")]
        base: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    if let Commands::Link { id, base } = &cli.command {
        println!("{}", tracking_link(base, *id));
        return Ok(());
    }

    let config = HerbTraceConfig::from_env().context("loading configuration")?;

    let gateway = ChainGateway::open_read_connection(&config).context("opening read gateway")?;
    let resolver = MetadataResolver::from_config(&config).context("building metadata resolver")?;
    let aggregator = Arc::new(BatchAggregator::new(
        Arc::new(gateway),
        Arc::new(resolver),
        &config,
    ));

    let (filter, order) = match &cli.command {
        Commands::List => (PortalFilter::All, ScanOrder::Ascending),
        Commands::Pending => (PortalFilter::PendingVerification, ScanOrder::NewestFirst),
        Commands::Ready => (PortalFilter::VerifiedOnly, ScanOrder::NewestFirst),
        Commands::Track { target } => {
            let track = TrackPortal::new(aggregator);
            let view = if target.contains("://") {
                track.lookup_link(target).await?
            } else {
                track.lookup(parse_batch_id(target)?).await?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_detail(&view, &config.ipfs_gateway);
            }
            return Ok(());
        }
        Commands::Link { .. } => return Ok(()),
    };

    let report = aggregator
        .list_batches(filter, order, &ScanCancel::new())
        .await
        .context("scanning batches")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for view in &report.views {
        println!(
            "#{:<6} {:<12} {:<28} {}",
            view.id,
            view.stage.label(),
            view.name,
            view.location.as_deref().unwrap_or("-")
        );
    }
    println!(
        "{} shown, {} not created, {} could not be loaded",
        report.views.len(),
        report.nonexistent,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  #{} [{}]: {}", skipped.id, skipped.kind, skipped.reason);
    }

    Ok(())
}

fn print_detail(view: &BatchView, gateway: &str) {
    println!("Batch #{} - {}", view.id, view.name);
    println!("  Stage:        {}", view.stage.label());
    println!("  Farmer:       {}", view.farmer_name.as_deref().unwrap_or(&view.farmer));
    println!("  Location:     {}", view.location.as_deref().unwrap_or("-"));
    println!("  Harvested:    {}", view.harvest_date.as_deref().unwrap_or("-"));
    let mut images = view.image_urls(gateway).into_iter();
    if let Some(url) = images.next() {
        println!("  Image:        {}", url);
    }
    for mirror in images {
        println!("  Image mirror: {}", mirror);
    }

    match &view.lab_details {
        Some(lab) => {
            println!("  Purity:       {}%", lab.purity);
            println!("  Lab notes:    {}", lab.notes);
            if let Some(at) = lab.recorded_at {
                println!("  Tested:       {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
            match lab.report_url(gateway) {
                Some(url) => println!("  Lab report:   {}", url),
                None => println!("  Lab report:   not uploaded"),
            }
        }
        None => println!("  Lab results:  awaiting analysis"),
    }

    println!("  Journey:");
    for step in timeline(view) {
        println!("    [{}] {}", if step.reached { "x" } else { " " }, step.title);
    }
}
