// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use exoplanet_sky::display::{available_records, pick_planet, render_text, type_counts};
use exoplanet_sky::preferences::{self, Preferences};
use exoplanet_sky::{
    ArchiveClient, DatasetStore, Ingestor, RefreshOptions, RefreshReport, SkyConfig, SqliteStore,
    TemperatureUnit, WikipediaClient,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "exoplanet-sky", version, about = "A random exoplanet for every new terminal")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file used instead of ./exoplanet-sky.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download, classify and store the dataset, then enrich it
    Refresh {
        /// Rewrite the stored dataset even if unchanged
        #[arg(long)]
        force: bool,
        /// Skip encyclopedia lookups
        #[arg(long)]
        no_enrich: bool,
    },
    /// Print one random planet
    Show {
        /// Temperature unit (saved for next time)
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
        /// Never touch the network
        #[arg(long)]
        offline: bool,
    },
    /// Interactive planet card
    Ui,
    /// Planet counts per type
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitArg {
    C,
    F,
}

impl From<UnitArg> for TemperatureUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::C => TemperatureUnit::Celsius,
            UnitArg::F => TemperatureUnit::Fahrenheit,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("❌ {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = SkyConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let kv = SqliteStore::open(&config.storage.path)
        .with_context(|| format!("failed to open store at {}", config.storage.path.display()))?;
    let store = DatasetStore::new(kv);

    match cli.command.unwrap_or(Command::Show { unit: None, offline: false }) {
        Command::Refresh { force, no_enrich } => run_refresh(&config, store, force, no_enrich).await,
        Command::Show { unit, offline } => run_show(&config, store, unit, offline).await,
        Command::Ui => run_ui_mode(store),
        Command::Stats => run_stats(store),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("EXOSKY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn build_ingestor(config: &SkyConfig, store: DatasetStore<SqliteStore>) -> Result<Ingestor<SqliteStore>> {
    let source = ArchiveClient::new(&config.archive, &config.enrichment.user_agent)?;
    let summaries = WikipediaClient::new(&config.enrichment)?;
    Ok(Ingestor::new(Arc::new(source), Arc::new(summaries), store).with_config(config))
}

async fn run_refresh(config: &SkyConfig, store: DatasetStore<SqliteStore>, force: bool, no_enrich: bool) -> Result<()> {
    println!("🛰️  Refreshing exoplanet dataset");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut ingestor = build_ingestor(config, store)?;
    let options = RefreshOptions {
        force,
        enrich: config.enrichment.enabled && !no_enrich,
    };

    let report = ingestor.refresh(options).await.context("refresh failed")?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RefreshReport) {
    println!("Run: {}", report.run_id);
    if report.unchanged {
        println!("✓ Dataset unchanged, kept {} stored planets", report.record_count);
    } else {
        println!("✓ Stored {} planets", report.record_count);
    }
    if report.parse_errors > 0 || report.conversion_errors > 0 {
        println!(
            "⚠️  Skipped rows: {} malformed, {} unusable",
            report.parse_errors, report.conversion_errors
        );
    }

    let e = &report.enrichment;
    if e.attempted > 0 {
        println!(
            "📖 Enrichment: {} enriched, {} without summary, {} failed ({} lookups, {} writes)",
            e.enriched, e.empty, e.failed, e.attempted, e.commits
        );
    }
}

async fn run_show(
    config: &SkyConfig,
    mut store: DatasetStore<SqliteStore>,
    unit: Option<UnitArg>,
    offline: bool,
) -> Result<()> {
    if let Some(unit) = unit {
        preferences::set_temperature_unit(store.kv_mut(), unit.into())?;
    }

    if !offline {
        // Descriptions are left to `refresh`; lookups would hold up the planet
        let mut ingestor = build_ingestor(config, store)?;
        if let Some(report) = ingestor.refresh_if_due(Utc::now()).await {
            eprintln!(
                "🛰️  Stored {} planets. Run `exoplanet-sky refresh` to fetch descriptions.",
                report.record_count
            );
        }
        store = ingestor.into_store();
    }

    let prefs = Preferences::load(store.kv());
    let view = pick_planet(&store, &mut rand::rng());
    print!("{}", render_text(&view, &prefs));
    Ok(())
}

fn run_stats(store: DatasetStore<SqliteStore>) -> Result<()> {
    println!("📊 Exoplanet dataset");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match store.load_meta() {
        Some(meta) => {
            println!("Fetched:   {}", meta.fetched_at.format("%Y-%m-%d %H:%M UTC"));
            println!("Run:       {}", meta.run_id);
            println!("Checksum:  {}", meta.checksum);
            println!("Skipped:   {} malformed rows", meta.parse_errors);
        }
        None => println!("No dataset stored yet (showing built-in planets). Run: exoplanet-sky refresh"),
    }

    let records = available_records(&store);
    let enriched = records.iter().filter(|r| r.has_enrichment()).count();
    println!("\nPlanets:   {}", records.len());
    println!("Enriched:  {}", enriched);
    for (planet_type, count) in type_counts(&records) {
        println!("  {:<14}{}", planet_type.label(), count);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: DatasetStore<SqliteStore>) -> Result<()> {
    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: DatasetStore<SqliteStore>) -> Result<()> {
    anyhow::bail!("TUI mode not available, rebuild with: cargo build --features tui")
}
