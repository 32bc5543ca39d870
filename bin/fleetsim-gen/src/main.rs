//! ---
//! fsim_section: "04-cli"
//! fsim_subsection: "binary"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Binary entrypoint for the fleet telemetry generator."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Parser, ValueEnum};
use fleetsim_common::{init_tracing, FleetConfig, LogFormat};
use fleetsim_engine::{DeliveryMode, FleetDriver, Reading};
use fleetsim_sink::NdjsonSink;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Pretty,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Pretty => LogFormat::Pretty,
            CliLogFormat::Json => LogFormat::StructuredJson,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate synthetic asset-health telemetry for a fleet of rotating equipment",
    long_about = None
)]
struct Cli {
    /// Fleet configuration file (TOML). Defaults to the built-in demo fleet.
    #[arg(long, value_name = "FILE")]
    fleet: Option<PathBuf>,

    /// Bootstrap address of the downstream message channel
    #[arg(long)]
    bootstrap: Option<String>,

    /// Topic/stream name to publish readings onto
    #[arg(long)]
    topic: Option<String>,

    /// Duration to generate data for, in hours
    #[arg(long)]
    duration_hours: Option<u64>,

    /// Interval between data points, in seconds
    #[arg(long)]
    interval_seconds: Option<u64>,

    /// Replay readings at approximately real time instead of bulk publishing
    #[arg(long)]
    real_time: bool,

    /// Save readings to a file instead of publishing to the channel
    #[arg(long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Explicit file format when the output extension is ambiguous
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Random seed; fixed seed plus fixed fleet reproduces identical output
    #[arg(long)]
    seed: Option<u64>,

    /// Flush barrier interval in bulk mode, in records
    #[arg(long)]
    flush_every: Option<usize>,

    /// Probability that any single reading is marked BAD/SUSPECT/NO_DATA
    #[arg(long)]
    corruption_probability: Option<f64>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Pretty)]
    log_format: CliLogFormat,
}

fn load_config(cli: &Cli) -> Result<FleetConfig> {
    let mut config = match &cli.fleet {
        Some(path) => FleetConfig::load(&[path.clone()])?,
        None => FleetConfig::demo(),
    };

    if let Some(bootstrap) = &cli.bootstrap {
        config.generator.bootstrap = bootstrap.clone();
    }
    if let Some(topic) = &cli.topic {
        config.generator.topic = topic.clone();
    }
    if let Some(duration) = cli.duration_hours {
        config.generator.duration_hours = duration;
    }
    if let Some(interval) = cli.interval_seconds {
        config.generator.interval_seconds = interval;
    }
    if cli.real_time {
        config.generator.real_time = true;
    }
    if let Some(seed) = cli.seed {
        config.generator.seed = seed;
    }
    if let Some(flush_every) = cli.flush_every {
        config.generator.flush_every = flush_every;
    }
    if let Some(p) = cli.corruption_probability {
        config.generator.corruption_probability = p;
    }
    config.logging.format = cli.log_format.into();

    config.validate()?;
    Ok(config)
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = override_format {
        return format;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => OutputFormat::Csv,
        _ => OutputFormat::Json,
    }
}

fn write_json(path: &Path, readings: &[Reading]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    serde_json::to_writer_pretty(file, readings)?;
    Ok(())
}

fn write_csv(path: &Path, readings: &[Reading]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for reading in readings {
        writer.serialize(reading)?;
    }
    writer.flush()?;
    Ok(())
}

fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current record");
            let _ = tx.send(true);
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing("fleetsim-gen", &config.logging)?;

    info!(
        assets = config.assets.len(),
        bootstrap = %config.generator.bootstrap,
        topic = %config.generator.topic,
        "fleet configured"
    );

    // Backfill window: the run ends now, so readings land in the recent past.
    let start = Utc::now() - ChronoDuration::hours(config.generator.duration_hours as i64);
    let driver = FleetDriver::from_fleet(&config);

    if let Some(output) = &cli.output_file {
        let readings = driver.generate(start).await?;
        match determine_format(output, cli.format) {
            OutputFormat::Json => write_json(output, &readings)?,
            OutputFormat::Csv => write_csv(output, &readings)?,
        }
        info!(records = readings.len(), path = %output.display(), "saved readings to file");
        return Ok(());
    }

    let mode = DeliveryMode::from_real_time(config.generator.real_time);
    let sink = NdjsonSink::new(io::stdout());
    let summary = driver
        .run(start, mode, &sink, shutdown_on_ctrl_c())
        .await?;
    io::stdout().flush().ok();

    // Isolated publish failures were already logged; they never fail the run.
    info!(
        generated = summary.generated,
        published = summary.published,
        publish_failures = summary.publish_failures,
        "generator finished"
    );
    Ok(())
}
