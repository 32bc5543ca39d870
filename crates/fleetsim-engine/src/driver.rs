//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Fleet-wide generation fan-out and delivery disciplines."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use fleetsim_common::{AssetConfig, FleetConfig, GeneratorConfig};
use fleetsim_sink::RecordSink;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::records::Reading;
use crate::simulator::AssetSimulator;

/// How the accumulated reading set reaches the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Fire-and-batch-flush, fastest path for backfilling a pipeline.
    Bulk,
    /// Global-timestamp-sorted playback with inter-send sleeps, for demos.
    Paced,
}

impl DeliveryMode {
    pub fn from_real_time(real_time: bool) -> Self {
        if real_time {
            DeliveryMode::Paced
        } else {
            DeliveryMode::Bulk
        }
    }
}

/// Outcome counters for one run. Isolated publish failures are logged and
/// counted here; they never abort delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub published: usize,
    pub publish_failures: usize,
    pub flushes: usize,
}

/// Iterates the asset simulator across the configured fleet and drives one of
/// the delivery disciplines.
pub struct FleetDriver {
    config: GeneratorConfig,
    assets: Vec<AssetConfig>,
}

impl FleetDriver {
    pub fn new(config: GeneratorConfig, assets: Vec<AssetConfig>) -> Self {
        Self { config, assets }
    }

    pub fn from_fleet(fleet: &FleetConfig) -> Self {
        Self::new(fleet.generator.clone(), fleet.assets.clone())
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.assets.is_empty() {
            return Err(anyhow!("no assets configured; nothing to generate"));
        }
        Ok(())
    }

    /// Generate the full reading set for the fleet. Each asset's simulation is
    /// independent and side-effect-free, so generation fans out across a
    /// blocking worker per asset; results are re-joined in fleet order so the
    /// output is deterministic for a fixed seed.
    pub async fn generate(&self, start: DateTime<Utc>) -> Result<Vec<Reading>> {
        let mut handles = Vec::with_capacity(self.assets.len());
        for (index, asset) in self.assets.iter().cloned().enumerate() {
            let config = self.config.clone();
            info!(
                asset_id = %asset.asset_id,
                failure = %asset
                    .active_failure()
                    .map(|(f, _)| f.mode.to_string())
                    .unwrap_or_else(|| "healthy".to_owned()),
                "generating asset data"
            );
            handles.push(tokio::task::spawn_blocking(move || {
                let mut simulator = AssetSimulator::with_run_seed(
                    asset,
                    config.corruption_probability,
                    config.seed,
                    index as u64,
                );
                simulator.generate(start, config.duration_hours, config.interval_seconds)
            }));
        }

        let mut readings = Vec::new();
        for handle in handles {
            readings.extend(handle.await.context("asset generation task panicked")?);
        }
        Ok(readings)
    }

    /// Run the whole pipeline: validate, generate, deliver, summarize.
    ///
    /// Configuration problems abort before any generation happens. The
    /// shutdown receiver is honoured at whole-sleep granularity in paced mode.
    pub async fn run(
        &self,
        start: DateTime<Utc>,
        mode: DeliveryMode,
        sink: &dyn RecordSink,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        self.validate()?;
        info!(
            assets = self.assets.len(),
            duration_hours = self.config.duration_hours,
            interval_seconds = self.config.interval_seconds,
            mode = ?mode,
            sink = sink.name(),
            "starting fleet run"
        );

        let readings = self.generate(start).await?;
        let mut summary = RunSummary {
            generated: readings.len(),
            ..RunSummary::default()
        };
        info!(records = readings.len(), "generation complete, delivering");

        match mode {
            DeliveryMode::Bulk => self.deliver_bulk(readings, sink, &mut summary),
            DeliveryMode::Paced => {
                self.deliver_paced(readings, sink, shutdown, &mut summary)
                    .await
            }
        }

        info!(
            generated = summary.generated,
            published = summary.published,
            publish_failures = summary.publish_failures,
            flushes = summary.flushes,
            "fleet run complete"
        );
        Ok(summary)
    }

    fn publish_one(&self, reading: &Reading, sink: &dyn RecordSink, summary: &mut RunSummary) {
        let result = serde_json::to_vec(reading)
            .map_err(fleetsim_sink::SinkError::from)
            .and_then(|payload| sink.publish(&self.config.topic, &reading.asset_id, &payload));
        match result {
            Ok(()) => summary.published += 1,
            Err(err) => {
                warn!(
                    asset_id = %reading.asset_id,
                    tag = %reading.tag,
                    error = %err,
                    "failed to publish reading, continuing"
                );
                summary.publish_failures += 1;
            }
        }
    }

    fn flush(&self, sink: &dyn RecordSink, summary: &mut RunSummary) {
        match sink.flush() {
            Ok(()) => summary.flushes += 1,
            Err(err) => warn!(error = %err, "sink flush failed"),
        }
    }

    /// Bulk discipline: publish in generation order with a flush barrier
    /// every `flush_every` records and a final flush after the last one.
    fn deliver_bulk(&self, readings: Vec<Reading>, sink: &dyn RecordSink, summary: &mut RunSummary) {
        for (index, reading) in readings.iter().enumerate() {
            self.publish_one(reading, sink, summary);
            if (index + 1) % self.config.flush_every == 0 {
                self.flush(sink, summary);
            }
        }
        self.flush(sink, summary);
    }

    /// Paced discipline: globally sort by timestamp, then sleep
    /// `min(max_paced_sleep, delta)` before each send after the first.
    /// Sorted input means the delta is never negative. Cancellation is
    /// checked once per sleep.
    async fn deliver_paced(
        &self,
        mut readings: Vec<Reading>,
        sink: &dyn RecordSink,
        shutdown: watch::Receiver<bool>,
        summary: &mut RunSummary,
    ) {
        readings.sort_by_key(|reading| reading.ts);
        let mut last_ts: Option<i64> = None;
        for reading in &readings {
            if let Some(prev) = last_ts {
                let delta = Duration::from_millis((reading.ts - prev).max(0) as u64);
                let pause = delta.min(self.config.max_paced_sleep);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                if *shutdown.borrow() {
                    info!(
                        published = summary.published,
                        remaining = summary.generated - summary.published - summary.publish_failures,
                        "paced delivery cancelled"
                    );
                    break;
                }
            }
            self.publish_one(reading, sink, summary);
            last_ts = Some(reading.ts);
        }
        self.flush(sink, summary);
    }
}
