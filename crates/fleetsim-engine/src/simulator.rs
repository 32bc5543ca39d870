//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Per-asset multi-sensor reading generation."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use fleetsim_common::AssetConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::failure::FailureModel;
use crate::quality::QualityInjector;
use crate::records::Reading;
use crate::signal;

const SECONDS_PER_HOUR: u64 = 3_600;

/// Generates the full multi-sensor reading sequence for one asset.
///
/// Each simulator owns its random source, so generation across assets can fan
/// out without shared state and a fixed run seed reproduces the same stream
/// regardless of scheduling.
#[derive(Debug)]
pub struct AssetSimulator {
    asset: AssetConfig,
    quality: QualityInjector,
    rng: StdRng,
}

impl AssetSimulator {
    pub fn new(asset: AssetConfig, quality: QualityInjector, rng: StdRng) -> Self {
        Self {
            asset,
            quality,
            rng,
        }
    }

    /// Build a simulator whose rng is derived from the run seed and the
    /// asset's stable position in the fleet, keeping per-asset streams
    /// independent of each other and of execution order.
    pub fn with_run_seed(
        asset: AssetConfig,
        corruption_probability: f64,
        run_seed: u64,
        stream_index: u64,
    ) -> Self {
        let seed = run_seed ^ (stream_index.wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self::new(
            asset,
            QualityInjector::new(corruption_probability),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn asset(&self) -> &AssetConfig {
        &self.asset
    }

    /// Lazy finite sequence of readings covering
    /// `floor(duration_hours * 3600 / interval_seconds)` ticks, one reading
    /// per (tick, sensor) pair.
    pub fn stream(
        &mut self,
        start: DateTime<Utc>,
        duration_hours: u64,
        interval_seconds: u64,
    ) -> ReadingStream<'_> {
        let total_ticks = duration_hours * SECONDS_PER_HOUR / interval_seconds;
        let onset = self
            .asset
            .active_failure()
            .map(|(failure, onset_hours)| {
                (
                    FailureModel::from_config(failure),
                    onset_hours * SECONDS_PER_HOUR as f64,
                )
            });
        ReadingStream {
            simulator: self,
            start,
            interval_seconds,
            total_ticks,
            progress_step: (total_ticks / 10).max(1),
            tick: 0,
            failure: onset,
            pending: VecDeque::new(),
        }
    }

    /// Materialize the whole run for this asset.
    pub fn generate(
        &mut self,
        start: DateTime<Utc>,
        duration_hours: u64,
        interval_seconds: u64,
    ) -> Vec<Reading> {
        self.stream(start, duration_hours, interval_seconds).collect()
    }

    fn tick_readings(
        &mut self,
        start: DateTime<Utc>,
        tick: u64,
        interval_seconds: u64,
        failure: &Option<(FailureModel, f64)>,
        out: &mut VecDeque<Reading>,
    ) {
        let offset_secs = tick * interval_seconds;
        let ts_ms = start.timestamp_millis() + (offset_secs * 1_000) as i64;
        let unix_secs = start.timestamp() as f64 + offset_secs as f64;

        let base = signal::base_values(self.asset.class, unix_secs, &mut self.rng);
        let values = match failure {
            Some((model, onset_secs)) if offset_secs as f64 >= *onset_secs => {
                let elapsed = offset_secs as f64 - onset_secs;
                model.apply(elapsed, &base, &mut self.rng)
            }
            _ => base,
        };

        for (tag, value) in values {
            let (value, quality) = self.quality.inject(value, &mut self.rng);
            out.push_back(Reading::new(ts_ms, &self.asset.asset_id, tag, value, quality));
        }
    }
}

/// Iterator over one asset's readings. Finite; restartable by calling
/// [`AssetSimulator::stream`] again on a freshly seeded simulator.
pub struct ReadingStream<'a> {
    simulator: &'a mut AssetSimulator,
    start: DateTime<Utc>,
    interval_seconds: u64,
    total_ticks: u64,
    progress_step: u64,
    tick: u64,
    failure: Option<(FailureModel, f64)>,
    pending: VecDeque<Reading>,
}

impl Iterator for ReadingStream<'_> {
    type Item = Reading;

    fn next(&mut self) -> Option<Reading> {
        loop {
            if let Some(reading) = self.pending.pop_front() {
                return Some(reading);
            }
            if self.tick >= self.total_ticks {
                return None;
            }
            if self.tick % self.progress_step == 0 {
                debug!(
                    asset_id = %self.simulator.asset.asset_id,
                    tick = self.tick,
                    total = self.total_ticks,
                    "generation progress"
                );
            }
            let tick = self.tick;
            self.tick += 1;
            self.simulator.tick_readings(
                self.start,
                tick,
                self.interval_seconds,
                &self.failure,
                &mut self.pending,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleetsim_common::{AssetClass, AssetConfig, FailureKind};

    use crate::profiles::{sensor_profile, BEARING_TEMP, VIBRATION_VEL};
    use crate::quality::Quality;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
    }

    fn healthy_pump() -> AssetConfig {
        AssetConfig::healthy("PLANT1_PUMP_TEST_001", "PLANT1", AssetClass::Pump, "SULZER")
    }

    #[test]
    fn tick_count_is_floor_of_duration_over_interval() {
        let mut sim = AssetSimulator::with_run_seed(healthy_pump(), 0.0, 1, 0);
        // 1 hour at 7 s intervals: floor(3600/7) = 514 ticks, 5 sensors each.
        let readings = sim.generate(start_time(), 1, 7);
        assert_eq!(readings.len(), 514 * 5);
    }

    #[test]
    fn single_tick_emits_one_reading_per_pump_sensor() {
        let mut sim = AssetSimulator::with_run_seed(healthy_pump(), 0.0, 2, 0);
        let readings = sim.generate(start_time(), 1, 3600);
        assert_eq!(readings.len(), 5);
        let tags: Vec<_> = readings.iter().map(|r| r.tag.as_str()).collect();
        for tag in sensor_profile(AssetClass::Pump).keys() {
            assert!(tags.contains(tag), "missing sensor {tag}");
        }
        for reading in &readings {
            assert_eq!(reading.q, Quality::Good);
            assert!(reading.quality_consistent());
            assert_eq!(reading.ts, start_time().timestamp_millis());
        }
    }

    #[test]
    fn timestamps_advance_by_the_interval() {
        let mut sim = AssetSimulator::with_run_seed(healthy_pump(), 0.0, 3, 0);
        let readings = sim.generate(start_time(), 1, 900);
        let first_tick_ts = readings[0].ts;
        let second_tick_ts = readings[5].ts;
        assert_eq!(second_tick_ts - first_tick_ts, 900_000);
    }

    #[test]
    fn same_seed_restarts_identically() {
        let a = AssetSimulator::with_run_seed(healthy_pump(), 0.05, 9, 0)
            .generate(start_time(), 2, 600);
        let b = AssetSimulator::with_run_seed(healthy_pump(), 0.05, 9, 0)
            .generate(start_time(), 2, 600);
        assert_eq!(a, b);
    }

    #[test]
    fn failure_is_gated_on_onset() {
        let failing = AssetConfig::failing(
            "PLANT1_PUMP_TEST_002",
            "PLANT1",
            AssetClass::Pump,
            "SULZER",
            FailureKind::BearingWear,
            1.0,
            1.0,
        );
        let mut healthy_twin = failing.clone();
        healthy_twin.failure = None;

        // Bearing wear draws nothing from the rng, so the two runs share the
        // exact same noise stream and differ only by the failure terms.
        let sick = AssetSimulator::with_run_seed(failing, 0.0, 4, 0)
            .generate(start_time(), 2, 1800);
        let well = AssetSimulator::with_run_seed(healthy_twin, 0.0, 4, 0)
            .generate(start_time(), 2, 1800);

        for (s, w) in sick.iter().zip(&well) {
            let offset_secs = (s.ts - start_time().timestamp_millis()) / 1_000;
            let affected = s.tag == VIBRATION_VEL || s.tag == BEARING_TEMP;
            if offset_secs < 3600 || !affected {
                assert_eq!(s.value, w.value, "pre-onset/unaffected mismatch at {}", s.tag);
            } else {
                assert!(
                    s.value.unwrap() >= w.value.unwrap(),
                    "post-onset {} not elevated",
                    s.tag
                );
            }
        }
    }

    #[test]
    fn all_values_respect_sensor_ranges() {
        let mut sim = AssetSimulator::with_run_seed(healthy_pump(), 0.3, 21, 0);
        for reading in sim.stream(start_time(), 4, 300) {
            assert!(reading.quality_consistent());
            if let Some(value) = reading.value {
                let spec = &sensor_profile(AssetClass::Pump)[reading.tag.as_str()];
                assert!(value >= spec.min && value <= spec.max);
            }
        }
    }
}
