//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "integration-tests"
//! fsim_type: "source"
//! fsim_scope: "test"
//! fsim_description: "End-to-end generation and delivery scenarios."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use chrono::{DateTime, TimeZone, Utc};
use fleetsim_common::{AssetClass, AssetConfig, FailureKind, GeneratorConfig};
use fleetsim_engine::profiles::{sensor_profile, BEARING_TEMP, VIBRATION_VEL};
use fleetsim_engine::{AssetSimulator, DeliveryMode, FleetDriver, Quality, Reading};
use fleetsim_sink::{InMemorySink, NdjsonSink};
use tokio::sync::watch;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
}

fn no_shutdown() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

/// Scenario A: one healthy pump, one hour at a one-hour interval, gives
/// exactly one reading per pump sensor, every value inside its spec range.
#[test]
fn single_sample_pump_run() {
    let asset = AssetConfig::healthy("PLANT1_PUMP_SULZER_001", "PLANT1", AssetClass::Pump, "SULZER");
    let mut simulator = AssetSimulator::with_run_seed(asset, 0.01, 1234, 0);
    let readings = simulator.generate(start_time(), 1, 3600);

    assert_eq!(readings.len(), 5);
    for reading in &readings {
        assert!(reading.quality_consistent());
        if let Some(value) = reading.value {
            let spec = &sensor_profile(AssetClass::Pump)[reading.tag.as_str()];
            assert!(
                value >= spec.min && value <= spec.max,
                "{}: {value} outside range",
                reading.tag
            );
        } else {
            assert_eq!(reading.q, Quality::NoData);
        }
    }
}

/// Scenario B: bearing wear with onset zero, sampled at 240 elapsed hours, is
/// fully ramped: compared against a healthy twin on the same noise stream the
/// vibration reading sits exactly 15 units higher and the bearing temperature
/// exactly 30 units higher.
#[test]
fn bearing_wear_fully_ramped_after_240_hours() {
    let failing = AssetConfig::failing(
        "PLANT1_PUMP_SULZER_003",
        "PLANT1",
        AssetClass::Pump,
        "SULZER",
        FailureKind::BearingWear,
        0.0,
        1.0,
    );
    let mut healthy = failing.clone();
    healthy.failure = None;

    // Two ticks: one at onset, one at 240 elapsed hours.
    let interval = 240 * 3600;
    let sick = AssetSimulator::with_run_seed(failing, 0.0, 8, 0).generate(start_time(), 480, interval);
    let well = AssetSimulator::with_run_seed(healthy, 0.0, 8, 0).generate(start_time(), 480, interval);

    let at = |readings: &[Reading], tick: usize, tag: &str| -> f64 {
        readings[tick * 5..][..5]
            .iter()
            .find(|r| r.tag == tag)
            .and_then(|r| r.value)
            .expect("reading present")
    };

    let vib_delta = at(&sick, 1, VIBRATION_VEL) - at(&well, 1, VIBRATION_VEL);
    let temp_delta = at(&sick, 1, BEARING_TEMP) - at(&well, 1, BEARING_TEMP);
    assert!((vib_delta - 15.0).abs() < 1e-9, "vibration delta {vib_delta}");
    assert!((temp_delta - 30.0).abs() < 1e-9, "temperature delta {temp_delta}");
}

fn two_pump_driver() -> FleetDriver {
    let config = GeneratorConfig {
        duration_hours: 1,
        interval_seconds: 360,
        corruption_probability: 0.0,
        flush_every: 1000,
        seed: 4242,
        ..GeneratorConfig::default()
    };
    let assets = vec![
        AssetConfig::healthy("P1", "PLANT1", AssetClass::Pump, "SULZER"),
        AssetConfig::healthy("P2", "PLANT2", AssetClass::Pump, "GRUNDFOS"),
    ];
    FleetDriver::new(config, assets)
}

/// Scenario C: bulk delivery of 2 assets x 10 ticks x 5 sensors issues at
/// least one flush and accounts for every record.
#[tokio::test]
async fn bulk_delivery_accounts_for_every_record() {
    let driver = two_pump_driver();
    let sink = InMemorySink::new();
    let summary = driver
        .run(start_time(), DeliveryMode::Bulk, &sink, no_shutdown())
        .await
        .unwrap();

    assert_eq!(summary.generated, 100);
    assert_eq!(summary.published + summary.publish_failures, 100);
    assert!(summary.flushes >= 1);
    assert!(sink.flush_count() >= 1);
}

/// Paced mode sorts globally by timestamp and its total sleep time equals
/// the sum of capped inter-record deltas. Under paused tokio time the run
/// advances the clock by exactly that amount.
#[tokio::test(start_paused = true)]
async fn paced_delivery_sleeps_capped_deltas_in_timestamp_order() {
    let driver = two_pump_driver();
    let sink = InMemorySink::new();

    let before = tokio::time::Instant::now();
    let summary = driver
        .run(start_time(), DeliveryMode::Paced, &sink, no_shutdown())
        .await
        .unwrap();
    let slept = tokio::time::Instant::now() - before;

    assert_eq!(summary.published, 100);
    // 10 shared tick timestamps: 9 gaps of 360 s, each capped at 60 s;
    // same-timestamp neighbours add nothing.
    assert_eq!(slept, std::time::Duration::from_secs(9 * 60));

    let timestamps: Vec<i64> = sink
        .published()
        .iter()
        .map(|r| serde_json::from_slice::<Reading>(&r.payload).unwrap().ts)
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

/// A shutdown signal raised mid-run stops paced delivery at the next
/// whole-sleep boundary; what was already published stays accounted.
#[tokio::test(start_paused = true)]
async fn paced_delivery_honours_cancellation() {
    let driver = two_pump_driver();
    let sink = InMemorySink::new();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let summary = driver
        .run(start_time(), DeliveryMode::Paced, &sink, rx)
        .await
        .unwrap();

    // First record goes out before any sleep; the first post-sleep check
    // observes the signal and stops.
    assert!(summary.published >= 1);
    assert!(summary.published < summary.generated);
    assert_eq!(summary.published, sink.len());
    assert!(summary.flushes >= 1);
}

/// The demo NDJSON channel carries the documented wire shape end to end.
#[tokio::test]
async fn ndjson_channel_round_trips_the_wire_shape() {
    let driver = two_pump_driver();
    let sink = NdjsonSink::new(Vec::new());
    let summary = driver
        .run(start_time(), DeliveryMode::Bulk, &sink, no_shutdown())
        .await
        .unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), summary.published);
    for line in lines {
        let reading: Reading = serde_json::from_str(line).unwrap();
        assert!(reading.quality_consistent());
        assert!(reading.asset_id == "P1" || reading.asset_id == "P2");
    }
}
