//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Static per-class sensor profile table."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use fleetsim_common::AssetClass;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Vibration velocity RMS, mm/s.
pub const VIBRATION_VEL: &str = "vibration_vel_mm_s";
/// Drive-end bearing temperature, °C.
pub const BEARING_TEMP: &str = "bearing_temp_c";
/// Motor phase current, A.
pub const MOTOR_CURRENT: &str = "motor_current_a";
/// Discharge pressure, bar. Pumps and compressors only.
pub const DISCHARGE_PRESSURE: &str = "discharge_pressure_bar";
/// Ambient temperature at the asset, °C.
pub const AMBIENT_TEMP: &str = "ambient_temp_c";

/// Static parameters for one sensor of an asset class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSpec {
    /// Healthy steady-state value the cyclical signal oscillates around.
    pub base: f64,
    /// Standard deviation of the Gaussian measurement noise.
    pub noise_sigma: f64,
    /// Lower bound of the physically valid range.
    pub min: f64,
    /// Upper bound of the physically valid range.
    pub max: f64,
}

impl SensorSpec {
    const fn new(base: f64, noise_sigma: f64, min: f64, max: f64) -> Self {
        Self {
            base,
            noise_sigma,
            min,
            max,
        }
    }

    /// Clamp a raw value into the sensor's valid range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

static PROFILES: Lazy<IndexMap<AssetClass, IndexMap<&'static str, SensorSpec>>> = Lazy::new(|| {
    let pump = IndexMap::from([
        (VIBRATION_VEL, SensorSpec::new(5.0, 0.5, 0.0, 50.0)),
        (BEARING_TEMP, SensorSpec::new(60.0, 2.0, 20.0, 120.0)),
        (MOTOR_CURRENT, SensorSpec::new(75.0, 3.0, 0.0, 150.0)),
        (DISCHARGE_PRESSURE, SensorSpec::new(15.0, 1.0, 0.0, 30.0)),
        (AMBIENT_TEMP, SensorSpec::new(25.0, 2.0, 10.0, 40.0)),
    ]);
    let compressor = IndexMap::from([
        (VIBRATION_VEL, SensorSpec::new(8.0, 1.0, 0.0, 50.0)),
        (BEARING_TEMP, SensorSpec::new(80.0, 3.0, 30.0, 130.0)),
        (MOTOR_CURRENT, SensorSpec::new(90.0, 5.0, 0.0, 200.0)),
        (DISCHARGE_PRESSURE, SensorSpec::new(25.0, 2.0, 0.0, 50.0)),
        (AMBIENT_TEMP, SensorSpec::new(25.0, 2.0, 10.0, 40.0)),
    ]);
    let motor = IndexMap::from([
        (VIBRATION_VEL, SensorSpec::new(3.0, 0.3, 0.0, 30.0)),
        (BEARING_TEMP, SensorSpec::new(70.0, 2.0, 25.0, 110.0)),
        (MOTOR_CURRENT, SensorSpec::new(60.0, 3.0, 0.0, 120.0)),
        (AMBIENT_TEMP, SensorSpec::new(25.0, 2.0, 10.0, 40.0)),
    ]);
    let fan = IndexMap::from([
        (VIBRATION_VEL, SensorSpec::new(4.0, 0.5, 0.0, 25.0)),
        (BEARING_TEMP, SensorSpec::new(50.0, 2.0, 20.0, 90.0)),
        (MOTOR_CURRENT, SensorSpec::new(45.0, 2.0, 0.0, 100.0)),
        (AMBIENT_TEMP, SensorSpec::new(25.0, 2.0, 10.0, 40.0)),
    ]);
    IndexMap::from([
        (AssetClass::Pump, pump),
        (AssetClass::Compressor, compressor),
        (AssetClass::Motor, motor),
        (AssetClass::Fan, fan),
    ])
});

/// Sensor profile for an asset class. Every class has an entry; unknown class
/// strings were already mapped to pump at configuration parse time.
pub fn sensor_profile(class: AssetClass) -> &'static IndexMap<&'static str, SensorSpec> {
    PROFILES
        .get(&class)
        .unwrap_or_else(|| &PROFILES[&AssetClass::Pump])
}
