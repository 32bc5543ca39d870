//! ---
//! fsim_section: "01-core-functionality"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Fleet and generator configuration loading and validation."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::{debug, warn};

use crate::logging::LogFormat;

fn default_bootstrap() -> String {
    "localhost:9092".to_owned()
}

fn default_topic() -> String {
    "fleet.raw.timeseries".to_owned()
}

fn default_duration_hours() -> u64 {
    168
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_corruption_probability() -> f64 {
    0.01
}

fn default_flush_every() -> usize {
    1000
}

fn default_max_paced_sleep() -> Duration {
    Duration::from_secs(60)
}

fn default_seed() -> u64 {
    0xF1EE_75EEDu64
}

fn default_severity() -> f64 {
    1.0
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

/// Category of rotating equipment. Determines the sensor profile an asset
/// carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Pump,
    Compressor,
    Motor,
    Fan,
}

impl AssetClass {
    /// Parse an asset class, falling back to the pump profile for unknown
    /// strings rather than failing the whole configuration. Field data often
    /// carries vendor-specific class labels; a wrong profile beats no data.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pump" => AssetClass::Pump,
            "compressor" => AssetClass::Compressor,
            "motor" => AssetClass::Motor,
            "fan" => AssetClass::Fan,
            other => {
                warn!(class = %other, "unknown asset class, using pump sensor profile");
                AssetClass::Pump
            }
        }
    }
}

impl<'de> Deserialize<'de> for AssetClass {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(AssetClass::parse_lenient(&raw))
    }
}

/// Failure progression kinds the engine can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    BearingWear,
    Misalignment,
    Cavitation,
}

/// Failure configuration attached to an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureConfig {
    pub mode: FailureKind,
    /// Hours after simulation start at which the failure begins. A failure
    /// without an onset is never applied; the asset stays healthy.
    #[serde(default)]
    pub onset_hours: Option<f64>,
    #[serde(default = "default_severity")]
    pub severity: f64,
}

impl FailureConfig {
    pub fn validate(&self, asset_id: &str) -> Result<()> {
        if let Some(onset) = self.onset_hours {
            if !onset.is_finite() || onset < 0.0 {
                return Err(anyhow!(
                    "asset '{}': failure onset_hours must be finite and >= 0, got {}",
                    asset_id,
                    onset
                ));
            }
        }
        if !self.severity.is_finite() || self.severity <= 0.0 || self.severity > 1.0 {
            return Err(anyhow!(
                "asset '{}': failure severity must lie in (0, 1], got {}",
                asset_id,
                self.severity
            ));
        }
        Ok(())
    }
}

/// Identity and failure configuration for one simulated asset. Immutable for
/// the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset_id: String,
    pub plant: String,
    pub class: AssetClass,
    pub vendor: String,
    #[serde(default)]
    pub failure: Option<FailureConfig>,
}

impl AssetConfig {
    pub fn healthy(asset_id: &str, plant: &str, class: AssetClass, vendor: &str) -> Self {
        Self {
            asset_id: asset_id.to_owned(),
            plant: plant.to_owned(),
            class,
            vendor: vendor.to_owned(),
            failure: None,
        }
    }

    pub fn failing(
        asset_id: &str,
        plant: &str,
        class: AssetClass,
        vendor: &str,
        mode: FailureKind,
        onset_hours: f64,
        severity: f64,
    ) -> Self {
        Self {
            failure: Some(FailureConfig {
                mode,
                onset_hours: Some(onset_hours),
                severity,
            }),
            ..Self::healthy(asset_id, plant, class, vendor)
        }
    }

    /// The failure configuration that will actually influence readings.
    /// Returns `None` for healthy assets and for failure blocks missing an
    /// onset offset.
    pub fn active_failure(&self) -> Option<(&FailureConfig, f64)> {
        let failure = self.failure.as_ref()?;
        let onset = failure.onset_hours?;
        Some((failure, onset))
    }

    pub fn validate(&self) -> Result<()> {
        if self.asset_id.trim().is_empty() {
            return Err(anyhow!("asset_id must not be empty"));
        }
        if let Some(failure) = &self.failure {
            failure.validate(&self.asset_id)?;
        }
        Ok(())
    }
}

/// Run parameters for the generator.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Bootstrap address of the downstream message channel. Carried through
    /// to the external channel client; the engine itself never dials it.
    #[serde(default = "default_bootstrap")]
    pub bootstrap: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u64,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// When set, readings are replayed with inter-send delays approximating
    /// their timestamp deltas instead of batch-published.
    #[serde(default)]
    pub real_time: bool,
    /// Probability that any single reading is marked BAD/SUSPECT/NO_DATA.
    #[serde(default = "default_corruption_probability")]
    pub corruption_probability: f64,
    /// Channel flush barrier interval, in published records.
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
    /// Upper bound on any single pacing sleep in real-time mode.
    #[serde(default = "default_max_paced_sleep")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub max_paced_sleep: Duration,
    /// Seed for every random source in the run. Two runs with the same seed
    /// and fleet produce identical readings.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bootstrap: default_bootstrap(),
            topic: default_topic(),
            duration_hours: default_duration_hours(),
            interval_seconds: default_interval_seconds(),
            real_time: false,
            corruption_probability: default_corruption_probability(),
            flush_every: default_flush_every(),
            max_paced_sleep: default_max_paced_sleep(),
            seed: default_seed(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration_hours == 0 {
            return Err(anyhow!("duration_hours must be greater than zero"));
        }
        if self.interval_seconds == 0 {
            return Err(anyhow!("interval_seconds must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.corruption_probability) {
            return Err(anyhow!(
                "corruption_probability must lie in [0, 1], got {}",
                self.corruption_probability
            ));
        }
        if self.flush_every == 0 {
            return Err(anyhow!("flush_every must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: LogFormat::default(),
            file_prefix: None,
        }
    }
}

/// Primary configuration object: generator tuning plus the fleet definition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FleetConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

impl FleetConfig {
    pub const ENV_CONFIG_PATH: &'static str = "FLEETSIM_CONFIG";

    /// Load configuration from disk, respecting the `FLEETSIM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                return Self::from_path(PathBuf::from(env_path));
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                return Self::from_path(candidate.as_ref().to_path_buf());
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<FleetConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants. An empty fleet is fatal; generation
    /// never starts.
    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        if self.assets.is_empty() {
            return Err(anyhow!("configuration must declare at least one asset"));
        }
        for asset in &self.assets {
            asset.validate()?;
        }
        Ok(())
    }

    /// The built-in demo fleet: a cross-plant mix of healthy assets and
    /// assets with developing failures, sized for pipeline demos.
    pub fn demo() -> Self {
        use AssetClass::*;
        use FailureKind::*;

        let assets = vec![
            AssetConfig::healthy("PLANT1_PUMP_SULZER_001", "PLANT1", Pump, "SULZER"),
            AssetConfig::healthy("PLANT1_PUMP_SULZER_002", "PLANT1", Pump, "SULZER"),
            AssetConfig::healthy("PLANT2_PUMP_GRUNDFOS_001", "PLANT2", Pump, "GRUNDFOS"),
            AssetConfig::healthy("PLANT2_COMPRESSOR_ATLAS_001", "PLANT2", Compressor, "ATLAS"),
            AssetConfig::healthy("PLANT3_MOTOR_ABB_001", "PLANT3", Motor, "ABB"),
            AssetConfig::healthy("PLANT3_MOTOR_ABB_002", "PLANT3", Motor, "ABB"),
            AssetConfig::healthy("PLANT1_FAN_EBMPAPST_001", "PLANT1", Fan, "EBMPAPST"),
            AssetConfig::healthy("PLANT2_FAN_EBMPAPST_001", "PLANT2", Fan, "EBMPAPST"),
            AssetConfig::failing(
                "PLANT1_PUMP_SULZER_003",
                "PLANT1",
                Pump,
                "SULZER",
                BearingWear,
                120.0,
                0.8,
            ),
            AssetConfig::failing(
                "PLANT2_COMPRESSOR_ATLAS_002",
                "PLANT2",
                Compressor,
                "ATLAS",
                Misalignment,
                72.0,
                0.6,
            ),
            AssetConfig::failing(
                "PLANT1_PUMP_GRUNDFOS_002",
                "PLANT1",
                Pump,
                "GRUNDFOS",
                Cavitation,
                48.0,
                0.7,
            ),
            AssetConfig::failing(
                "PLANT3_MOTOR_SIEMENS_001",
                "PLANT3",
                Motor,
                "SIEMENS",
                BearingWear,
                168.0,
                0.9,
            ),
            AssetConfig::healthy("PLANT3_PUMP_KSB_001", "PLANT3", Pump, "KSB"),
            AssetConfig::healthy("PLANT1_COMPRESSOR_INGERSOLL_001", "PLANT1", Compressor, "INGERSOLL"),
            AssetConfig::healthy("PLANT2_MOTOR_WEG_001", "PLANT2", Motor, "WEG"),
        ];

        Self {
            generator: GeneratorConfig::default(),
            logging: LoggingConfig::default(),
            assets,
        }
    }
}

impl std::str::FromStr for FleetConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: FleetConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}
