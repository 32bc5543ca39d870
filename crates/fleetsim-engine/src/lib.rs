//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Engine module exports and shared types."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
//! Signal-synthesis and failure-injection engine for FleetSim.
//!
//! The pipeline runs sensor profiles + failure models + quality injection
//! through the per-asset simulator, then hands the flat record stream to the
//! fleet driver, which delivers it in bulk batches or timestamp-paced
//! real-time playback.

pub mod driver;
pub mod failure;
pub mod profiles;
pub mod quality;
pub mod records;
pub mod signal;
pub mod simulator;

pub use driver::{DeliveryMode, FleetDriver, RunSummary};
pub use failure::FailureModel;
pub use profiles::{sensor_profile, SensorSpec};
pub use quality::{Quality, QualityInjector};
pub use records::Reading;
pub use simulator::AssetSimulator;
