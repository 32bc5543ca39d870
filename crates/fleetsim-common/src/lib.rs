//! ---
//! fsim_section: "01-core-functionality"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Shared configuration and logging primitives."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
//! Shared primitives for the FleetSim workspace: fleet/generator configuration
//! loading and tracing initialisation consumed by every other crate.

pub mod config;
pub mod logging;

pub use config::{
    AssetClass, AssetConfig, FailureConfig, FailureKind, FleetConfig, GeneratorConfig,
    LoggingConfig,
};
pub use logging::{init_tracing, LogFormat};
