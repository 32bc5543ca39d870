//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Emitted telemetry record shape."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::quality::Quality;

/// One emitted telemetry point. Field names match the downstream wire shape:
/// `{ ts, asset_id, tag, value, q }` with `ts` in epoch milliseconds and
/// `value` null exactly when `q` is `NO_DATA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub ts: i64,
    pub asset_id: String,
    pub tag: String,
    pub value: Option<f64>,
    pub q: Quality,
}

impl Reading {
    pub fn new(ts: i64, asset_id: &str, tag: &str, value: Option<f64>, q: Quality) -> Self {
        Self {
            ts,
            asset_id: asset_id.to_owned(),
            tag: tag.to_owned(),
            value,
            q,
        }
    }

    /// The NO_DATA/absent-value invariant every emitted reading must satisfy.
    pub fn quality_consistent(&self) -> bool {
        self.value.is_none() == (self.q == Quality::NoData)
    }
}
