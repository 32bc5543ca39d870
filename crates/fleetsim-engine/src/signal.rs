//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Cyclical base-signal synthesis."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use std::f64::consts::PI;

use fleetsim_common::AssetClass;
use indexmap::IndexMap;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::profiles::sensor_profile;

const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Daily and weekly load factors at an absolute time (seconds since epoch).
///
/// Plants run hotter through the working day and lighter over weekends;
/// both cycles are modelled as small sinusoidal modulations of the base value.
pub fn cyclical_factors(unix_secs: f64) -> (f64, f64) {
    let hour_of_day = unix_secs.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let day_of_week = unix_secs.rem_euclid(SECONDS_PER_WEEK) / SECONDS_PER_DAY;
    let daily = 1.0 + 0.1 * (2.0 * PI * hour_of_day / 24.0).sin();
    let weekly = 1.0 + 0.05 * (2.0 * PI * day_of_week / 7.0).sin();
    (daily, weekly)
}

/// Expected sensor values for an asset class at an absolute time.
///
/// Each sensor gets `base * daily * weekly + N(0, sigma)`, clamped into its
/// valid range. Pure apart from draws against the supplied random source;
/// a fixed seed reproduces the exact same map.
pub fn base_values<R: Rng + ?Sized>(
    class: AssetClass,
    unix_secs: f64,
    rng: &mut R,
) -> IndexMap<&'static str, f64> {
    let (daily, weekly) = cyclical_factors(unix_secs);
    sensor_profile(class)
        .iter()
        .map(|(tag, spec)| {
            let noise = Normal::new(0.0, spec.noise_sigma)
                .expect("sigma must be non-negative")
                .sample(rng);
            let value = spec.base * daily * weekly + noise;
            (*tag, spec.clamp(value))
        })
        .collect()
}
