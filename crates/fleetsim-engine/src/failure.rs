//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Progressive failure-mode models."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use fleetsim_common::{FailureConfig, FailureKind};
use indexmap::IndexMap;
use rand::Rng;

use crate::profiles::{BEARING_TEMP, DISCHARGE_PRESSURE, MOTOR_CURRENT, VIBRATION_VEL};

/// Hours of bearing wear from onset to full degradation.
pub const BEARING_WEAR_RAMP_HOURS: f64 = 240.0;

/// One failure progression, dispatched over [`FailureKind`]. Healthy assets
/// simply carry no model.
#[derive(Debug, Clone, Copy)]
pub struct FailureModel {
    kind: FailureKind,
    severity: f64,
}

impl FailureModel {
    pub fn new(kind: FailureKind, severity: f64) -> Self {
        Self { kind, severity }
    }

    pub fn from_config(config: &FailureConfig) -> Self {
        Self::new(config.mode, config.severity)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Perturb a set of base sensor values given the time elapsed since
    /// failure onset. Pure copy transform: the input map is never mutated and
    /// sensors the mode does not recognize pass through unchanged.
    ///
    /// Cavitation resamples its random spikes on every call, so it stays
    /// non-deterministic even under a fixed clock unless the rng is seeded.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        elapsed_secs: f64,
        values: &IndexMap<&'static str, f64>,
        rng: &mut R,
    ) -> IndexMap<&'static str, f64> {
        let mut adjusted = values.clone();
        match self.kind {
            FailureKind::BearingWear => {
                // Linear ramp to full degradation over ten days.
                let degradation = (elapsed_secs / 3600.0 / BEARING_WEAR_RAMP_HOURS).min(1.0);
                if let Some(v) = adjusted.get_mut(VIBRATION_VEL) {
                    *v += (5.0 + 10.0 * degradation) * self.severity;
                }
                if let Some(v) = adjusted.get_mut(BEARING_TEMP) {
                    *v += (10.0 + 20.0 * degradation) * self.severity;
                }
            }
            FailureKind::Misalignment => {
                // Sudden geometric fault: step onset, no ramp. The vibration
                // increase stands in for 1X/2X running-speed harmonics.
                if let Some(v) = adjusted.get_mut(VIBRATION_VEL) {
                    *v += 3.0 * self.severity;
                }
                if let Some(v) = adjusted.get_mut(BEARING_TEMP) {
                    *v += 5.0 * self.severity;
                }
            }
            FailureKind::Cavitation => {
                if let Some(v) = adjusted.get_mut(DISCHARGE_PRESSURE) {
                    *v *= 1.0 - 0.3 * self.severity;
                }
                // Erratic bubble-collapse noise on vibration and current draw.
                if let Some(v) = adjusted.get_mut(VIBRATION_VEL) {
                    *v += rng.gen_range(0.0..=5.0) * self.severity;
                }
                if let Some(v) = adjusted.get_mut(MOTOR_CURRENT) {
                    *v += rng.gen_range(-5.0..=5.0) * self.severity;
                }
            }
        }
        adjusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::AMBIENT_TEMP;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pump_values() -> IndexMap<&'static str, f64> {
        IndexMap::from([
            (VIBRATION_VEL, 5.0),
            (BEARING_TEMP, 60.0),
            (MOTOR_CURRENT, 75.0),
            (DISCHARGE_PRESSURE, 15.0),
            (AMBIENT_TEMP, 25.0),
        ])
    }

    #[test]
    fn bearing_wear_fully_ramped_is_exact() {
        let model = FailureModel::new(FailureKind::BearingWear, 0.8);
        let mut rng = StdRng::seed_from_u64(0);
        // 240 hours elapsed: degradation saturates at 1.
        let out = model.apply(240.0 * 3600.0, &pump_values(), &mut rng);
        assert!((out[VIBRATION_VEL] - (5.0 + 15.0 * 0.8)).abs() < 1e-9);
        assert!((out[BEARING_TEMP] - (60.0 + 30.0 * 0.8)).abs() < 1e-9);

        // Further elapsed time changes nothing.
        let later = model.apply(1_000.0 * 3600.0, &pump_values(), &mut rng);
        assert_eq!(out[VIBRATION_VEL], later[VIBRATION_VEL]);
        assert_eq!(out[BEARING_TEMP], later[BEARING_TEMP]);
    }

    #[test]
    fn bearing_wear_ramps_linearly() {
        let model = FailureModel::new(FailureKind::BearingWear, 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let halfway = model.apply(120.0 * 3600.0, &pump_values(), &mut rng);
        assert!((halfway[VIBRATION_VEL] - (5.0 + 5.0 + 10.0 * 0.5)).abs() < 1e-9);
        assert!((halfway[BEARING_TEMP] - (60.0 + 10.0 + 20.0 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn misalignment_is_a_step_independent_of_elapsed_time() {
        let model = FailureModel::new(FailureKind::Misalignment, 0.6);
        let mut rng = StdRng::seed_from_u64(0);
        let early = model.apply(1.0, &pump_values(), &mut rng);
        let late = model.apply(500.0 * 3600.0, &pump_values(), &mut rng);
        assert_eq!(early, late);
        assert!((early[VIBRATION_VEL] - (5.0 + 3.0 * 0.6)).abs() < 1e-9);
        assert!((early[BEARING_TEMP] - (60.0 + 5.0 * 0.6)).abs() < 1e-9);
    }

    #[test]
    fn cavitation_scales_pressure_and_bounds_its_noise() {
        let model = FailureModel::new(FailureKind::Cavitation, 0.7);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let out = model.apply(0.0, &pump_values(), &mut rng);
            assert!((out[DISCHARGE_PRESSURE] - 15.0 * (1.0 - 0.3 * 0.7)).abs() < 1e-9);
            let vib_delta = out[VIBRATION_VEL] - 5.0;
            assert!((0.0..=5.0 * 0.7).contains(&vib_delta));
            let cur_delta = out[MOTOR_CURRENT] - 75.0;
            assert!((-5.0 * 0.7..=5.0 * 0.7).contains(&cur_delta));
        }
    }

    #[test]
    fn unrecognized_sensors_pass_through_unchanged() {
        let model = FailureModel::new(FailureKind::BearingWear, 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let input = IndexMap::from([(AMBIENT_TEMP, 25.0), ("flow_rate_m3_h", 110.0)]);
        let out = model.apply(3600.0, &input, &mut rng);
        assert_eq!(out, input);
    }

    #[test]
    fn apply_never_mutates_its_input() {
        let model = FailureModel::new(FailureKind::Misalignment, 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let input = pump_values();
        let _ = model.apply(10.0, &input, &mut rng);
        assert_eq!(input, pump_values());
    }
}
