//! ---
//! fsim_section: "03-engine"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Stochastic data-quality corruption pass."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-reading data-integrity marker, mirroring what real historians attach
/// to telemetry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    #[default]
    Good,
    Bad,
    Suspect,
    NoData,
}

/// Stateless corruption pass simulating sensor/telemetry imperfection.
///
/// This is synthetic noise by design, never an error condition: the generator
/// emits corrupted readings exactly as deliberately as clean ones. Memoryless
/// per reading; consecutive corrupted samples are uncorrelated.
#[derive(Debug, Clone, Copy)]
pub struct QualityInjector {
    corruption_probability: f64,
}

impl Default for QualityInjector {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl QualityInjector {
    pub fn new(corruption_probability: f64) -> Self {
        Self {
            corruption_probability: corruption_probability.clamp(0.0, 1.0),
        }
    }

    /// Possibly corrupt one reading. NO_DATA discards the value entirely;
    /// BAD and SUSPECT keep it. The returned pair always satisfies
    /// `value.is_none() == (quality == NoData)`.
    pub fn inject<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> (Option<f64>, Quality) {
        if rng.gen::<f64>() >= self.corruption_probability {
            return (Some(value), Quality::Good);
        }
        match rng.gen_range(0u8..3) {
            0 => (Some(value), Quality::Bad),
            1 => (None, Quality::NoData),
            _ => (Some(value), Quality::Suspect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn no_data_iff_value_absent() {
        let injector = QualityInjector::new(0.5);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            let (value, quality) = injector.inject(42.0, &mut rng);
            assert_eq!(value.is_none(), quality == Quality::NoData);
            if let Some(v) = value {
                assert_eq!(v, 42.0);
            }
        }
    }

    #[test]
    fn zero_probability_is_always_good() {
        let injector = QualityInjector::new(0.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let (value, quality) = injector.inject(7.0, &mut rng);
            assert_eq!(quality, Quality::Good);
            assert_eq!(value, Some(7.0));
        }
    }

    #[test]
    fn unit_probability_never_yields_good() {
        let injector = QualityInjector::new(1.0);
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..1_000 {
            let (_, quality) = injector.inject(7.0, &mut rng);
            assert_ne!(quality, Quality::Good);
        }
    }

    #[test]
    fn default_rate_corrupts_about_one_percent() {
        let injector = QualityInjector::default();
        let mut rng = StdRng::seed_from_u64(17);
        let corrupted = (0..100_000)
            .filter(|_| injector.inject(1.0, &mut rng).1 != Quality::Good)
            .count();
        assert!((500..2_000).contains(&corrupted), "corrupted = {corrupted}");
    }

    #[test]
    fn quality_tags_serialize_to_historian_codes() {
        assert_eq!(serde_json::to_string(&Quality::Good).unwrap(), "\"GOOD\"");
        assert_eq!(serde_json::to_string(&Quality::NoData).unwrap(), "\"NO_DATA\"");
        assert_eq!(serde_json::to_string(&Quality::Suspect).unwrap(), "\"SUSPECT\"");
    }
}
