use crate::density::DensityTier;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Immutable parameter set for one simulation.
///
/// Every field is required in serialized form. `Default` is the reference
/// parameterisation of the isobenefit model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandConfig {
    /// Edge length of one square grid cell in metres.
    pub cell_size_m: f64,
    /// Walking radius for accessibility surfaces, in metres.
    pub walk_dist_m: f64,
    pub build_prob: f64,
    pub cent_prob_nb: f64,
    pub cent_prob_isol: f64,
    /// Population of one block at density factor 1.
    pub max_local_pop: u32,
    pub prob_distribution: [f64; 3],
    pub density_factors: [f64; 3],
    pub min_green_km2: f64,
    pub min_long_green_span_m: f64,
    pub min_short_green_span_m: f64,
    pub random_seed: u64,
}

impl Default for LandConfig {
    fn default() -> Self {
        Self {
            cell_size_m: 100.0,
            walk_dist_m: 1000.0,
            build_prob: 0.1,
            cent_prob_nb: 0.05,
            cent_prob_isol: 0.0,
            max_local_pop: 10_000,
            prob_distribution: [0.7, 0.3, 0.0],
            density_factors: [1.0, 0.1, 0.01],
            min_green_km2: 5.0,
            min_long_green_span_m: 500.0,
            min_short_green_span_m: 100.0,
            random_seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LandConfigError {
    InvalidCellSize(f64),
    InvalidWalkDistance(f64),
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    InvalidDensityFactor { index: usize, value: f64 },
    NegativeOrNonFinite { name: &'static str, value: f64 },
    ZeroLocalPopulation,
}

impl fmt::Display for LandConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandConfigError::InvalidCellSize(v) => {
                write!(f, "cell_size_m must be positive and finite (got {v})")
            }
            LandConfigError::InvalidWalkDistance(v) => {
                write!(f, "walk_dist_m must be positive and finite (got {v})")
            }
            LandConfigError::ProbabilityOutOfRange { name, value } => {
                write!(f, "{name} must be within [0, 1] (got {value})")
            }
            LandConfigError::InvalidDensityFactor { index, value } => write!(
                f,
                "density_factors[{index}] must be non-negative and finite (got {value})"
            ),
            LandConfigError::NegativeOrNonFinite { name, value } => {
                write!(f, "{name} must be non-negative and finite (got {value})")
            }
            LandConfigError::ZeroLocalPopulation => write!(f, "max_local_pop must be positive"),
        }
    }
}

impl Error for LandConfigError {}

fn check_probability(name: &'static str, value: f64) -> Result<(), LandConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LandConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), LandConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LandConfigError::NegativeOrNonFinite { name, value })
    }
}

impl LandConfig {
    pub fn validate(&self) -> Result<(), LandConfigError> {
        if !(self.cell_size_m.is_finite() && self.cell_size_m > 0.0) {
            return Err(LandConfigError::InvalidCellSize(self.cell_size_m));
        }
        if !(self.walk_dist_m.is_finite() && self.walk_dist_m > 0.0) {
            return Err(LandConfigError::InvalidWalkDistance(self.walk_dist_m));
        }
        check_probability("build_prob", self.build_prob)?;
        check_probability("cent_prob_nb", self.cent_prob_nb)?;
        check_probability("cent_prob_isol", self.cent_prob_isol)?;
        for (name, value) in ["prob_distribution[0]", "prob_distribution[1]", "prob_distribution[2]"]
            .into_iter()
            .zip(self.prob_distribution)
        {
            check_probability(name, value)?;
        }
        for (index, &value) in self.density_factors.iter().enumerate() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LandConfigError::InvalidDensityFactor { index, value });
            }
        }
        if self.max_local_pop == 0 {
            return Err(LandConfigError::ZeroLocalPopulation);
        }
        check_non_negative("min_green_km2", self.min_green_km2)?;
        check_non_negative("min_long_green_span_m", self.min_long_green_span_m)?;
        check_non_negative("min_short_green_span_m", self.min_short_green_span_m)?;
        Ok(())
    }

    /// Footprint of one cell in square kilometres.
    pub fn cell_area_km2(&self) -> f64 {
        (self.cell_size_m / 1000.0).powi(2)
    }

    /// Density factor associated with a tier; `Empty` is always zero.
    pub fn population_density(&self, tier: DensityTier) -> f64 {
        match tier {
            DensityTier::High => self.density_factors[0],
            DensityTier::Medium => self.density_factors[1],
            DensityTier::Low => self.density_factors[2],
            DensityTier::Empty => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(LandConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_walk_distance_is_rejected_up_front() {
        let config = LandConfig {
            walk_dist_m: 0.0,
            ..LandConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(LandConfigError::InvalidWalkDistance(0.0))
        );
    }

    #[test]
    fn nan_cell_size_is_rejected() {
        let config = LandConfig {
            cell_size_m: f64::NAN,
            ..LandConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LandConfigError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn probabilities_must_lie_in_unit_interval() {
        let config = LandConfig {
            cent_prob_nb: 1.5,
            ..LandConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(LandConfigError::ProbabilityOutOfRange {
                name: "cent_prob_nb",
                value: 1.5
            })
        );
        let config = LandConfig {
            prob_distribution: [0.7, -0.1, 0.0],
            ..LandConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LandConfigError::ProbabilityOutOfRange {
                name: "prob_distribution[1]",
                ..
            })
        ));
    }

    #[test]
    fn negative_spans_are_rejected() {
        let config = LandConfig {
            min_short_green_span_m: -1.0,
            ..LandConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LandConfigError::NegativeOrNonFinite {
                name: "min_short_green_span_m",
                ..
            })
        ));
    }

    #[test]
    fn population_density_table_follows_factors() {
        let config = LandConfig::default();
        assert_eq!(config.population_density(DensityTier::High), 1.0);
        assert_eq!(config.population_density(DensityTier::Medium), 0.1);
        assert_eq!(config.population_density(DensityTier::Low), 0.01);
        assert_eq!(config.population_density(DensityTier::Empty), 0.0);
    }

    #[test]
    fn config_requires_every_field_when_deserialized() {
        let json = serde_json::to_string(&LandConfig::default()).unwrap();
        let back: LandConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LandConfig::default());
        let missing = r#"{"cell_size_m": 100.0}"#;
        assert!(serde_json::from_str::<LandConfig>(missing).is_err());
    }
}
