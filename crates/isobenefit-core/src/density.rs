use rand::Rng;
use serde::{Deserialize, Serialize};

/// Named density levels, mapped to factors by `LandConfig::population_density`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityTier {
    High,
    Medium,
    Low,
    Empty,
}

/// Draw a density factor for a newly developed cell.
///
/// `prob_distribution` is read positionally rather than as a cumulative
/// partition: `p < d[0]` gives `factors[0]`, `d[1] <= p < d[2]` gives
/// `factors[1]`, anything else `factors[2]`. Callers should supply an
/// increasing distribution; this is not enforced.
pub fn assign_density<R: Rng + ?Sized>(
    rng: &mut R,
    prob_distribution: &[f64; 3],
    density_factors: &[f64; 3],
) -> f64 {
    let p = rng.random::<f64>();
    density_for_draw(p, prob_distribution, density_factors)
}

pub(crate) fn density_for_draw(p: f64, dist: &[f64; 3], factors: &[f64; 3]) -> f64 {
    if p >= 0.0 && p < dist[0] {
        factors[0]
    } else if p >= dist[1] && p < dist[2] {
        factors[1]
    } else {
        factors[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const FACTORS: [f64; 3] = [1.0, 0.1, 0.01];

    #[test]
    fn draws_map_onto_positional_thresholds() {
        let dist = [0.5, 0.5, 0.8];
        assert_eq!(density_for_draw(0.0, &dist, &FACTORS), 1.0);
        assert_eq!(density_for_draw(0.49, &dist, &FACTORS), 1.0);
        assert_eq!(density_for_draw(0.5, &dist, &FACTORS), 0.1);
        assert_eq!(density_for_draw(0.79, &dist, &FACTORS), 0.1);
        assert_eq!(density_for_draw(0.8, &dist, &FACTORS), 0.01);
    }

    #[test]
    fn reference_distribution_never_yields_medium() {
        // (0.7, 0.3, 0.0): the medium band [0.3, 0.0) is empty.
        let dist = [0.7, 0.3, 0.0];
        assert_eq!(density_for_draw(0.2, &dist, &FACTORS), 1.0);
        assert_eq!(density_for_draw(0.75, &dist, &FACTORS), 0.01);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        for _ in 0..500 {
            let d = assign_density(&mut rng, &dist, &FACTORS);
            assert!(d == 1.0 || d == 0.01, "unexpected factor {d}");
        }
    }

    #[test]
    fn assignment_is_deterministic_for_fixed_seed() {
        let dist = [0.3, 0.3, 0.9];
        let mut a = ChaCha12Rng::seed_from_u64(11);
        let mut b = ChaCha12Rng::seed_from_u64(11);
        let xs: Vec<f64> = (0..32).map(|_| assign_density(&mut a, &dist, &FACTORS)).collect();
        let ys: Vec<f64> = (0..32).map(|_| assign_density(&mut b, &dist, &FACTORS)).collect();
        assert_eq!(xs, ys);
    }
}
