//! Sampling primitives for Thompson selection
//!
//! Beta draws are composed from two Gamma(shape, 1) draws. Gamma uses the
//! Marsaglia-Tsang rejection method with a Box-Muller normal proposal;
//! shapes below 1 are boosted through Gamma(s) = Gamma(s + 1) * U^(1/s).
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use rand::Rng;

/// Standard normal draw via the Box-Muller transform
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen::<f64>() is uniform on [0, 1); flip so the log argument stays positive
    let u = 1.0 - rng.gen::<f64>();
    let v = 1.0 - rng.gen::<f64>();
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

/// Gamma(shape, 1) draw, Marsaglia-Tsang method
pub fn sample_gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64) -> f64 {
    debug_assert!(shape > 0.0, "gamma shape must be positive");

    if shape < 1.0 {
        let u = 1.0 - rng.gen::<f64>(); // uniform on (0, 1]
        return sample_gamma(rng, 1.0 + shape) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let mut x;
        let mut v;
        loop {
            x = standard_normal(rng);
            v = 1.0 + c * x;
            if v > 0.0 {
                break;
            }
        }
        v = v * v * v;
        let u: f64 = rng.gen();

        // Cheap squeeze test first, log test only when it misses
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Beta(alpha, beta) draw as x / (x + y) with x ~ Gamma(alpha), y ~ Gamma(beta)
pub fn sample_beta<R: Rng + ?Sized>(rng: &mut R, alpha: f64, beta: f64) -> f64 {
    let x = sample_gamma(rng, alpha);
    let y = sample_gamma(rng, beta);
    x / (x + y)
}

/// Approximate 95% credible-interval width for Beta(alpha, beta)
///
/// Normal approximation; shrinks as evidence accumulates.
pub fn confidence_width(alpha: f64, beta: f64) -> f64 {
    let total = alpha + beta;
    let variance = (alpha * beta) / (total * total * (total + 1.0));
    1.96 * variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn beta_draws_stay_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(a, b) in &[(1.0, 1.0), (1.0, 9.0), (30.0, 2.0), (0.5, 0.5), (2.5, 7.5)] {
            for _ in 0..2_000 {
                let s = sample_beta(&mut rng, a, b);
                assert!((0.0..=1.0).contains(&s), "Beta({}, {}) drew {}", a, b, s);
            }
        }
    }

    #[test]
    fn beta_mean_converges_to_alpha_over_total() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(a, b) in &[(1.0, 1.0), (3.0, 1.0), (2.0, 8.0)] {
            let n = 20_000;
            let sum: f64 = (0..n).map(|_| sample_beta(&mut rng, a, b)).sum();
            let mean = sum / n as f64;
            let expected = a / (a + b);
            assert!(
                (mean - expected).abs() < 0.02,
                "Beta({}, {}) mean {} vs expected {}",
                a,
                b,
                mean,
                expected
            );
        }
    }

    #[test]
    fn gamma_draws_are_positive() {
        let mut rng = StdRng::seed_from_u64(123);
        for &shape in &[0.3, 0.9, 1.0, 2.0, 17.5] {
            for _ in 0..2_000 {
                assert!(sample_gamma(&mut rng, shape) > 0.0);
            }
        }
    }

    #[test]
    fn confidence_width_shrinks_with_evidence() {
        assert!(confidence_width(1.0, 1.0) > confidence_width(10.0, 10.0));
        assert!(confidence_width(10.0, 10.0) > confidence_width(100.0, 100.0));
    }
}
