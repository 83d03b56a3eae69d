//! Venue-selection bandit (Thompson sampling)
//!
//! One Beta(alpha, beta) arm per venue with alpha = 1 + successes and
//! beta = 1 + failures (Laplace 1/1 prior). Selection draws one sample per
//! arm and takes the largest; an update adds exactly one success or failure.
//! No decay: the whole run's history stays in the posterior.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

pub mod sampler;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// Per-venue counters. Arms are created at startup and never removed.
#[derive(Debug, Clone)]
struct Arm {
    venue_id: String,
    successes: u64,
    failures: u64,
    selections: u64,
}

impl Arm {
    fn new(venue_id: String) -> Self {
        Self {
            venue_id,
            successes: 0,
            failures: 0,
            selections: 0,
        }
    }

    fn alpha(&self) -> f64 {
        1.0 + self.successes as f64
    }

    fn beta(&self) -> f64 {
        1.0 + self.failures as f64
    }

    fn expected_value(&self) -> f64 {
        self.alpha() / (self.alpha() + self.beta())
    }
}

/// Read-only per-arm state for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ArmSnapshot {
    pub venue_id: String,
    pub successes: u64,
    pub failures: u64,
    pub alpha: f64,
    pub beta: f64,
    /// Posterior mean alpha / (alpha + beta)
    pub expected_value: f64,
    /// Observed success rate; 0 before the first outcome
    pub win_rate: f64,
    /// 1 minus the approximate 95% credible-interval width
    pub confidence: f64,
    pub selections: u64,
}

/// Thompson-sampling bandit over the configured venues
///
/// Owned by the engine; the RNG is an explicit argument so tests can seed it.
pub struct VenueBandit {
    // Registration order doubles as the tie-break order for equal samples.
    arms: Vec<Arm>,
}

impl VenueBandit {
    pub fn new<I, S>(venue_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arms: venue_ids.into_iter().map(|id| Arm::new(id.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    /// Draw one Beta sample per arm and return the venue with the largest.
    ///
    /// Strict comparison keeps the earliest-registered arm on an exact tie.
    /// Returns `None` only when no arms exist.
    pub fn select<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.arms.is_empty() {
            return None;
        }

        let mut best_idx = 0usize;
        let mut best_sample = f64::NEG_INFINITY;
        let mut trace = String::new();

        for (idx, arm) in self.arms.iter().enumerate() {
            let sample = sampler::sample_beta(rng, arm.alpha(), arm.beta());
            if !trace.is_empty() {
                trace.push_str(", ");
            }
            trace.push_str(&format!("{}:{:.3}", arm.venue_id, sample));

            if sample > best_sample {
                best_sample = sample;
                best_idx = idx;
            }
        }

        self.arms[best_idx].selections += 1;
        let chosen = self.arms[best_idx].venue_id.clone();
        debug!(chosen = %chosen, samples = %trace, "venue selected");
        Some(chosen)
    }

    /// Record one binary outcome for a venue.
    pub fn update(&mut self, venue_id: &str, success: bool) {
        let Some(arm) = self.arms.iter_mut().find(|a| a.venue_id == venue_id) else {
            warn!(venue = venue_id, "bandit update for unknown venue ignored");
            return;
        };

        if success {
            arm.successes += 1;
        } else {
            arm.failures += 1;
        }

        debug!(
            venue = venue_id,
            success,
            alpha = arm.alpha(),
            beta = arm.beta(),
            expected_value = format!("{:.3}", arm.expected_value()).as_str(),
            "bandit updated"
        );
    }

    /// Posterior mean for one venue, if it has an arm.
    pub fn expected_value(&self, venue_id: &str) -> Option<f64> {
        self.arms
            .iter()
            .find(|a| a.venue_id == venue_id)
            .map(Arm::expected_value)
    }

    /// Per-arm snapshot in registration order.
    pub fn snapshot(&self) -> Vec<ArmSnapshot> {
        self.arms
            .iter()
            .map(|arm| {
                let trials = arm.successes + arm.failures;
                let win_rate = if trials > 0 {
                    arm.successes as f64 / trials as f64
                } else {
                    0.0
                };
                ArmSnapshot {
                    venue_id: arm.venue_id.clone(),
                    successes: arm.successes,
                    failures: arm.failures,
                    alpha: arm.alpha(),
                    beta: arm.beta(),
                    expected_value: arm.expected_value(),
                    win_rate,
                    confidence: 1.0 - sampler::confidence_width(arm.alpha(), arm.beta()),
                    selections: arm.selections,
                }
            })
            .collect()
    }

    /// Restore one arm to the 1/1 prior. Selection counts are a session
    /// statistic and are kept.
    pub fn reset(&mut self, venue_id: &str) {
        if let Some(arm) = self.arms.iter_mut().find(|a| a.venue_id == venue_id) {
            arm.successes = 0;
            arm.failures = 0;
        }
    }

    pub fn reset_all(&mut self) {
        for arm in &mut self.arms {
            arm.successes = 0;
            arm.failures = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn three_venue_bandit() -> VenueBandit {
        VenueBandit::new(["base", "arbitrum", "optimism"])
    }

    #[test]
    fn fresh_arms_carry_the_laplace_prior() {
        let bandit = three_venue_bandit();
        for snap in bandit.snapshot() {
            assert_eq!(snap.alpha, 1.0);
            assert_eq!(snap.beta, 1.0);
            assert_eq!(snap.expected_value, 0.5);
            assert_eq!(snap.win_rate, 0.0);
            assert_eq!(snap.selections, 0);
        }
    }

    #[test]
    fn success_raises_and_failure_lowers_expected_value() {
        let mut bandit = three_venue_bandit();
        let before = bandit.expected_value("base").unwrap();

        bandit.update("base", true);
        let after_win = bandit.expected_value("base").unwrap();
        assert!(after_win > before);

        bandit.update("base", false);
        let after_loss = bandit.expected_value("base").unwrap();
        assert!(after_loss < after_win);

        // Other arms untouched
        assert_eq!(bandit.expected_value("arbitrum").unwrap(), 0.5);
    }

    #[test]
    fn select_prefers_the_arm_with_strong_evidence() {
        let mut bandit = VenueBandit::new(["strong", "weak"]);
        for _ in 0..50 {
            bandit.update("strong", true);
            bandit.update("weak", false);
        }

        let mut rng = StdRng::seed_from_u64(99);
        let mut strong_picks = 0;
        for _ in 0..100 {
            if bandit.select(&mut rng).unwrap() == "strong" {
                strong_picks += 1;
            }
        }
        assert!(strong_picks >= 90, "strong arm picked only {strong_picks}/100");
    }

    #[test]
    fn select_counts_selections_and_snapshot_keeps_order() {
        let mut bandit = three_venue_bandit();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            bandit.select(&mut rng).unwrap();
        }

        let snaps = bandit.snapshot();
        let ids: Vec<&str> = snaps.iter().map(|s| s.venue_id.as_str()).collect();
        assert_eq!(ids, ["base", "arbitrum", "optimism"]);
        assert_eq!(snaps.iter().map(|s| s.selections).sum::<u64>(), 10);
    }

    #[test]
    fn unknown_venue_update_is_ignored() {
        let mut bandit = three_venue_bandit();
        bandit.update("solana", true);
        for snap in bandit.snapshot() {
            assert_eq!(snap.successes + snap.failures, 0);
        }
    }

    #[test]
    fn reset_restores_the_prior() {
        let mut bandit = three_venue_bandit();
        for _ in 0..5 {
            bandit.update("base", true);
        }
        assert!(bandit.expected_value("base").unwrap() > 0.5);

        bandit.reset("base");
        assert_eq!(bandit.expected_value("base").unwrap(), 0.5);
    }

    #[test]
    fn empty_bandit_selects_nothing() {
        let mut bandit = VenueBandit::new(Vec::<String>::new());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(bandit.select(&mut rng).is_none());
    }
}
