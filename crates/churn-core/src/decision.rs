//! Decision policy: probability -> binary churn label.

use serde::{Deserialize, Serialize};

/// Threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("threshold must be a finite value in [0, 1], got {0}")]
pub struct InvalidThreshold(pub f64);

/// Labels a probability `1` when it is strictly greater than the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, probability: f64) -> u8 {
        u8::from(probability > self.threshold)
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_strictly_greater_than() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.50001), 1);
        assert_eq!(policy.decide(0.5), 0);
        assert_eq!(policy.decide(0.49999), 0);
        assert_eq!(policy.decide(1.0), 1);
        assert_eq!(policy.decide(0.0), 0);
    }

    #[test]
    fn configured_threshold() {
        let policy = DecisionPolicy::new(0.3).unwrap();
        assert_eq!(policy.threshold(), 0.3);
        assert_eq!(policy.decide(0.31), 1);
        assert_eq!(policy.decide(0.3), 0);
    }

    #[test]
    fn edge_thresholds() {
        // At 1.0 nothing churns; at 0.0 anything above zero does.
        assert_eq!(DecisionPolicy::new(1.0).unwrap().decide(1.0), 0);
        assert_eq!(DecisionPolicy::new(0.0).unwrap().decide(1e-9), 1);
        assert_eq!(DecisionPolicy::new(0.0).unwrap().decide(0.0), 0);
    }

    #[test]
    fn out_of_range_thresholds_rejected() {
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(DecisionPolicy::new(bad).is_err(), "{bad} accepted");
        }
    }
}
