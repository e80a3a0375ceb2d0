use crate::activity::ActivityDetails;
use crate::calculations::CriticalEdge;
use crate::graph::NetworkIndex;
use crate::stats::standard_normal_cdf;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Every critical activity has `optimistic == pessimistic`.
    ZeroVariance,
    MissingActivity(String),
    InvalidTarget(f64),
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskError::ZeroVariance => write!(
                f,
                "zero-variance critical path: completion probability is undefined"
            ),
            RiskError::MissingActivity(name) => {
                write!(f, "no estimates recorded for critical activity {name}")
            }
            RiskError::InvalidTarget(value) => {
                write!(f, "target duration {value} is not a finite number")
            }
        }
    }
}

impl std::error::Error for RiskError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub mean: f64,
    pub sigma: f64,
    pub target_duration: f64,
    pub z_score: f64,
    pub probability_percent: f64,
    pub critical_activities: Vec<String>,
}

/// Maps critical edges back to activities and combines their variances.
/// Merge edges have no activity and are skipped.
pub fn sigma_for_critical_path(
    critical_edges: &[CriticalEdge],
    index: &NetworkIndex,
    details: &ActivityDetails,
) -> Result<(f64, Vec<String>), RiskError> {
    let mut variance_sum = 0.0;
    let mut critical_activities = Vec::new();
    for critical in critical_edges {
        let Some(name) = index.activity_for_edge(critical.edge) else {
            continue;
        };
        let activity = details
            .get(name)
            .ok_or_else(|| RiskError::MissingActivity(name.to_string()))?;
        variance_sum += activity.variance();
        critical_activities.push(name.to_string());
    }
    Ok((variance_sum.sqrt(), critical_activities))
}

/// Returns `(z_score, probability_percent)` for finishing by `target`.
pub fn probability(mean: f64, sigma: f64, target: f64) -> Result<(f64, f64), RiskError> {
    if !target.is_finite() {
        return Err(RiskError::InvalidTarget(target));
    }
    if sigma == 0.0 {
        return Err(RiskError::ZeroVariance);
    }
    let z_score = (target - mean) / sigma;
    Ok((z_score, standard_normal_cdf(z_score) * 100.0))
}

pub fn compute_risk(
    critical_edges: &[CriticalEdge],
    index: &NetworkIndex,
    details: &ActivityDetails,
    target_duration: f64,
) -> Result<RiskSummary, RiskError> {
    let (sigma, critical_activities) = sigma_for_critical_path(critical_edges, index, details)?;
    let mut mean = 0.0;
    for name in &critical_activities {
        let activity = details
            .get(name)
            .ok_or_else(|| RiskError::MissingActivity(name.clone()))?;
        mean += activity.expected_time();
    }
    let (z_score, probability_percent) = probability(mean, sigma, target_duration)?;
    debug!(mean, sigma, target_duration, z_score, "risk estimated");
    Ok(RiskSummary {
        mean,
        sigma,
        target_duration,
        z_score,
        probability_percent,
        critical_activities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_at_mean_is_even_odds() {
        let (z, p) = probability(10.0, 2.0, 10.0).unwrap();
        assert_eq!(z, 0.0);
        assert!((p - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sigma_is_reported() {
        assert_eq!(probability(10.0, 0.0, 12.0), Err(RiskError::ZeroVariance));
    }

    #[test]
    fn non_finite_target_is_rejected() {
        assert!(matches!(
            probability(10.0, 1.0, f64::NAN),
            Err(RiskError::InvalidTarget(_))
        ));
    }
}
