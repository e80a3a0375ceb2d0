use crate::activity::{self, Activity, ActivityDetails};
use crate::activity_validation::{self, ActivityValidationError};
use crate::calculations::{CriticalEdge, CriticalPathAnalysis, compute_critical_path};
use crate::graph::{ActivityNetwork, EventId, FinishRule, NetworkBuilder, NetworkError};
use crate::metadata::ProjectMetadata;
use crate::risk::{self, RiskError, RiskSummary};
use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug)]
pub enum ProjectError {
    Validation(ActivityValidationError),
    Network(NetworkError),
    Risk(RiskError),
    InvalidTarget(f64),
    Frame(PolarsError),
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::Validation(err) => write!(f, "{err}"),
            ProjectError::Network(err) => write!(f, "{err}"),
            ProjectError::Risk(err) => write!(f, "{err}"),
            ProjectError::InvalidTarget(value) => write!(
                f,
                "target duration {value} must be a finite, non-negative number"
            ),
            ProjectError::Frame(err) => write!(f, "report table error: {err}"),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<ActivityValidationError> for ProjectError {
    fn from(value: ActivityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<NetworkError> for ProjectError {
    fn from(value: NetworkError) -> Self {
        Self::Network(value)
    }
}

impl From<RiskError> for ProjectError {
    fn from(value: RiskError) -> Self {
        Self::Risk(value)
    }
}

impl From<PolarsError> for ProjectError {
    fn from(value: PolarsError) -> Self {
        Self::Frame(value)
    }
}

/// Ordered activity list plus project settings. The list is kept valid at
/// all times: predecessors always precede their dependents.
#[derive(Debug, Clone, Default)]
pub struct Project {
    metadata: ProjectMetadata,
    activities: Vec<Activity>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_metadata(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            activities: Vec::new(),
        }
    }

    /// Builds a project from a stored activity list, validating its order.
    pub fn from_parts(
        metadata: ProjectMetadata,
        mut activities: Vec<Activity>,
    ) -> Result<Self, ProjectError> {
        for activity in &mut activities {
            activity.normalize();
        }
        activity_validation::validate_activity_collection(&activities)?;
        Self::validate_target(metadata.target_duration)?;
        Ok(Self {
            metadata,
            activities,
        })
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ProjectMetadata) -> Result<(), ProjectError> {
        Self::validate_target(metadata.target_duration)?;
        self.metadata = metadata;
        Ok(())
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.metadata.project_name = name.into();
    }

    pub fn set_project_description(&mut self, description: impl Into<String>) {
        self.metadata.project_description = description.into();
    }

    pub fn set_project_start_date(&mut self, date: NaiveDate) {
        self.metadata.project_start_date = date;
    }

    pub fn set_finish_rule(&mut self, rule: FinishRule) {
        self.metadata.finish_rule = rule;
    }

    pub fn set_target_duration(&mut self, target: Option<f64>) -> Result<(), ProjectError> {
        Self::validate_target(target)?;
        self.metadata.target_duration = target;
        Ok(())
    }

    fn validate_target(target: Option<f64>) -> Result<(), ProjectError> {
        match target {
            Some(value) if !value.is_finite() || value < 0.0 => {
                Err(ProjectError::InvalidTarget(value))
            }
            _ => Ok(()),
        }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn find_activity(&self, name: &str) -> Option<&Activity> {
        let name = activity::normalize_name(name);
        self.activities.iter().find(|a| a.name == name)
    }

    /// Replaces an activity with the same name in place, or appends it.
    pub fn upsert_activity(&mut self, mut activity: Activity) -> Result<(), ProjectError> {
        activity.normalize();
        activity_validation::validate_activity(&activity)?;

        let mut candidate = self.activities.clone();
        match candidate.iter().position(|a| a.name == activity.name) {
            Some(idx) => candidate[idx] = activity,
            None => candidate.push(activity),
        }
        activity_validation::validate_activity_collection(&candidate)?;
        self.activities = candidate;
        Ok(())
    }

    /// Removes an activity and drops it from every predecessor list.
    pub fn delete_activity(&mut self, name: &str) -> bool {
        let name = activity::normalize_name(name);
        let before = self.activities.len();
        self.activities.retain(|a| a.name != name);
        if self.activities.len() == before {
            return false;
        }
        for other in &mut self.activities {
            other.predecessors.retain(|p| p != &name);
        }
        true
    }

    pub fn build_network(&self) -> Result<ActivityNetwork, ProjectError> {
        let names: Vec<String> = self.activities.iter().map(|a| a.name.clone()).collect();
        let predecessors: Vec<Vec<String>> = self
            .activities
            .iter()
            .map(|a| a.predecessors.clone())
            .collect();
        let times = activity::expected_times(&self.activities);
        let network =
            NetworkBuilder::new(self.metadata.finish_rule).build(&names, &predecessors, &times)?;
        Ok(network)
    }

    /// Runs the whole pipeline. `target` overrides the stored target duration;
    /// with neither, the report has no probability section.
    pub fn analyze(&self, target: Option<f64>) -> Result<AnalysisReport, ProjectError> {
        let target = target.or(self.metadata.target_duration);
        Self::validate_target(target)?;
        activity_validation::validate_activity_collection(&self.activities)?;

        let network = self.build_network()?;
        let timing = compute_critical_path(&network)?;
        let details = activity::activity_details(&self.activities);
        let (sigma, critical_activities) =
            risk::sigma_for_critical_path(&timing.critical_edges, network.index(), &details)?;
        let mean = critical_mean(&critical_activities, &details);

        let risk = target.map(|target| {
            risk::compute_risk(&timing.critical_edges, network.index(), &details, target)
        });
        if let Some(Err(err)) = &risk {
            debug!(%err, "risk estimate unavailable");
        }

        info!(
            project = %self.metadata.project_name,
            activities = self.activities.len(),
            duration = timing.project_duration(),
            mean,
            sigma,
            "project analyzed"
        );

        Ok(AnalysisReport {
            activities: self.activities.clone(),
            network,
            timing,
            critical_activities,
            mean,
            sigma,
            risk,
            start_date: self.metadata.project_start_date,
        })
    }
}

/// Sum of expected times along the critical activities, in critical-edge
/// order. Starts from `0.0` so an empty set reads as zero, not `-0.0`.
fn critical_mean(critical_activities: &[String], details: &ActivityDetails) -> f64 {
    critical_activities
        .iter()
        .filter_map(|name| details.get(name))
        .map(Activity::expected_time)
        .fold(0.0, |total, te| total + te)
}

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub activities: Vec<Activity>,
    pub network: ActivityNetwork,
    pub timing: CriticalPathAnalysis,
    pub critical_activities: Vec<String>,
    pub mean: f64,
    pub sigma: f64,
    pub risk: Option<Result<RiskSummary, RiskError>>,
    pub start_date: NaiveDate,
}

/// Serializable view of an [`AnalysisReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub project_duration: f64,
    pub mean: f64,
    pub sigma: f64,
    pub finish_event: EventId,
    pub critical_activities: Vec<String>,
    pub critical_edges: Vec<CriticalEdge>,
    pub earliest: BTreeMap<EventId, f64>,
    pub latest: BTreeMap<EventId, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_finish_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_error: Option<String>,
}

impl AnalysisReport {
    pub fn project_duration(&self) -> f64 {
        self.timing.project_duration()
    }

    /// Project start plus the project duration in calendar days, rounded up.
    pub fn expected_finish_date(&self) -> Option<NaiveDate> {
        let days = self.project_duration().ceil();
        if !days.is_finite() {
            return None;
        }
        Duration::try_days(days as i64).and_then(|d| self.start_date.checked_add_signed(d))
    }

    pub fn summary(&self) -> AnalysisSummary {
        let (risk, risk_error) = match &self.risk {
            Some(Ok(summary)) => (Some(summary.clone()), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, None),
        };
        AnalysisSummary {
            project_duration: self.project_duration(),
            mean: self.mean,
            sigma: self.sigma,
            finish_event: self.timing.finish_event,
            critical_activities: self.critical_activities.clone(),
            critical_edges: self.timing.critical_edges.clone(),
            earliest: self.timing.earliest.clone(),
            latest: self.timing.latest.clone(),
            expected_finish_date: self.expected_finish_date(),
            risk,
            risk_error,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("activities={}", self.activities.len()));
        parts.push(format!("events={}", self.network.node_count()));
        parts.push(format!("duration={:.2}", self.project_duration()));
        parts.push(format!("mean={:.2}", self.mean));
        parts.push(format!("sigma={:.2}", self.sigma));
        if !self.critical_activities.is_empty() {
            parts.push(format!("critical={}", self.critical_activities.join("->")));
        }
        if let Some(date) = self.expected_finish_date() {
            parts.push(format!("finish={date}"));
        }
        match &self.risk {
            Some(Ok(summary)) => {
                parts.push(format!("target={}", summary.target_duration));
                parts.push(format!("z={:.2}", summary.z_score));
                parts.push(format!("probability={:.4}%", summary.probability_percent));
            }
            Some(Err(err)) => parts.push(format!("probability unavailable: {err}")),
            None => {}
        }
        parts.join(", ")
    }

    /// One row per activity with its timing and criticality.
    pub fn activity_frame(&self) -> Result<DataFrame, ProjectError> {
        let height = self.activities.len();
        let mut names = Vec::with_capacity(height);
        let mut preds = Vec::with_capacity(height);
        let mut optimistic = Vec::with_capacity(height);
        let mut most_likely = Vec::with_capacity(height);
        let mut pessimistic = Vec::with_capacity(height);
        let mut expected = Vec::with_capacity(height);
        let mut variance = Vec::with_capacity(height);
        let mut start_events: Vec<Option<u32>> = Vec::with_capacity(height);
        let mut end_events: Vec<Option<u32>> = Vec::with_capacity(height);
        let mut earliest_start: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut latest_finish: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut slack: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut critical = Vec::with_capacity(height);

        for activity in &self.activities {
            let te = activity.expected_time();
            names.push(activity.name.clone());
            preds.push(if activity.predecessors.is_empty() {
                "null".to_string()
            } else {
                activity.predecessors.join(",")
            });
            optimistic.push(activity.optimistic);
            most_likely.push(activity.most_likely);
            pessimistic.push(activity.pessimistic);
            expected.push(te);
            variance.push(activity.variance());

            let placement = self.network.index().placement(&activity.name);
            start_events.push(placement.map(|p| p.start));
            end_events.push(placement.map(|p| p.end));
            earliest_start.push(placement.and_then(|p| self.timing.earliest.get(&p.start).copied()));
            latest_finish.push(placement.and_then(|p| self.timing.latest.get(&p.end).copied()));
            slack.push(placement.and_then(|p| self.timing.slack(p.start, p.end, te)));
            critical.push(placement.is_some_and(|p| self.timing.is_critical_edge(p.edge)));
        }

        let columns = vec![
            Series::new(PlSmallStr::from_static("activity"), names).into_column(),
            Series::new(PlSmallStr::from_static("predecessors"), preds).into_column(),
            Series::new(PlSmallStr::from_static("optimistic"), optimistic).into_column(),
            Series::new(PlSmallStr::from_static("most_likely"), most_likely).into_column(),
            Series::new(PlSmallStr::from_static("pessimistic"), pessimistic).into_column(),
            Series::new(PlSmallStr::from_static("expected_time"), expected).into_column(),
            Series::new(PlSmallStr::from_static("variance"), variance).into_column(),
            Series::new(PlSmallStr::from_static("start_event"), start_events).into_column(),
            Series::new(PlSmallStr::from_static("end_event"), end_events).into_column(),
            Series::new(PlSmallStr::from_static("earliest_start"), earliest_start).into_column(),
            Series::new(PlSmallStr::from_static("latest_finish"), latest_finish).into_column(),
            Series::new(PlSmallStr::from_static("slack"), slack).into_column(),
            Series::new(PlSmallStr::from_static("is_critical"), critical).into_column(),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_critical_set_has_positive_zero_mean() {
        let mean = critical_mean(&[], &ActivityDetails::new());
        assert_eq!(mean, 0.0);
        assert!(mean.is_sign_positive());
        assert_eq!(format!("{mean:.2}"), "0.00");
    }

    #[test]
    fn critical_mean_adds_in_order() {
        let activities = vec![
            Activity::new("A", 1.0, 2.0, 4.0),
            Activity::new("B", 1.0, 2.0, 4.0),
        ];
        let details = activity::activity_details(&activities);
        let te = activities[0].expected_time();
        assert_eq!(
            critical_mean(&["A".to_string(), "B".to_string()], &details),
            0.0 + te + te
        );
    }
}
