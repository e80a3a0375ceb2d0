use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single project activity with its three-point PERT estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique, uppercase activity name.
    pub name: String,
    /// Names of the activities that must finish before this one starts.
    /// Empty means the activity only depends on the project start.
    #[serde(default)]
    pub predecessors: Vec<String>,
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
}

impl Activity {
    pub fn new(name: &str, optimistic: f64, most_likely: f64, pessimistic: f64) -> Self {
        Self {
            name: normalize_name(name),
            predecessors: Vec::new(),
            optimistic,
            most_likely,
            pessimistic,
        }
    }

    pub fn with_predecessors<I, S>(mut self, predecessors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.predecessors = predecessors
            .into_iter()
            .map(|p| normalize_name(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// PERT weighted mean `(o + 4m + p) / 6`.
    pub fn expected_time(&self) -> f64 {
        (self.optimistic + 4.0 * self.most_likely + self.pessimistic) / 6.0
    }

    /// `((p - o) / 6)^2`
    pub fn variance(&self) -> f64 {
        let spread = (self.pessimistic - self.optimistic) / 6.0;
        spread * spread
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Canonicalizes names in place so lookups are case-insensitive.
    pub(crate) fn normalize(&mut self) {
        self.name = normalize_name(&self.name);
        for pred in &mut self.predecessors {
            *pred = normalize_name(pred);
        }
        self.predecessors.retain(|p| !p.is_empty());
    }
}

pub type ActivityDetails = HashMap<String, Activity>;

pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Parses a comma separated predecessor field. `null` or an empty field
/// means the activity has no predecessors.
pub fn parse_predecessor_list(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(normalize_name)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn expected_times(activities: &[Activity]) -> HashMap<String, f64> {
    activities
        .iter()
        .map(|a| (a.name.clone(), a.expected_time()))
        .collect()
}

pub fn activity_details(activities: &[Activity]) -> ActivityDetails {
    activities
        .iter()
        .map(|a| (a.name.clone(), a.clone()))
        .collect()
}
