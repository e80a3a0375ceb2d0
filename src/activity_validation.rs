use crate::activity::Activity;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ActivityValidationError {
    message: String,
}

impl ActivityValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ActivityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActivityValidationError {}

fn check_time(activity: &Activity, field: &str, value: f64) -> Result<(), ActivityValidationError> {
    if !value.is_finite() {
        return Err(ActivityValidationError::new(format!(
            "activity {} has non-finite {} time {}",
            activity.name, field, value
        )));
    }
    if value < 0.0 {
        return Err(ActivityValidationError::new(format!(
            "activity {} has negative {} time {}",
            activity.name, field, value
        )));
    }
    Ok(())
}

pub fn validate_activity(activity: &Activity) -> Result<(), ActivityValidationError> {
    if activity.name.trim().is_empty() {
        return Err(ActivityValidationError::new(
            "activity requires a non-empty name",
        ));
    }

    check_time(activity, "optimistic", activity.optimistic)?;
    check_time(activity, "most likely", activity.most_likely)?;
    check_time(activity, "pessimistic", activity.pessimistic)?;

    let mut seen = HashSet::with_capacity(activity.predecessors.len());
    for pred in &activity.predecessors {
        if pred == &activity.name {
            return Err(ActivityValidationError::new(format!(
                "activity {} cannot depend on itself",
                activity.name
            )));
        }
        if !seen.insert(pred.as_str()) {
            return Err(ActivityValidationError::new(format!(
                "activity {} lists predecessor {} more than once",
                activity.name, pred
            )));
        }
    }

    Ok(())
}

/// Checks the whole ordered list. Every predecessor must be listed before
/// its dependent, which also rules out dependency cycles.
pub fn validate_activity_collection(activities: &[Activity]) -> Result<(), ActivityValidationError> {
    let mut defined: HashSet<&str> = HashSet::with_capacity(activities.len());
    let all: HashSet<&str> = activities.iter().map(|a| a.name.as_str()).collect();

    for activity in activities {
        validate_activity(activity)?;
        for pred in &activity.predecessors {
            if defined.contains(pred.as_str()) {
                continue;
            }
            if all.contains(pred.as_str()) {
                return Err(ActivityValidationError::new(format!(
                    "activity {} is listed before its predecessor {}",
                    activity.name, pred
                )));
            }
            return Err(ActivityValidationError::new(format!(
                "activity {} references unknown predecessor {}",
                activity.name, pred
            )));
        }
        if !defined.insert(activity.name.as_str()) {
            return Err(ActivityValidationError::new(format!(
                "duplicate activity name {}",
                activity.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_order_predecessor() {
        let activities = vec![
            Activity::new("B", 1.0, 1.0, 1.0).with_predecessors(["A"]),
            Activity::new("A", 1.0, 1.0, 1.0),
        ];
        let err = validate_activity_collection(&activities).unwrap_err();
        assert!(err.to_string().contains("listed before"));
    }

    #[test]
    fn does_not_enforce_estimate_ordering() {
        let a = Activity::new("A", 5.0, 2.0, 1.0);
        assert!(validate_activity(&a).is_ok());
    }
}
