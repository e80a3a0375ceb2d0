use super::{PersistenceError, PersistenceResult};
use crate::activity::{self, Activity};
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct ProjectSnapshot {
    metadata: ProjectMetadata,
    activities: Vec<Activity>,
}

impl ProjectSnapshot {
    fn from_project(project: &Project) -> PersistenceResult<Self> {
        super::validate_project(project)?;
        Ok(Self {
            metadata: project.metadata().clone(),
            activities: project.activities().to_vec(),
        })
    }

    fn into_project(self) -> PersistenceResult<Project> {
        Ok(Project::from_parts(self.metadata, self.activities)?)
    }
}

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let snapshot = ProjectSnapshot::from_project(project)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    debug!(path = %path.as_ref().display(), "project saved as json");
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    snapshot.into_project()
}

const METADATA_ROW: &str = "__metadata__";

#[derive(Default, Serialize, Deserialize)]
struct ActivityCsvRecord {
    name: String,
    predecessors: String,
    optimistic: String,
    most_likely: String,
    pessimistic: String,
    #[serde(default)]
    metadata_json: String,
}

impl From<&Activity> for ActivityCsvRecord {
    fn from(activity: &Activity) -> Self {
        ActivityCsvRecord {
            name: activity.name.clone(),
            predecessors: if activity.predecessors.is_empty() {
                "null".to_string()
            } else {
                activity.predecessors.join(",")
            },
            optimistic: activity.optimistic.to_string(),
            most_likely: activity.most_likely.to_string(),
            pessimistic: activity.pessimistic.to_string(),
            metadata_json: String::new(),
        }
    }
}

impl ActivityCsvRecord {
    fn metadata_row(metadata: &ProjectMetadata) -> PersistenceResult<Self> {
        Ok(ActivityCsvRecord {
            name: METADATA_ROW.to_string(),
            metadata_json: serde_json::to_string(metadata)?,
            ..Default::default()
        })
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_activity(self) -> PersistenceResult<Activity> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to activity".into(),
            ));
        }
        let optimistic = parse_time(&self.name, "optimistic", &self.optimistic)?;
        let most_likely = parse_time(&self.name, "most_likely", &self.most_likely)?;
        let pessimistic = parse_time(&self.name, "pessimistic", &self.pessimistic)?;
        Ok(Activity::new(&self.name, optimistic, most_likely, pessimistic)
            .with_predecessors(activity::parse_predecessor_list(&self.predecessors)))
    }
}

fn parse_time(name: &str, field: &str, input: &str) -> PersistenceResult<f64> {
    input.trim().parse::<f64>().map_err(|e| {
        PersistenceError::InvalidData(format!("activity {name}: invalid {field} '{input}': {e}"))
    })
}

pub fn save_project_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    super::validate_project(project)?;
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(ActivityCsvRecord::metadata_row(project.metadata())?)?;
    for activity in project.activities() {
        writer.serialize(ActivityCsvRecord::from(activity))?;
    }
    writer.flush()?;
    debug!(path = %path.as_ref().display(), "project saved as csv");
    Ok(())
}

pub fn load_project_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut activities = Vec::new();
    let mut metadata: Option<ProjectMetadata> = None;
    for record in reader.deserialize::<ActivityCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            continue;
        }
        activities.push(record.into_activity()?);
    }

    if activities.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no activities".into(),
        ));
    }

    Ok(Project::from_parts(metadata.unwrap_or_default(), activities)?)
}
