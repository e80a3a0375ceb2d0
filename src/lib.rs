pub mod activity;
pub(crate) mod activity_validation;
pub mod calculations;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod risk;
pub mod stats;

pub use activity::{Activity, ActivityDetails, parse_predecessor_list};
pub use activity_validation::ActivityValidationError;
pub use calculations::{CriticalEdge, CriticalPathAnalysis, compute_critical_path};
pub use graph::{
    ActivityEdge, ActivityNetwork, EventId, FinishRule, NetworkBuilder, NetworkEdge, NetworkError,
    NetworkIndex, build_network,
};
pub use metadata::ProjectMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteProjectStore;
pub use persistence::{
    PersistenceError, ProjectStore, load_project_from_csv, load_project_from_json,
    save_project_to_csv, save_project_to_json, validate_activities, validate_project,
};
pub use project::{AnalysisReport, AnalysisSummary, Project, ProjectError};
pub use risk::{RiskError, RiskSummary, compute_risk, probability, sigma_for_critical_path};
pub use stats::standard_normal_cdf;
