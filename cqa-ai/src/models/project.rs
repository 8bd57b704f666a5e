//! Project model and status state machine
//!
//! PENDING → PROCESSING → COMPLETED | FAILED, re-runs go back to PROCESSING,
//! and any non-archived project may be ARCHIVED. ARCHIVED is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    /// Created, no batch run yet
    Pending,
    /// Batch analysis in progress
    Processing,
    /// Last batch finished with zero failures
    Completed,
    /// Last batch had at least one failure
    Failed,
    /// Soft-deleted
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "PENDING",
            ProjectStatus::Processing => "PROCESSING",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Failed => "FAILED",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        match (self, next) {
            (Archived, _) => false,
            (_, Archived) => true,
            (Pending, Processing) => true,
            (Processing, Completed) | (Processing, Failed) => true,
            (Completed, Processing) | (Failed, Processing) => true,
            _ => false,
        }
    }

    /// Batch outcome status: zero failures completes the project
    pub fn from_batch_outcome(failures: usize) -> Self {
        if failures == 0 {
            ProjectStatus::Completed
        } else {
            ProjectStatus::Failed
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ProjectStatus::Pending),
            "PROCESSING" => Ok(ProjectStatus::Processing),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "FAILED" => Ok(ProjectStatus::Failed),
            "ARCHIVED" => Ok(ProjectStatus::Archived),
            other => Err(format!("Invalid project status '{}'", other)),
        }
    }
}

/// A user-owned unit grouping uploaded files and their assessments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub total_files: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(ProjectStatus::Pending.can_transition_to(ProjectStatus::Processing));
        assert!(ProjectStatus::Processing.can_transition_to(ProjectStatus::Completed));
        assert!(ProjectStatus::Processing.can_transition_to(ProjectStatus::Failed));
        assert!(ProjectStatus::Failed.can_transition_to(ProjectStatus::Processing));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!ProjectStatus::Pending.can_transition_to(ProjectStatus::Completed));
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Failed));
        assert!(!ProjectStatus::Archived.can_transition_to(ProjectStatus::Processing));
        assert!(!ProjectStatus::Archived.can_transition_to(ProjectStatus::Archived));
    }

    #[test]
    fn test_archive_from_any_live_state() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Processing,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
        ] {
            assert!(status.can_transition_to(ProjectStatus::Archived));
        }
    }

    #[test]
    fn test_batch_outcome_status() {
        assert_eq!(ProjectStatus::from_batch_outcome(0), ProjectStatus::Completed);
        assert_eq!(ProjectStatus::from_batch_outcome(2), ProjectStatus::Failed);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [ProjectStatus::Pending, ProjectStatus::Archived] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<ProjectStatus>().is_err());
    }
}
