use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::project::Project;
use super::status::{Responsible, Status, Team};

/// Conjunctive board filter. An empty dimension places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFilter {
    /// Case-insensitive substring of the project name. Not persisted.
    #[serde(skip)]
    pub search: String,
    pub status: Option<Status>,
    pub team: Option<Team>,
    /// Keeps projects where at least one task has this responsible.
    pub responsible: Option<Responsible>,
}

impl ProjectFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.status.is_none()
            && self.team.is_none()
            && self.responsible.is_none()
    }

    pub fn matches(&self, project: &Project) -> bool {
        let term = self.search.trim();
        if !term.is_empty() && !project.name.to_lowercase().contains(&term.to_lowercase()) {
            return false;
        }
        if self.status.is_some_and(|s| project.status != s) {
            return false;
        }
        if self.team.is_some_and(|t| project.team_responsible != t) {
            return false;
        }
        if let Some(responsible) = self.responsible {
            if !project.tasks.iter().any(|t| t.responsible == responsible) {
                return false;
            }
        }
        true
    }

    /// Matching projects in their original order.
    pub fn apply(&self, projects: &[Arc<Project>]) -> Vec<Arc<Project>> {
        projects
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}
