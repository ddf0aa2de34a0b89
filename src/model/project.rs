use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::{Status, Team};
use super::task::Task;
use super::EntityId;
use crate::error::ValidationFailed;

/// A project and the tasks it owns, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub team_responsible: Team,
    pub status: Status,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub tasks: Vec<Arc<Task>>,
}

impl Project {
    pub fn task(&self, task_id: EntityId) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == Status::Finalizado)
            .count()
    }

    /// Percentage of finished tasks, rounded; 0 without tasks.
    pub fn progress(&self) -> u8 {
        if self.tasks.is_empty() {
            return 0;
        }
        let pct = self.completed_tasks() as f64 * 100.0 / self.tasks.len() as f64;
        pct.round() as u8
    }
}

/// Format a date the way the board displays it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Form value for creating (`id == None`) or editing a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_responsible: Team,
    pub status: Status,
}

impl ProjectDraft {
    /// Blank draft for the column the user added it from.
    pub fn new(status: Status) -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            start_date: None,
            end_date: None,
            team_responsible: Team::AdmFin,
            status,
        }
    }

    pub fn from_project(project: &Project) -> Self {
        Self {
            id: Some(project.id),
            name: project.name.clone(),
            description: project.description.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            team_responsible: project.team_responsible,
            status: project.status,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Check required fields and date ordering before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationFailed> {
        let mut errors = ValidationFailed::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push("endDate", "End date must not be before the start date");
            }
        }
        errors.into_result()
    }
}

/// Serde helper: `null` decodes as the type's default.
pub(crate) mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
