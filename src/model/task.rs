use serde::{Deserialize, Serialize};

use super::project::nullable;
use super::status::{Responsible, Status};
use super::EntityId;
use crate::error::ValidationFailed;

/// A task owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub responsible: Responsible,
    /// Relative deadline in days.
    pub due_days: i32,
    pub status: Status,
    /// Back-reference to the owning project. The API leaves it out of task
    /// bodies; the store fills it in.
    #[serde(default)]
    pub project_id: EntityId,
}

/// Form value for creating (`id == None`) or editing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub title: String,
    pub description: String,
    pub responsible: Responsible,
    pub due_days: i32,
    pub status: Status,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            responsible: Responsible::Plo,
            due_days: 1,
            status: Status::Planejado,
        }
    }
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            responsible: task.responsible,
            due_days: task.due_days,
            status: task.status,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Check required fields before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationFailed> {
        let mut errors = ValidationFailed::default();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.due_days < 1 {
            errors.push("dueDays", "Due days must be at least 1");
        }
        errors.into_result()
    }
}
