use crate::error::{MutationFailed, Operation};
use crate::model::{EntityId, Status};

/// Identity of a status-bearing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Project(EntityId),
    /// `(project_id, task_id)`
    Task(EntityId, EntityId),
}

impl EntityKey {
    pub fn kind(self) -> EntityKind {
        match self {
            EntityKey::Project(_) => EntityKind::Project,
            EntityKey::Task(..) => EntityKind::Task,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Task,
}

impl EntityKind {
    pub fn noun(self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::Task => "Task",
        }
    }
}

/// What happened to one remote operation, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed { operation: Operation, count: usize },
    StatusUpdated {
        key: EntityKey,
        name: String,
        status: Status,
    },
    Saved {
        kind: EntityKind,
        name: String,
        created: bool,
    },
    /// The write went through but the list could not be fetched again.
    SavedWithoutRefresh {
        kind: EntityKind,
        name: String,
        created: bool,
        failure: MutationFailed,
    },
    Deleted { key: EntityKey, name: String },
    Failed(MutationFailed),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Failed(_) | Outcome::SavedWithoutRefresh { .. }
        )
    }

    /// One-line text for toasts and the status bar.
    pub fn message(&self) -> String {
        match self {
            Outcome::Listed { count, .. } => format!("Loaded {count} project(s)"),
            Outcome::StatusUpdated { key, name, status } => {
                format!("{} '{name}' moved to {}", key.kind().noun(), status.label())
            }
            Outcome::Saved {
                kind,
                name,
                created: true,
            } => format!("{} '{name}' created", kind.noun()),
            Outcome::Saved { kind, name, .. } => format!("{} '{name}' updated", kind.noun()),
            Outcome::SavedWithoutRefresh {
                kind,
                name,
                failure,
                ..
            } => format!(
                "{} '{name}' saved, but reloading failed: {}",
                kind.noun(),
                failure.source
            ),
            Outcome::Deleted { key, name } => format!("{} '{name}' deleted", key.kind().noun()),
            Outcome::Failed(failure) => failure.to_string(),
        }
    }
}
