//! Derived views over the entity store.

use std::sync::Arc;

use super::filter::ProjectFilter;
use super::project::Project;
use super::status::Status;
use super::store::Snapshot;
use super::EntityId;

/// One board column.
#[derive(Debug, Clone)]
pub struct Column {
    pub status: Status,
    pub projects: Vec<Arc<Project>>,
}

/// The four fixed status columns.
#[derive(Debug, Clone)]
pub struct BoardColumns {
    pub columns: [Column; 4],
}

impl BoardColumns {
    /// Partition by status, keeping the input order inside each column.
    pub fn partition(projects: &[Arc<Project>]) -> Self {
        let columns = Status::ALL.map(|status| Column {
            status,
            projects: projects
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect(),
        });
        Self { columns }
    }

    pub fn column(&self, status: Status) -> &Column {
        // Status::ALL order matches the array layout.
        &self.columns[Status::ALL.iter().position(|s| *s == status).unwrap_or(0)]
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.projects.len()).sum()
    }
}

/// Filtered board, recomputed only when the snapshot or the filter changed.
#[derive(Debug, Clone)]
pub struct BoardView {
    source: Snapshot,
    filter: ProjectFilter,
    columns: BoardColumns,
}

impl Default for BoardView {
    fn default() -> Self {
        Self {
            source: Snapshot::default(),
            filter: ProjectFilter::default(),
            columns: BoardColumns::partition(&[]),
        }
    }
}

impl BoardView {
    /// Bring the cached columns up to date. Returns `true` if recomputed.
    pub fn refresh(&mut self, snapshot: &Snapshot, filter: &ProjectFilter) -> bool {
        if self.source.ptr_eq(snapshot) && self.filter == *filter {
            return false;
        }
        let visible = filter.apply(snapshot.projects());
        self.columns = BoardColumns::partition(&visible);
        self.source = snapshot.clone();
        self.filter = filter.clone();
        true
    }

    pub fn columns(&self) -> &BoardColumns {
        &self.columns
    }
}

/// A view pinned to one project by id.
///
/// It keeps the id, never a copy, and resolves the project from the current
/// snapshot each time, so edits made from any other view show up at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectFocus {
    pub project_id: EntityId,
}

impl ProjectFocus {
    pub fn new(project_id: EntityId) -> Self {
        Self { project_id }
    }

    /// `None` once the project is gone from the store.
    pub fn resolve<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Arc<Project>> {
        snapshot.project(self.project_id)
    }
}
