//! In-memory source of truth for every view.
//!
//! The store never edits a project or task in place. Each mutation rebuilds
//! the changed task, its project and the top-level list, sharing everything
//! else with the previous [`Snapshot`], so `Arc::ptr_eq` tells observers
//! exactly what changed.

use std::sync::Arc;

use super::project::Project;
use super::status::Status;
use super::task::Task;
use super::EntityId;

/// Immutable view of the project list at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    projects: Arc<[Arc<Project>]>,
}

impl Snapshot {
    pub fn projects(&self) -> &[Arc<Project>] {
        &self.projects
    }

    pub fn project(&self, id: EntityId) -> Option<&Arc<Project>> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, project_id: EntityId, task_id: EntityId) -> Option<&Arc<Task>> {
        self.project(project_id).and_then(|p| p.task(task_id))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// True when both snapshots are the same allocation.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.projects, &other.projects)
    }
}

/// Handle returned by [`EntityStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&Snapshot)>;

/// Owns the current [`Snapshot`] and notifies observers after each change.
#[derive(Default)]
pub struct EntityStore {
    snapshot: Snapshot,
    revision: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of committed changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register an observer; it runs synchronously after every change.
    pub fn subscribe(&mut self, observer: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    // --- Mutations ---

    /// Replace the whole collection with an authoritative list.
    pub fn replace_all(&mut self, projects: Vec<Project>) {
        let projects: Vec<Arc<Project>> = projects
            .into_iter()
            .map(|p| Arc::new(adopt_tasks(p)))
            .collect();
        self.commit(projects, "replace_all");
    }

    /// Insert or replace a project by id; new projects go last.
    pub fn upsert_project(&mut self, project: Project) {
        let project = Arc::new(adopt_tasks(project));
        let mut projects = self.snapshot.projects.to_vec();
        match projects.iter().position(|p| p.id == project.id) {
            Some(idx) => projects[idx] = project,
            None => projects.push(project),
        }
        self.commit(projects, "upsert_project");
    }

    pub fn remove_project(&mut self, id: EntityId) -> bool {
        if self.snapshot.project(id).is_none() {
            return false;
        }
        let projects = self
            .snapshot
            .projects
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        self.commit(projects, "remove_project");
        true
    }

    /// Insert or replace a task inside its project. Returns `false` when the
    /// project is unknown.
    pub fn upsert_task_in_project(&mut self, project_id: EntityId, mut task: Task) -> bool {
        task.project_id = project_id;
        let task = Arc::new(task);
        self.rebuild_project(project_id, "upsert_task_in_project", |project| {
            match project.tasks.iter().position(|t| t.id == task.id) {
                Some(idx) => project.tasks[idx] = task,
                None => project.tasks.push(task),
            }
            true
        })
    }

    pub fn remove_task_from_project(&mut self, project_id: EntityId, task_id: EntityId) -> bool {
        self.rebuild_project(project_id, "remove_task_from_project", |project| {
            let before = project.tasks.len();
            project.tasks.retain(|t| t.id != task_id);
            project.tasks.len() != before
        })
    }

    /// Set a task's status. Returns the previous status, or `None` when the
    /// task is unknown. Setting the current status again changes nothing.
    pub fn patch_task_status(
        &mut self,
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    ) -> Option<Status> {
        let previous = self.snapshot.task(project_id, task_id)?.status;
        if previous != status {
            self.rebuild_project(project_id, "patch_task_status", |project| {
                if let Some(slot) = project.tasks.iter_mut().find(|t| t.id == task_id) {
                    let mut task = Task::clone(slot);
                    task.status = status;
                    *slot = Arc::new(task);
                }
                true
            });
        }
        Some(previous)
    }

    /// Set a project's status. Returns the previous status, or `None` when
    /// the project is unknown. Setting the current status again changes
    /// nothing.
    pub fn patch_project_status(&mut self, id: EntityId, status: Status) -> Option<Status> {
        let previous = self.snapshot.project(id)?.status;
        if previous != status {
            self.rebuild_project(id, "patch_project_status", |project| {
                project.status = status;
                true
            });
        }
        Some(previous)
    }

    // --- Internals ---

    /// Clone one project, let `edit` change it, and swap it into a new list.
    /// Nothing is committed when the project is missing or `edit` reports no
    /// change.
    fn rebuild_project(
        &mut self,
        project_id: EntityId,
        op: &'static str,
        edit: impl FnOnce(&mut Project) -> bool,
    ) -> bool {
        let Some(idx) = self.snapshot.projects.iter().position(|p| p.id == project_id) else {
            return false;
        };
        let mut project = Project::clone(&self.snapshot.projects[idx]);
        if !edit(&mut project) {
            return false;
        }
        let mut projects = self.snapshot.projects.to_vec();
        projects[idx] = Arc::new(project);
        self.commit(projects, op);
        true
    }

    fn commit(&mut self, projects: Vec<Arc<Project>>, op: &'static str) {
        self.snapshot = Snapshot {
            projects: projects.into(),
        };
        self.revision += 1;
        tracing::debug!(
            op,
            revision = self.revision,
            projects = self.snapshot.len(),
            "Entity store updated"
        );
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.snapshot);
        }
    }
}

/// Point every task's back-reference at its owning project.
fn adopt_tasks(mut project: Project) -> Project {
    let id = project.id;
    for task in project.tasks.iter_mut() {
        if task.project_id != id {
            Arc::make_mut(task).project_id = id;
        }
    }
    project
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::status::{Responsible, Team};

    fn task(id: EntityId, project_id: EntityId) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            responsible: Responsible::Plo,
            due_days: 3,
            status: Status::Planejado,
            project_id,
        }
    }

    fn project(id: EntityId, tasks: Vec<Task>) -> Project {
        Project {
            id,
            name: format!("project {id}"),
            description: String::new(),
            start_date: None,
            end_date: None,
            team_responsible: Team::AdmFin,
            status: Status::Planejado,
            tasks: tasks.into_iter().map(Arc::new).collect(),
        }
    }

    fn seeded() -> EntityStore {
        let mut store = EntityStore::new();
        store.replace_all(vec![
            project(1, vec![task(10, 1), task(11, 1)]),
            project(2, vec![task(20, 2)]),
            project(3, vec![]),
        ]);
        store
    }

    fn assert_back_references(store: &EntityStore) {
        for p in store.snapshot().projects() {
            for t in &p.tasks {
                assert_eq!(t.project_id, p.id, "task {} in project {}", t.id, p.id);
            }
        }
    }

    #[test]
    fn replace_all_fills_missing_back_references() {
        let mut store = EntityStore::new();
        store.replace_all(vec![project(5, vec![task(1, 0), task(2, 99)])]);
        assert_back_references(&store);
    }

    #[test]
    fn back_references_hold_after_mutation_sequence() {
        let mut store = seeded();
        store.upsert_task_in_project(3, task(30, 1));
        store.upsert_task_in_project(1, task(12, 7));
        store.remove_task_from_project(1, 10);
        store.patch_task_status(2, 20, Status::Finalizado);
        store.upsert_project(project(4, vec![task(40, 0)]));
        store.remove_project(2);
        store.patch_project_status(3, Status::Abortado);
        assert_back_references(&store);
        assert_eq!(store.snapshot().len(), 3);
    }

    #[test]
    fn patch_task_status_rebuilds_only_the_ancestor_chain() {
        let mut store = seeded();
        let before = store.snapshot().clone();

        let previous = store.patch_task_status(1, 11, Status::EmExecucao);
        assert_eq!(previous, Some(Status::Planejado));

        let after = store.snapshot();
        assert!(!after.ptr_eq(&before));
        assert!(!Arc::ptr_eq(&after.projects()[0], &before.projects()[0]));
        assert!(Arc::ptr_eq(&after.projects()[1], &before.projects()[1]));
        assert!(Arc::ptr_eq(
            &after.projects()[0].tasks[0],
            &before.projects()[0].tasks[0]
        ));
        assert!(!Arc::ptr_eq(
            &after.projects()[0].tasks[1],
            &before.projects()[0].tasks[1]
        ));
        assert_eq!(after.task(1, 11).unwrap().status, Status::EmExecucao);
        assert_eq!(before.task(1, 11).unwrap().status, Status::Planejado);
    }

    #[test]
    fn patching_same_project_status_twice_is_idempotent() {
        let mut store = seeded();
        store.patch_project_status(2, Status::Finalizado);
        let once = store.snapshot().clone();
        let revision = store.revision();

        assert_eq!(
            store.patch_project_status(2, Status::Finalizado),
            Some(Status::Finalizado)
        );
        assert!(store.snapshot().ptr_eq(&once));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn unknown_ids_leave_the_snapshot_alone() {
        let mut store = seeded();
        let before = store.snapshot().clone();
        assert_eq!(store.patch_project_status(99, Status::Abortado), None);
        assert_eq!(store.patch_task_status(1, 99, Status::Abortado), None);
        assert!(!store.remove_project(99));
        assert!(!store.remove_task_from_project(1, 99));
        assert!(!store.upsert_task_in_project(99, task(1, 99)));
        assert!(store.snapshot().ptr_eq(&before));
    }

    #[test]
    fn upsert_project_keeps_position() {
        let mut store = seeded();
        let mut renamed = project(2, vec![]);
        renamed.name = "renamed".into();
        store.upsert_project(renamed);

        let names: Vec<_> = store
            .snapshot()
            .projects()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["project 1", "renamed", "project 3"]);
    }

    #[test]
    fn upsert_task_appends_in_insertion_order() {
        let mut store = seeded();
        store.upsert_task_in_project(1, task(12, 1));
        let ids: Vec<_> = store.snapshot().project(1).unwrap().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, [10, 11, 12]);
    }

    #[test]
    fn observers_run_after_every_change() {
        let mut store = EntityStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |snap| sink.borrow_mut().push(snap.len()));

        store.replace_all(vec![project(1, vec![])]);
        store.upsert_project(project(2, vec![]));
        store.patch_project_status(1, Status::Planejado); // no change
        store.remove_project(1);
        assert_eq!(*seen.borrow(), [1, 2, 1]);

        assert!(store.unsubscribe(sub));
        store.remove_project(2);
        assert_eq!(seen.borrow().len(), 3);
    }
}
