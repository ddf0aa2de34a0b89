//! Optimistic mutation engine.
//!
//! Every remote-backed change goes through [`MutationEngine`]. Calls run on
//! the tokio runtime and report back as [`Completion`]s; the owner of the
//! [`EntityStore`] drains them on its own thread with [`MutationEngine::poll`]
//! so the store is only ever touched from one place.
//!
//! Policies:
//! - status changes are optimistic, with rollback to the last status the
//!   server confirmed when the newest request for that entity fails;
//! - create/edit are not applied locally; the authoritative list is
//!   re-fetched after the server accepts them;
//! - deletes are pessimistic: the entity leaves the store only after the
//!   server confirms.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::debounce::Debouncer;
use super::outcome::{EntityKey, EntityKind, Outcome};
use crate::error::{GatewayError, MutationFailed, Operation, ValidationFailed};
use crate::io::Gateway;
use crate::model::{EntityId, EntityStore, Project, ProjectDraft, Status, Task, TaskDraft};

/// Callback fired from the runtime whenever a completion is queued.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Result of a spawned remote call, applied on the store's thread.
#[derive(Debug)]
enum Completion {
    Listed {
        generation: u64,
        operation: Operation,
        result: Result<Vec<Project>, GatewayError>,
    },
    StatusPatched {
        key: EntityKey,
        seq: u64,
        status: Status,
        name: String,
        patch: Result<(), GatewayError>,
        /// Only attempted when the patch succeeded.
        refresh: Option<Result<Vec<Project>, GatewayError>>,
    },
    Saved {
        kind: EntityKind,
        name: String,
        created: bool,
        saved: Result<SavedEntity, GatewayError>,
        /// Only attempted when the save succeeded.
        refresh: Option<Result<Vec<Project>, GatewayError>>,
    },
    Deleted {
        key: EntityKey,
        name: String,
        result: Result<(), GatewayError>,
    },
}

/// Entity returned by a successful POST/PUT.
#[derive(Debug)]
enum SavedEntity {
    Project(Project),
    Task(EntityId, Task),
}

#[derive(Debug, Clone, Copy)]
struct PendingStatus {
    seq: u64,
    /// Last status the server is known to hold.
    baseline: Status,
    /// Optimistic value currently shown.
    target: Status,
    /// Requests for this entity still waiting for an answer.
    in_flight: usize,
    /// State of the latest request.
    phase: Phase,
}

/// Kept until every request for the entity has answered, so late answers
/// for older requests can still be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Confirmed,
    RolledBack,
}

pub struct MutationEngine {
    gateway: Arc<dyn Gateway>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    notify: Option<Notify>,
    pending_status: HashMap<EntityKey, PendingStatus>,
    next_seq: u64,
    listing_generation: u64,
    loading: bool,
    submitting: usize,
    search: Debouncer,
}

impl MutationEngine {
    pub fn new(gateway: Arc<dyn Gateway>, runtime: Handle, search_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            runtime,
            tx,
            rx,
            notify: None,
            pending_status: HashMap::new(),
            next_seq: 0,
            listing_generation: 0,
            loading: false,
            submitting: 0,
            search: Debouncer::new(search_delay),
        }
    }

    /// Wake the UI when a response arrives.
    pub fn with_notify(mut self, notify: Notify) -> Self {
        self.notify = Some(notify);
        self
    }

    /// A full listing (initial load or search) is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// A create/edit submission is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.submitting > 0
    }

    /// A debounced search has not fired yet.
    pub fn is_search_pending(&self) -> bool {
        self.search.is_pending()
    }

    // --- Listing ---

    /// Fetch the full project list.
    pub fn load(&mut self) {
        self.search.cancel();
        let generation = self.bump_listing();
        let gateway = Arc::clone(&self.gateway);
        tracing::info!(generation, "Loading projects");
        self.spawn(async move {
            Completion::Listed {
                generation,
                operation: Operation::Load,
                result: gateway.list_projects().await,
            }
        });
    }

    /// Debounced server-side search; a blank term lists everything.
    pub fn search(&mut self, term: &str) {
        let generation = self.bump_listing();
        let term = term.trim().to_string();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        self.search.schedule(&self.runtime, async move {
            let completion = if term.is_empty() {
                Completion::Listed {
                    generation,
                    operation: Operation::Load,
                    result: gateway.list_projects().await,
                }
            } else {
                tracing::debug!(term = %term, "Searching projects");
                Completion::Listed {
                    generation,
                    operation: Operation::Search,
                    result: gateway.search_projects(&term).await,
                }
            };
            deliver(&tx, notify.as_ref(), completion);
        });
    }

    fn bump_listing(&mut self) -> u64 {
        self.listing_generation += 1;
        self.loading = true;
        self.listing_generation
    }

    // --- Status changes (optimistic) ---

    /// Show the new project status at once, then PATCH and re-list.
    /// Returns `false` when the project is not in the store.
    pub fn update_project_status(
        &mut self,
        store: &mut EntityStore,
        id: EntityId,
        status: Status,
    ) -> bool {
        let Some(name) = store.snapshot().project(id).map(|p| p.name.clone()) else {
            tracing::warn!(id, "Status change for unknown project ignored");
            return false;
        };
        let Some(previous) = store.patch_project_status(id, status) else {
            return false;
        };
        if previous == status {
            return false;
        }
        let key = EntityKey::Project(id);
        let seq = self.track_status(key, previous, status);
        tracing::info!(id, %status, seq, "Updating project status");

        let gateway = Arc::clone(&self.gateway);
        self.spawn(async move {
            let patch = gateway.update_project_status(id, status).await;
            let refresh = match patch {
                Ok(()) => Some(gateway.list_projects().await),
                Err(_) => None,
            };
            Completion::StatusPatched {
                key,
                seq,
                status,
                name,
                patch,
                refresh,
            }
        });
        true
    }

    /// Show the new task status at once, then PATCH and re-list.
    /// Returns `false` when the task is not in the store.
    pub fn update_task_status(
        &mut self,
        store: &mut EntityStore,
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    ) -> bool {
        let Some(name) = store
            .snapshot()
            .task(project_id, task_id)
            .map(|t| t.title.clone())
        else {
            tracing::warn!(project_id, task_id, "Status change for unknown task ignored");
            return false;
        };
        let Some(previous) = store.patch_task_status(project_id, task_id, status) else {
            return false;
        };
        if previous == status {
            return false;
        }
        let key = EntityKey::Task(project_id, task_id);
        let seq = self.track_status(key, previous, status);
        tracing::info!(project_id, task_id, %status, seq, "Updating task status");

        let gateway = Arc::clone(&self.gateway);
        self.spawn(async move {
            let patch = gateway
                .update_task_status(project_id, task_id, status)
                .await;
            let refresh = match patch {
                Ok(()) => Some(gateway.list_projects().await),
                Err(_) => None,
            };
            Completion::StatusPatched {
                key,
                seq,
                status,
                name,
                patch,
                refresh,
            }
        });
        true
    }

    fn track_status(&mut self, key: EntityKey, previous: Status, target: Status) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        let (baseline, in_flight) = self
            .pending_status
            .get(&key)
            .map_or((previous, 0), |pending| (pending.baseline, pending.in_flight));
        self.pending_status.insert(
            key,
            PendingStatus {
                seq,
                baseline,
                target,
                in_flight: in_flight + 1,
                phase: Phase::Waiting,
            },
        );
        seq
    }

    // --- Create / edit (re-list on success) ---

    /// Validate and submit a project form. Nothing is sent when validation
    /// fails.
    pub fn save_project(&mut self, draft: &ProjectDraft) -> Result<(), ValidationFailed> {
        draft.validate()?;
        let draft = draft.clone();
        let gateway = Arc::clone(&self.gateway);
        let created = draft.is_new();
        self.submitting += 1;
        tracing::info!(id = ?draft.id, name = %draft.name, "Saving project");
        self.spawn(async move {
            let saved = match draft.id {
                Some(id) => gateway.update_project(id, &draft).await,
                None => gateway.create_project(&draft).await,
            }
            .map(SavedEntity::Project);
            let refresh = match saved {
                Ok(_) => Some(gateway.list_projects().await),
                Err(_) => None,
            };
            Completion::Saved {
                kind: EntityKind::Project,
                name: draft.name,
                created,
                saved,
                refresh,
            }
        });
        Ok(())
    }

    /// Validate and submit a task form for `project_id`.
    pub fn save_task(
        &mut self,
        project_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<(), ValidationFailed> {
        draft.validate()?;
        let draft = draft.clone();
        let gateway = Arc::clone(&self.gateway);
        let created = draft.is_new();
        self.submitting += 1;
        tracing::info!(project_id, id = ?draft.id, title = %draft.title, "Saving task");
        self.spawn(async move {
            let saved = match draft.id {
                Some(task_id) => gateway.update_task(project_id, task_id, &draft).await,
                None => gateway.create_task(project_id, &draft).await,
            }
            .map(|task| SavedEntity::Task(project_id, task));
            let refresh = match saved {
                Ok(_) => Some(gateway.list_projects().await),
                Err(_) => None,
            };
            Completion::Saved {
                kind: EntityKind::Task,
                name: draft.title,
                created,
                saved,
                refresh,
            }
        });
        Ok(())
    }

    // --- Deletes (pessimistic) ---

    pub fn delete_project(&mut self, store: &EntityStore, id: EntityId) {
        let name = store
            .snapshot()
            .project(id)
            .map_or_else(|| format!("#{id}"), |p| p.name.clone());
        let gateway = Arc::clone(&self.gateway);
        tracing::info!(id, "Deleting project");
        self.spawn(async move {
            Completion::Deleted {
                key: EntityKey::Project(id),
                name,
                result: gateway.delete_project(id).await,
            }
        });
    }

    pub fn delete_task(&mut self, store: &EntityStore, project_id: EntityId, task_id: EntityId) {
        let name = store
            .snapshot()
            .task(project_id, task_id)
            .map_or_else(|| format!("#{task_id}"), |t| t.title.clone());
        let gateway = Arc::clone(&self.gateway);
        tracing::info!(project_id, task_id, "Deleting task");
        self.spawn(async move {
            Completion::Deleted {
                key: EntityKey::Task(project_id, task_id),
                name,
                result: gateway.delete_task(project_id, task_id).await,
            }
        });
    }

    // --- Reconciliation ---

    /// Apply every completion that has arrived. Never blocks.
    pub fn poll(&mut self, store: &mut EntityStore) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(outcome) = self.apply(store, completion) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for the next completion and apply it. `None` means it was
    /// stale and discarded.
    pub async fn next(&mut self, store: &mut EntityStore) -> Option<Outcome> {
        let completion = self.rx.recv().await?;
        self.apply(store, completion)
    }

    fn apply(&mut self, store: &mut EntityStore, completion: Completion) -> Option<Outcome> {
        match completion {
            Completion::Listed {
                generation,
                operation,
                result,
            } => {
                if generation != self.listing_generation {
                    tracing::debug!(generation, "Discarding superseded listing");
                    return None;
                }
                self.loading = false;
                match result {
                    Ok(projects) => {
                        let count = projects.len();
                        self.store_listing(store, projects);
                        Some(Outcome::Listed { operation, count })
                    }
                    Err(source) => Some(self.failed(operation, "projects", source)),
                }
            }
            Completion::StatusPatched {
                key,
                seq,
                status,
                name,
                patch,
                refresh,
            } => self.apply_status(store, key, seq, status, name, patch, refresh),
            Completion::Saved {
                kind,
                name,
                created,
                saved,
                refresh,
            } => {
                self.submitting = self.submitting.saturating_sub(1);
                let operation = if created {
                    Operation::Create
                } else {
                    Operation::Update
                };
                match (saved, refresh) {
                    (Err(source), _) => Some(self.failed(operation, &name, source)),
                    (Ok(_), Some(Ok(projects))) => {
                        self.store_listing(store, projects);
                        tracing::info!(?kind, name = %name, created, "Saved");
                        Some(Outcome::Saved {
                            kind,
                            name,
                            created,
                        })
                    }
                    (Ok(entity), Some(Err(source))) => {
                        upsert_saved(store, entity);
                        let failure = MutationFailed {
                            operation: Operation::Load,
                            entity: name.clone(),
                            source,
                        };
                        tracing::warn!(error = %failure, "Saved, but the refetch failed");
                        Some(Outcome::SavedWithoutRefresh {
                            kind,
                            name,
                            created,
                            failure,
                        })
                    }
                    (Ok(_), None) => Some(Outcome::Saved {
                        kind,
                        name,
                        created,
                    }),
                }
            }
            Completion::Deleted { key, name, result } => match result {
                Ok(()) => {
                    match key {
                        EntityKey::Project(id) => {
                            store.remove_project(id);
                        }
                        EntityKey::Task(project_id, task_id) => {
                            store.remove_task_from_project(project_id, task_id);
                        }
                    }
                    self.pending_status.remove(&key);
                    tracing::info!(?key, "Deleted");
                    Some(Outcome::Deleted { key, name })
                }
                Err(source) => Some(self.failed(Operation::Delete, &name, source)),
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_status(
        &mut self,
        store: &mut EntityStore,
        key: EntityKey,
        seq: u64,
        status: Status,
        name: String,
        patch: Result<(), GatewayError>,
        refresh: Option<Result<Vec<Project>, GatewayError>>,
    ) -> Option<Outcome> {
        let Some(entry) = self.pending_status.get_mut(&key) else {
            tracing::debug!(?key, seq, "Status response for a removed entity ignored");
            return None;
        };
        entry.in_flight = entry.in_flight.saturating_sub(1);
        if patch.is_ok() {
            entry.baseline = status;
        }
        let latest = entry.seq == seq;
        let waiting = entry.phase == Phase::Waiting;
        if latest {
            entry.phase = if patch.is_ok() {
                Phase::Confirmed
            } else {
                Phase::RolledBack
            };
        } else if patch.is_ok() && !waiting {
            entry.target = status;
        }
        let pending = *entry;
        if pending.in_flight == 0 {
            self.pending_status.remove(&key);
        }

        if !latest {
            if waiting || patch.is_err() {
                // A newer request for this entity decides what is shown.
                tracing::debug!(?key, seq, "Discarding superseded status response");
                return None;
            }
            // The newest request already settled; this answer is the
            // server's most recent word.
            match refresh {
                Some(Ok(projects)) => self.store_listing(store, projects),
                _ => patch_status(store, key, status),
            }
            tracing::info!(?key, seq, %status, "Late status change accepted");
            return Some(Outcome::StatusUpdated { key, name, status });
        }

        match (patch, refresh) {
            (Err(source), _) => {
                if let Some(entry) = self.pending_status.get_mut(&key) {
                    entry.target = pending.baseline;
                }
                patch_status(store, key, pending.baseline);
                tracing::warn!(?key, rollback = %pending.baseline, "Status change rolled back");
                Some(self.failed(Operation::UpdateStatus, &name, source))
            }
            (Ok(()), Some(Ok(projects))) => {
                self.store_listing(store, projects);
                Some(Outcome::StatusUpdated { key, name, status })
            }
            (Ok(()), Some(Err(source))) => {
                // Accepted server-side; keep the optimistic value.
                Some(self.failed(Operation::UpdateStatus, &name, source))
            }
            (Ok(()), None) => Some(Outcome::StatusUpdated { key, name, status }),
        }
    }

    /// Replace the store with a server list, then re-apply status changes
    /// still waiting for their response.
    fn store_listing(&self, store: &mut EntityStore, projects: Vec<Project>) {
        store.replace_all(projects);
        for (key, pending) in &self.pending_status {
            if pending.phase == Phase::Waiting {
                patch_status(store, *key, pending.target);
            }
        }
    }

    fn failed(&self, operation: Operation, entity: &str, source: GatewayError) -> Outcome {
        let failure = MutationFailed {
            operation,
            entity: entity.to_string(),
            source,
        };
        tracing::warn!(error = %failure, "Remote operation failed");
        Outcome::Failed(failure)
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        self.runtime.spawn(async move {
            let completion = job.await;
            deliver(&tx, notify.as_ref(), completion);
        });
    }
}

fn deliver(tx: &mpsc::UnboundedSender<Completion>, notify: Option<&Notify>, completion: Completion) {
    if tx.send(completion).is_err() {
        tracing::debug!("Engine dropped before completion arrived");
        return;
    }
    if let Some(notify) = notify {
        notify();
    }
}

/// Put a saved entity into the store when no fresh listing is available.
fn upsert_saved(store: &mut EntityStore, entity: SavedEntity) {
    match entity {
        SavedEntity::Project(mut project) => {
            // PUT answers may omit tasks; keep the ones already shown.
            if project.tasks.is_empty() {
                if let Some(current) = store.snapshot().project(project.id) {
                    project.tasks = current.tasks.clone();
                }
            }
            store.upsert_project(project);
        }
        SavedEntity::Task(project_id, task) => {
            if !store.upsert_task_in_project(project_id, task) {
                tracing::debug!(project_id, "Saved task belongs to a project not on the board");
            }
        }
    }
}

fn patch_status(store: &mut EntityStore, key: EntityKey, status: Status) {
    match key {
        EntityKey::Project(id) => {
            store.patch_project_status(id, status);
        }
        EntityKey::Task(project_id, task_id) => {
            store.patch_task_status(project_id, task_id, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::io::fake::{Call, Endpoint, FakeGateway};
    use crate::model::{Responsible, Task, Team};

    fn task(id: EntityId, project_id: EntityId, title: &str, status: Status) -> Arc<Task> {
        Arc::new(Task {
            id,
            title: title.into(),
            description: None,
            responsible: Responsible::Plo,
            due_days: 3,
            status,
            project_id,
        })
    }

    fn project(id: EntityId, name: &str, status: Status, tasks: Vec<Arc<Task>>) -> Project {
        Project {
            id,
            name: name.into(),
            description: String::new(),
            start_date: None,
            end_date: None,
            team_responsible: Team::AdmFin,
            status,
            tasks,
        }
    }

    fn server() -> FakeGateway {
        FakeGateway::with_projects(vec![
            project(1, "Alpha", Status::Planejado, Vec::new()),
            project(
                3,
                "Beta",
                Status::EmExecucao,
                vec![task(7, 3, "Draft budget", Status::Planejado)],
            ),
        ])
    }

    /// Engine plus a store already holding the server's projects.
    async fn loaded(gw: &FakeGateway) -> (MutationEngine, EntityStore) {
        let mut engine = MutationEngine::new(
            Arc::new(gw.clone()),
            Handle::current(),
            Duration::from_millis(500),
        );
        let mut store = EntityStore::new();
        engine.load();
        assert!(engine.is_loading());
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Listed {
                operation: Operation::Load,
                count: 2
            })
        );
        assert!(!engine.is_loading());
        (engine, store)
    }

    fn project_status(store: &EntityStore, id: EntityId) -> Option<Status> {
        store.snapshot().project(id).map(|p| p.status)
    }

    #[tokio::test]
    async fn status_change_is_shown_before_the_server_answers() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        assert!(engine.update_project_status(&mut store, 1, Status::EmExecucao));
        assert_eq!(project_status(&store, 1), Some(Status::EmExecucao));

        let outcome = engine.next(&mut store).await;
        assert_matches!(
            outcome,
            Some(Outcome::StatusUpdated {
                key: EntityKey::Project(1),
                status: Status::EmExecucao,
                ..
            })
        );
        assert_eq!(project_status(&store, 1), Some(Status::EmExecucao));

        let status_calls: Vec<_> = gw
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::ProjectStatus(..)))
            .collect();
        assert_eq!(status_calls, vec![Call::ProjectStatus(1, Status::EmExecucao)]);
    }

    #[tokio::test]
    async fn card_drop_sends_exactly_one_status_call() {
        use crate::ui::drag::{DragController, DragEnd, PointerKind};
        use egui::Pos2;

        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        let mut drag = DragController::default();

        drag.press(1, Status::Planejado, PointerKind::Mouse, Pos2::ZERO, 0.0);
        drag.motion(Pos2::new(400.0, 0.0), 0.2);
        let DragEnd::Dropped(request) = drag.release(Some("FINALIZADO")) else {
            panic!("expected a drop");
        };
        engine.update_project_status(&mut store, request.project_id, request.to);
        engine.next(&mut store).await;

        drag.press(1, Status::Finalizado, PointerKind::Mouse, Pos2::ZERO, 1.0);
        drag.motion(Pos2::new(400.0, 0.0), 1.2);
        assert_eq!(drag.release(None), DragEnd::Ignored);

        let status_calls: Vec<_> = gw
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::ProjectStatus(..)))
            .collect();
        assert_eq!(status_calls, vec![Call::ProjectStatus(1, Status::Finalizado)]);
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));
    }

    #[tokio::test]
    async fn failed_status_change_rolls_back() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::Status);

        engine.update_task_status(&mut store, 3, 7, Status::Finalizado);
        assert_eq!(
            store.snapshot().task(3, 7).map(|t| t.status),
            Some(Status::Finalizado)
        );

        let outcome = engine.next(&mut store).await;
        assert_matches!(
            outcome,
            Some(Outcome::Failed(MutationFailed {
                operation: Operation::UpdateStatus,
                ..
            }))
        );
        assert_eq!(
            store.snapshot().task(3, 7).map(|t| t.status),
            Some(Status::Planejado)
        );
    }

    #[tokio::test]
    async fn superseded_status_response_is_discarded() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.update_project_status(&mut store, 1, Status::EmExecucao);
        engine.update_project_status(&mut store, 1, Status::Finalizado);
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));

        assert_eq!(engine.next(&mut store).await, None);
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::StatusUpdated {
                status: Status::Finalizado,
                ..
            })
        );
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));
    }

    #[tokio::test]
    async fn rollback_targets_last_confirmed_status() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::Status);

        engine.update_project_status(&mut store, 1, Status::EmExecucao);
        engine.update_project_status(&mut store, 1, Status::Abortado);

        // The older failure belongs to a superseded request.
        assert_eq!(engine.next(&mut store).await, None);
        assert_eq!(project_status(&store, 1), Some(Status::Abortado));

        assert_matches!(engine.next(&mut store).await, Some(Outcome::Failed(_)));
        assert_eq!(project_status(&store, 1), Some(Status::Planejado));
    }

    #[tokio::test(start_paused = true)]
    async fn late_success_after_rollback_shows_server_status() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.delay_status(Status::EmExecucao, Duration::from_millis(50));
        gw.fail(Endpoint::Status);

        engine.update_project_status(&mut store, 1, Status::EmExecucao);
        engine.update_project_status(&mut store, 1, Status::Abortado);

        // The newest request is rejected at once and rolled back.
        assert_matches!(engine.next(&mut store).await, Some(Outcome::Failed(_)));
        assert_eq!(project_status(&store, 1), Some(Status::Planejado));

        // The older request reaches the server later and is accepted.
        gw.recover(Endpoint::Status);
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::StatusUpdated {
                key: EntityKey::Project(1),
                status: Status::EmExecucao,
                ..
            })
        );

        let server_status = gw.projects().iter().find(|p| p.id == 1).map(|p| p.status);
        assert_eq!(server_status, Some(Status::EmExecucao));
        assert_eq!(project_status(&store, 1), server_status);
    }

    #[tokio::test(start_paused = true)]
    async fn late_success_after_confirmed_latest_follows_server() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.delay_status(Status::EmExecucao, Duration::from_millis(50));

        engine.update_project_status(&mut store, 1, Status::EmExecucao);
        engine.update_project_status(&mut store, 1, Status::Finalizado);

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::StatusUpdated {
                status: Status::Finalizado,
                ..
            })
        );
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));

        // The delayed patch lands last on the server.
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::StatusUpdated {
                status: Status::EmExecucao,
                ..
            })
        );
        let server_status = gw.projects().iter().find(|p| p.id == 1).map(|p| p.status);
        assert_eq!(project_status(&store, 1), server_status);
    }

    #[tokio::test]
    async fn listing_keeps_optimistic_status_in_flight() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.load();
        engine.update_project_status(&mut store, 1, Status::Abortado);

        // The listing was taken before the patch reached the server.
        assert_matches!(engine.next(&mut store).await, Some(Outcome::Listed { .. }));
        assert_eq!(project_status(&store, 1), Some(Status::Abortado));

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::StatusUpdated { .. })
        );
        assert_eq!(project_status(&store, 1), Some(Status::Abortado));
    }

    #[tokio::test]
    async fn accepted_patch_with_failed_refresh_keeps_new_status() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::List);

        engine.update_project_status(&mut store, 1, Status::Finalizado);
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Failed(MutationFailed {
                operation: Operation::UpdateStatus,
                ..
            }))
        );
        assert_eq!(project_status(&store, 1), Some(Status::Finalizado));
        assert_eq!(
            gw.projects().iter().find(|p| p.id == 1).map(|p| p.status),
            Some(Status::Finalizado)
        );
    }

    #[tokio::test]
    async fn same_status_sends_nothing() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        let calls = gw.calls().len();

        assert!(!engine.update_project_status(&mut store, 3, Status::EmExecucao));
        assert!(!engine.update_project_status(&mut store, 99, Status::Abortado));
        tokio::task::yield_now().await;
        assert_eq!(gw.calls().len(), calls);
    }

    #[tokio::test]
    async fn task_delete_waits_for_the_server() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.delete_task(&store, 3, 7);
        assert!(store.snapshot().task(3, 7).is_some());

        let outcome = engine.next(&mut store).await;
        assert_matches!(
            outcome,
            Some(Outcome::Deleted {
                key: EntityKey::Task(3, 7),
                ..
            })
        );
        assert!(store.snapshot().task(3, 7).is_none());
        assert!(gw.calls().contains(&Call::DeleteTask(3, 7)));
    }

    #[tokio::test]
    async fn failed_delete_leaves_store_untouched() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::Delete);
        let before = store.revision();

        engine.delete_task(&store, 3, 7);
        let outcome = engine.next(&mut store).await;
        assert_matches!(
            outcome,
            Some(Outcome::Failed(MutationFailed {
                operation: Operation::Delete,
                ref entity,
                ..
            })) if entity == "Draft budget"
        );
        assert!(store.snapshot().task(3, 7).is_some());
        assert_eq!(store.revision(), before);
    }

    #[tokio::test]
    async fn deleting_a_project_removes_it() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.delete_project(&store, 1);
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Deleted {
                key: EntityKey::Project(1),
                ..
            })
        );
        assert!(store.snapshot().project(1).is_none());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn created_task_appears_after_refetch() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        let draft = TaskDraft {
            title: "Write report".into(),
            responsible: Responsible::Plo,
            due_days: 5,
            status: Status::Planejado,
            ..TaskDraft::default()
        };
        engine.save_task(3, &draft).expect("draft is valid");
        assert!(engine.is_submitting());

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Saved {
                kind: EntityKind::Task,
                created: true,
                ..
            })
        );
        assert!(!engine.is_submitting());

        let snapshot = store.snapshot();
        let project = snapshot.project(3).expect("project 3 present");
        assert_eq!(project.tasks.len(), 2);
        let created: Vec<_> = project
            .tasks
            .iter()
            .filter(|t| t.title == "Write report")
            .collect();
        assert_eq!(created.len(), 1);
        let created = created[0];
        assert_ne!(created.id, 7);
        assert_eq!(created.project_id, 3);
        assert_eq!(created.due_days, 5);
        assert_eq!(created.responsible, Responsible::Plo);
        assert_eq!(created.status, Status::Planejado);

        let calls = gw.calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(tail, &[Call::CreateTask(3), Call::List]);
    }

    #[tokio::test]
    async fn editing_a_project_sends_put() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        let mut draft = ProjectDraft::from_project(store.snapshot().project(1).expect("present"));
        draft.name = "Alpha II".into();
        engine.save_project(&draft).expect("draft is valid");

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Saved {
                kind: EntityKind::Project,
                created: false,
                ..
            })
        );
        assert_eq!(
            store.snapshot().project(1).map(|p| p.name.as_str()),
            Some("Alpha II")
        );
        assert!(gw.calls().contains(&Call::UpdateProject(1)));
    }

    #[tokio::test]
    async fn invalid_form_sends_nothing() {
        let gw = server();
        let (mut engine, _store) = loaded(&gw).await;
        let calls = gw.calls().len();

        let err = engine
            .save_project(&ProjectDraft::new(Status::Planejado))
            .unwrap_err();
        assert!(err.message_for("name").is_some());
        assert!(!engine.is_submitting());

        let err = engine
            .save_task(3, &TaskDraft {
                title: "Ok".into(),
                due_days: 0,
                ..TaskDraft::default()
            })
            .unwrap_err();
        assert!(err.message_for("dueDays").is_some());

        tokio::task::yield_now().await;
        assert_eq!(gw.calls().len(), calls);
    }

    #[tokio::test]
    async fn failed_save_keeps_store() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::Save);

        let mut draft = ProjectDraft::new(Status::Abortado);
        draft.name = "Gamma".into();
        engine.save_project(&draft).expect("draft is valid");

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Failed(MutationFailed {
                operation: Operation::Create,
                ..
            }))
        );
        assert_eq!(store.snapshot().len(), 2);
        assert!(!engine.is_submitting());
    }

    #[tokio::test]
    async fn saved_task_shows_up_when_refetch_fails() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;
        gw.fail(Endpoint::List);

        let draft = TaskDraft {
            title: "Write report".into(),
            due_days: 5,
            ..TaskDraft::default()
        };
        engine.save_task(3, &draft).expect("draft is valid");

        let outcome = engine.next(&mut store).await.expect("completion");
        assert!(outcome.is_failure());
        assert_matches!(
            &outcome,
            Outcome::SavedWithoutRefresh {
                kind: EntityKind::Task,
                created: true,
                ..
            }
        );
        let beta = store.snapshot().project(3).expect("project 3");
        let saved = beta
            .tasks
            .iter()
            .find(|t| t.title == "Write report")
            .expect("saved task kept");
        assert_eq!(saved.project_id, 3);
        assert!(!engine.is_submitting());
    }

    #[tokio::test]
    async fn failed_load_is_reported() {
        let gw = server();
        gw.fail(Endpoint::List);
        let mut engine = MutationEngine::new(
            Arc::new(gw.clone()),
            Handle::current(),
            Duration::from_millis(500),
        );
        let mut store = EntityStore::new();

        engine.load();
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Failed(MutationFailed {
                operation: Operation::Load,
                ..
            }))
        );
        assert!(!engine.is_loading());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn search_sends_only_the_last_term() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.search("a");
        engine.search("al");
        engine.search("alpha");
        assert!(engine.is_search_pending());

        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Listed {
                operation: Operation::Search,
                count: 1
            })
        );
        assert_eq!(store.snapshot().len(), 1);

        let searches: Vec<_> = gw
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Search(_)))
            .collect();
        assert_eq!(searches, vec![Call::Search("alpha".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_search_lists_everything() {
        let gw = server();
        let (mut engine, mut store) = loaded(&gw).await;

        engine.search("   ");
        assert_matches!(
            engine.next(&mut store).await,
            Some(Outcome::Listed {
                operation: Operation::Load,
                count: 2
            })
        );
    }

    #[tokio::test]
    async fn completions_wake_the_ui() {
        let gw = server();
        let woken = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&woken);
        let mut engine = MutationEngine::new(
            Arc::new(gw.clone()),
            Handle::current(),
            Duration::from_millis(500),
        )
        .with_notify(Arc::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));
        let mut store = EntityStore::new();

        engine.load();
        engine.next(&mut store).await;
        assert_eq!(woken.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(engine.poll(&mut store).is_empty());
    }
}
