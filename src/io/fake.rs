//! In-memory [`Gateway`] used by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::gateway::Gateway;
use crate::error::GatewayError;
use crate::model::{EntityId, Project, ProjectDraft, Status, Task, TaskDraft};

/// Which endpoint a recorded call hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Search(String),
    CreateProject,
    UpdateProject(EntityId),
    ProjectStatus(EntityId, Status),
    DeleteProject(EntityId),
    CreateTask(EntityId),
    UpdateTask(EntityId, EntityId),
    TaskStatus(EntityId, EntityId, Status),
    DeleteTask(EntityId, EntityId),
}

/// Endpoint families that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    List,
    Search,
    Save,
    Status,
    Delete,
}

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    next_id: EntityId,
    calls: Vec<Call>,
    failing: HashSet<Endpoint>,
    status_delays: HashMap<Status, Duration>,
}

/// Server stand-in that keeps projects in memory and assigns ids.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<State>>,
}

impl FakeGateway {
    pub fn with_projects(projects: Vec<Project>) -> Self {
        let next_id = projects
            .iter()
            .flat_map(|p| std::iter::once(p.id).chain(p.tasks.iter().map(|t| t.id)))
            .max()
            .unwrap_or(0)
            + 1;
        let gw = Self::default();
        {
            let mut state = gw.state.lock().unwrap();
            state.projects = projects;
            state.next_id = next_id;
        }
        gw
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.remove(&endpoint);
    }

    /// Hold status patches towards `status` for `delay` before the server
    /// sees them.
    pub fn delay_status(&self, status: Status, delay: Duration) {
        self.state.lock().unwrap().status_delays.insert(status, delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.lock().unwrap().projects.clone()
    }

    async fn pause_before(&self, status: Status) {
        let delay = self.state.lock().unwrap().status_delays.get(&status).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Record the call, then fail it if its endpoint is marked failing.
    fn enter(&self, call: Call, endpoint: Endpoint) -> Result<std::sync::MutexGuard<'_, State>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(&endpoint) {
            return Err(GatewayError::RequestRejected {
                status: 500,
                body: "injected failure".into(),
            });
        }
        Ok(state)
    }
}

fn not_found() -> GatewayError {
    GatewayError::RequestRejected {
        status: 404,
        body: "not found".into(),
    }
}

fn project_from(id: EntityId, draft: &ProjectDraft, tasks: Vec<Arc<Task>>) -> Project {
    Project {
        id,
        name: draft.name.clone(),
        description: draft.description.clone(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        team_responsible: draft.team_responsible,
        status: draft.status,
        tasks,
    }
}

fn task_from(id: EntityId, project_id: EntityId, draft: &TaskDraft) -> Task {
    Task {
        id,
        title: draft.title.clone(),
        description: Some(draft.description.clone()).filter(|d| !d.is_empty()),
        responsible: draft.responsible,
        due_days: draft.due_days,
        status: draft.status,
        project_id,
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_projects(&self) -> Result<Vec<Project>, GatewayError> {
        let state = self.enter(Call::List, Endpoint::List)?;
        Ok(state.projects.clone())
    }

    async fn search_projects(&self, name: &str) -> Result<Vec<Project>, GatewayError> {
        let state = self.enter(Call::Search(name.to_string()), Endpoint::Search)?;
        let needle = name.to_lowercase();
        Ok(state
            .projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, GatewayError> {
        let mut state = self.enter(Call::CreateProject, Endpoint::Save)?;
        let id = state.next_id;
        state.next_id += 1;
        let project = project_from(id, draft, Vec::new());
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: EntityId,
        draft: &ProjectDraft,
    ) -> Result<Project, GatewayError> {
        let mut state = self.enter(Call::UpdateProject(id), Endpoint::Save)?;
        let slot = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        *slot = project_from(id, draft, slot.tasks.clone());
        Ok(slot.clone())
    }

    async fn update_project_status(
        &self,
        id: EntityId,
        status: Status,
    ) -> Result<(), GatewayError> {
        self.pause_before(status).await;
        let mut state = self.enter(Call::ProjectStatus(id, status), Endpoint::Status)?;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        project.status = status;
        Ok(())
    }

    async fn delete_project(&self, id: EntityId) -> Result<(), GatewayError> {
        let mut state = self.enter(Call::DeleteProject(id), Endpoint::Delete)?;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn create_task(
        &self,
        project_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError> {
        let mut state = self.enter(Call::CreateTask(project_id), Endpoint::Save)?;
        let id = state.next_id;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(not_found)?;
        let task = task_from(id, project_id, draft);
        project.tasks.push(Arc::new(task.clone()));
        state.next_id += 1;
        Ok(task)
    }

    async fn update_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError> {
        let mut state = self.enter(Call::UpdateTask(project_id, task_id), Endpoint::Save)?;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(not_found)?;
        let slot = project
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(not_found)?;
        let task = task_from(task_id, project_id, draft);
        *slot = Arc::new(task.clone());
        Ok(task)
    }

    async fn update_task_status(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    ) -> Result<(), GatewayError> {
        self.pause_before(status).await;
        let mut state = self.enter(Call::TaskStatus(project_id, task_id, status), Endpoint::Status)?;
        let task = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .and_then(|p| p.tasks.iter_mut().find(|t| t.id == task_id))
            .ok_or_else(not_found)?;
        Arc::make_mut(task).status = status;
        Ok(())
    }

    async fn delete_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
    ) -> Result<(), GatewayError> {
        let mut state = self.enter(Call::DeleteTask(project_id, task_id), Endpoint::Delete)?;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(not_found)?;
        let before = project.tasks.len();
        project.tasks.retain(|t| t.id != task_id);
        if project.tasks.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}
