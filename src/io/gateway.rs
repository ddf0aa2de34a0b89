use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{EntityId, Project, ProjectDraft, Status, Task, TaskDraft};

/// CRUD surface of the remote project API.
///
/// Status endpoints only confirm; callers re-list to see the result.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, GatewayError>;

    async fn search_projects(&self, name: &str) -> Result<Vec<Project>, GatewayError>;

    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, GatewayError>;

    async fn update_project(
        &self,
        id: EntityId,
        draft: &ProjectDraft,
    ) -> Result<Project, GatewayError>;

    async fn update_project_status(&self, id: EntityId, status: Status)
        -> Result<(), GatewayError>;

    async fn delete_project(&self, id: EntityId) -> Result<(), GatewayError>;

    async fn create_task(
        &self,
        project_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError>;

    async fn update_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError>;

    async fn update_task_status(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    ) -> Result<(), GatewayError>;

    async fn delete_task(&self, project_id: EntityId, task_id: EntityId)
        -> Result<(), GatewayError>;
}
