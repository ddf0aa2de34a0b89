//! [`Gateway`] over HTTP using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::gateway::Gateway;
use crate::error::GatewayError;
use crate::model::{EntityId, Project, ProjectDraft, Status, Task, TaskDraft};

/// HTTP client for the project API.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// * `base_url` - API origin, e.g. `http://localhost:8080`.
    /// * `timeout` - upper bound for each request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::fetch)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/projects{}", self.base_url, path)
    }

    fn project_path(id: EntityId) -> String {
        format!("/{id}")
    }

    fn task_path(project_id: EntityId, task_id: EntityId) -> String {
        format!("/{project_id}/tasks/{task_id}")
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        tracing::debug!(%method, path, "Sending API request");
        let response = request.send().await?;
        Self::ensure_success(response).await
    }

    // ---- private helpers ----

    /// Turn any non-2xx answer into [`GatewayError::RequestRejected`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::RequestRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_projects(&self) -> Result<Vec<Project>, GatewayError> {
        let req = self.client.get(self.url(""));
        Self::parse(self.send(reqwest::Method::GET, "", req).await?).await
    }

    async fn search_projects(&self, name: &str) -> Result<Vec<Project>, GatewayError> {
        let req = self.client.get(self.url("/search")).query(&[("name", name)]);
        Self::parse(self.send(reqwest::Method::GET, "/search", req).await?).await
    }

    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, GatewayError> {
        let req = self.client.post(self.url("")).json(draft);
        Self::parse(self.send(reqwest::Method::POST, "", req).await?).await
    }

    async fn update_project(
        &self,
        id: EntityId,
        draft: &ProjectDraft,
    ) -> Result<Project, GatewayError> {
        let path = Self::project_path(id);
        let req = self.client.put(self.url(&path)).json(draft);
        Self::parse(self.send(reqwest::Method::PUT, &path, req).await?).await
    }

    async fn update_project_status(
        &self,
        id: EntityId,
        status: Status,
    ) -> Result<(), GatewayError> {
        let path = format!("{}/status", Self::project_path(id));
        let req = self
            .client
            .patch(self.url(&path))
            .query(&[("status", status.code())]);
        self.send(reqwest::Method::PATCH, &path, req).await?;
        Ok(())
    }

    async fn delete_project(&self, id: EntityId) -> Result<(), GatewayError> {
        let path = Self::project_path(id);
        let req = self.client.delete(self.url(&path));
        self.send(reqwest::Method::DELETE, &path, req).await?;
        Ok(())
    }

    async fn create_task(
        &self,
        project_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError> {
        let path = format!("{}/tasks", Self::project_path(project_id));
        let req = self.client.post(self.url(&path)).json(draft);
        let mut task: Task = Self::parse(self.send(reqwest::Method::POST, &path, req).await?).await?;
        task.project_id = project_id;
        Ok(task)
    }

    async fn update_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        draft: &TaskDraft,
    ) -> Result<Task, GatewayError> {
        let path = Self::task_path(project_id, task_id);
        let req = self.client.put(self.url(&path)).json(draft);
        let mut task: Task = Self::parse(self.send(reqwest::Method::PUT, &path, req).await?).await?;
        task.project_id = project_id;
        Ok(task)
    }

    async fn update_task_status(
        &self,
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    ) -> Result<(), GatewayError> {
        let path = format!("{}/status", Self::task_path(project_id, task_id));
        let req = self
            .client
            .patch(self.url(&path))
            .query(&[("status", status.code())]);
        self.send(reqwest::Method::PATCH, &path, req).await?;
        Ok(())
    }

    async fn delete_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
    ) -> Result<(), GatewayError> {
        let path = Self::task_path(project_id, task_id);
        let req = self.client.delete(self.url(&path));
        self.send(reqwest::Method::DELETE, &path, req).await?;
        Ok(())
    }
}
