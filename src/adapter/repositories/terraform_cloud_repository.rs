//! Terraform Cloud Repository Implementation
//!
//! RemoteStateRepositoryのTerraform Cloud実装

use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::adapter::terraform_cloud::client::TfcApi;
use crate::adapter::terraform_cloud::models::{
    LockRequest, StateVersionDocument, WorkspaceList, PAGE_SIZE,
};
use crate::domain::entities::state_snapshot::StateSnapshot;
use crate::domain::entities::workspace::{Workspace, WorkspaceQuery};
use crate::domain::errors::RemoteStateError;
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;

/// Terraform Cloudリポジトリ
pub struct TerraformCloudRepository {
    api: Arc<dyn TfcApi>,
}

impl TerraformCloudRepository {
    pub fn new(api: Arc<dyn TfcApi>) -> Self {
        Self { api }
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, RemoteStateError> {
        serde_json::from_value(value).map_err(|e| RemoteStateError::Api {
            status: 200,
            message: format!("unexpected {what} response: {e}"),
        })
    }
}

#[async_trait]
impl RemoteStateRepository for TerraformCloudRepository {
    async fn list_workspaces(
        &self,
        query: &WorkspaceQuery,
    ) -> Result<Vec<Workspace>, RemoteStateError> {
        let path = format!("organizations/{}/workspaces", query.organization);
        let mut workspaces = Vec::new();
        let mut page = 1u32;

        loop {
            let mut params = vec![
                ("page[number]".to_string(), page.to_string()),
                ("page[size]".to_string(), PAGE_SIZE.to_string()),
            ];
            if let Some(name) = &query.name {
                params.push(("search[name]".to_string(), name.clone()));
            }

            let value = self.api.get_json(&path, &params).await?;
            let list: WorkspaceList = Self::decode(value, "workspace list")?;
            let next = list.next_page();
            workspaces.extend(
                list.data
                    .into_iter()
                    .map(|w| w.into_workspace(&query.organization)),
            );
            debug!("Listed page {} ({} workspaces so far)", page, workspaces.len());

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        info!(
            "Found {} workspaces in organization {}",
            workspaces.len(),
            query.organization
        );
        Ok(workspaces)
    }

    async fn lock(&self, workspace: &Workspace, reason: &str) -> Result<(), RemoteStateError> {
        let body = serde_json::to_value(LockRequest { reason }).map_err(|e| {
            RemoteStateError::Transport(format!("failed to encode lock request: {e}"))
        })?;
        self.api
            .post_json(&format!("workspaces/{}/actions/lock", workspace.id), Some(body))
            .await
    }

    async fn unlock(&self, workspace: &Workspace) -> Result<(), RemoteStateError> {
        let path = format!("workspaces/{}/actions/unlock", workspace.id);
        match self.api.post_json(&path, None).await {
            // Already unlocked
            Err(RemoteStateError::Conflict(msg)) => {
                debug!("[{}] Unlock conflict ignored: {}", workspace.name, msg);
                Ok(())
            }
            other => other,
        }
    }

    async fn get_state(&self, workspace: &Workspace) -> Result<StateSnapshot, RemoteStateError> {
        let path = format!("workspaces/{}/current-state-version", workspace.id);
        let value = self.api.get_json(&path, &[]).await?;
        let document: StateVersionDocument = Self::decode(value, "state version")?;

        let Some(url) = document.data.attributes.hosted_state_download_url.clone() else {
            return Err(RemoteStateError::NotFound(format!(
                "state version {} has no downloadable state",
                document.data.id
            )));
        };

        let payload = self.api.download(&url).await?;
        Ok(StateSnapshot::new(payload, document.data.metadata()))
    }
}
