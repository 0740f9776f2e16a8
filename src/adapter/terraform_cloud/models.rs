//! Terraform Cloud API Models
//!
//! JSON:API のレスポンス・リクエスト形式

use serde::{Deserialize, Serialize};

use crate::domain::entities::state_snapshot::StateMetadata;
use crate::domain::entities::workspace::Workspace;

/// Page size used when listing workspaces
pub const PAGE_SIZE: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct WorkspaceList {
    pub data: Vec<WorkspaceResource>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

impl WorkspaceList {
    /// Next page number, `None` on the last page
    pub fn next_page(&self) -> Option<u32> {
        self.meta.as_ref().and_then(|m| m.pagination.next_page)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(rename = "current-page", default)]
    pub current_page: Option<u32>,
    #[serde(rename = "next-page", default)]
    pub next_page: Option<u32>,
    #[serde(rename = "total-count", default)]
    pub total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceResource {
    pub id: String,
    pub attributes: WorkspaceAttributes,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: String,
    #[serde(default)]
    pub locked: Option<bool>,
}

impl WorkspaceResource {
    pub fn into_workspace(self, organization: &str) -> Workspace {
        let mut workspace = Workspace::new(self.id, self.attributes.name, organization);
        workspace.locked = self.attributes.locked;
        workspace
    }
}

#[derive(Debug, Deserialize)]
pub struct StateVersionDocument {
    pub data: StateVersionResource,
}

#[derive(Debug, Deserialize)]
pub struct StateVersionResource {
    pub id: String,
    pub attributes: StateVersionAttributes,
}

#[derive(Debug, Deserialize)]
pub struct StateVersionAttributes {
    #[serde(default)]
    pub serial: Option<i64>,
    #[serde(rename = "terraform-version", default)]
    pub terraform_version: Option<String>,
    #[serde(rename = "created-at", default)]
    pub created_at: Option<String>,
    #[serde(rename = "hosted-state-download-url", default)]
    pub hosted_state_download_url: Option<String>,
}

impl StateVersionResource {
    pub fn metadata(&self) -> StateMetadata {
        StateMetadata {
            state_version_id: self.id.clone(),
            serial: self.attributes.serial,
            terraform_version: self.attributes.terraform_version.clone(),
            created_at: self.attributes.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LockRequest<'a> {
    pub reason: &'a str,
}
