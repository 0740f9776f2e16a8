//! # Lock Workspaces Use Case
//!
//! 移行完了後にすべてのワークスペースをロックし、旧バックエンドへの書き込みを止める

use std::sync::Arc;

use log::{info, warn};

use crate::application::dto::migration_config::WorkspaceSource;
use crate::application::use_cases::enumerate_workspaces::EnumerateWorkspacesUseCase;
use crate::domain::errors::{MigrationError, RemoteStateError};
use crate::domain::repositories::manifest_repository::ManifestRepository;
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;

/// `lock-all` の既定のロック理由
pub const FREEZE_LOCK_REASON: &str = "Please switch to S3 backend";

/// 一括ロックの集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockAllSummary {
    pub locked: Vec<String>,
    pub already_locked: Vec<String>,
    /// `(ワークスペース名, 理由)`
    pub failed: Vec<(String, String)>,
    pub dry_run: bool,
}

impl LockAllSummary {
    pub fn total(&self) -> usize {
        self.locked.len() + self.already_locked.len() + self.failed.len()
    }
}

/// 一括ロックユースケース
pub struct LockWorkspacesUseCase<R: RemoteStateRepository, M: ManifestRepository> {
    remote: Arc<R>,
    enumerate: EnumerateWorkspacesUseCase<R, M>,
}

impl<R: RemoteStateRepository, M: ManifestRepository> LockWorkspacesUseCase<R, M> {
    pub fn new(remote: Arc<R>, manifests: Arc<M>) -> Self {
        Self {
            enumerate: EnumerateWorkspacesUseCase::new(remote.clone(), manifests),
            remote,
        }
    }

    /// すべてのワークスペースをロックする
    ///
    /// 既にロックされているワークスペースはスキップする。ロックは解除しない。
    ///
    /// # Arguments
    ///
    /// * `organization` - 組織名
    /// * `source` - 列挙元
    /// * `reason` - ロック理由
    /// * `dry_run` - `true` の場合はロックせずに報告のみ
    ///
    /// # Errors
    ///
    /// 列挙に失敗した場合、または認証エラー
    pub async fn execute(
        &self,
        organization: &str,
        source: &WorkspaceSource,
        reason: &str,
        dry_run: bool,
    ) -> Result<LockAllSummary, MigrationError> {
        let enumeration = self.enumerate.execute(organization, source, 0).await?;
        let mut summary = LockAllSummary {
            dry_run,
            ..Default::default()
        };

        for workspace in &enumeration.workspaces {
            if dry_run {
                info!("[DRY RUN] [{}] Would lock workspace", workspace.name);
                summary.locked.push(workspace.name.clone());
                continue;
            }

            info!("[{}] Locking workspace", workspace.name);
            match self.remote.lock(workspace, reason).await {
                Ok(()) => summary.locked.push(workspace.name.clone()),
                Err(RemoteStateError::Conflict(_)) => {
                    info!("[{}] Workspace is locked, skipping", workspace.name);
                    summary.already_locked.push(workspace.name.clone());
                }
                Err(RemoteStateError::Unauthorized(msg)) => {
                    return Err(MigrationError::Fatal {
                        workspace: workspace.name.clone(),
                        reason: msg,
                    })
                }
                Err(e) => {
                    warn!("[{}] Failed to lock workspace: {}", workspace.name, e);
                    summary.failed.push((workspace.name.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}
