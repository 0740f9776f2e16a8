//! # Enumerate Workspaces Use Case
//!
//! 処理対象ワークスペースの列挙（リモートまたはマニフェストから）

use std::sync::Arc;

use log::info;

use crate::application::dto::migration_config::WorkspaceSource;
use crate::domain::entities::workspace::{Workspace, WorkspaceQuery};
use crate::domain::errors::MigrationError;
use crate::domain::repositories::manifest_repository::ManifestRepository;
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;

/// 列挙結果
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// 上限適用後のワークスペース（処理順）
    pub workspaces: Vec<Workspace>,
    /// 上限適用前の総数
    pub total: usize,
}

/// ワークスペース列挙ユースケース
pub struct EnumerateWorkspacesUseCase<R: RemoteStateRepository, M: ManifestRepository> {
    remote: Arc<R>,
    manifests: Arc<M>,
}

impl<R: RemoteStateRepository, M: ManifestRepository> EnumerateWorkspacesUseCase<R, M> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `remote` - リモート状態リポジトリ
    /// * `manifests` - マニフェストリポジトリ
    pub fn new(remote: Arc<R>, manifests: Arc<M>) -> Self {
        Self { remote, manifests }
    }

    /// ワークスペースを列挙し、上限を適用する
    ///
    /// # Arguments
    ///
    /// * `organization` - 組織名（リモート列挙時）
    /// * `source` - 列挙元
    /// * `limit` - 上限（0 = 無制限）
    ///
    /// # Errors
    ///
    /// リモートの列挙またはマニフェストの読み込みに失敗した場合
    pub async fn execute(
        &self,
        organization: &str,
        source: &WorkspaceSource,
        limit: usize,
    ) -> Result<Enumeration, MigrationError> {
        let all = match source {
            WorkspaceSource::Remote { name_filter } => {
                let query = WorkspaceQuery::new(organization, name_filter.clone());
                self.remote
                    .list_workspaces(&query)
                    .await
                    .map_err(|e| MigrationError::Enumeration(e.to_string()))?
            }
            WorkspaceSource::Manifest(path) => {
                info!("Reading workspaces from retry manifest: {}", path);
                self.manifests
                    .load(path)
                    .await
                    .map_err(|e| MigrationError::ManifestRead(format!("{e:#}")))?
                    .into_workspaces()
            }
        };

        let total = all.len();
        let workspaces = apply_limit(all, limit);
        if workspaces.len() < total {
            info!("Reached workspaces limit: {}", limit);
        }

        Ok(Enumeration { workspaces, total })
    }
}

/// 上限を適用する（0 = 無制限）
pub fn apply_limit(workspaces: Vec<Workspace>, limit: usize) -> Vec<Workspace> {
    if limit == 0 {
        return workspaces;
    }
    workspaces.into_iter().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    use crate::domain::entities::retry_manifest::RetryManifest;
    use crate::domain::errors::RemoteStateError;
    use crate::domain::repositories::remote_state_repository::MockRemoteStateRepository;

    struct StaticManifestRepository {
        workspaces: Vec<Workspace>,
    }

    #[async_trait]
    impl ManifestRepository for StaticManifestRepository {
        async fn load(&self, _path: &str) -> Result<RetryManifest> {
            Ok(RetryManifest::new(self.workspaces.clone()))
        }

        async fn save(&self, _path: &str, _manifest: &RetryManifest) -> Result<()> {
            Ok(())
        }
    }

    fn workspaces(n: usize) -> Vec<Workspace> {
        (0..n)
            .map(|i| Workspace::new(format!("ws-{i}"), format!("svc{i}-dev"), "acme"))
            .collect()
    }

    #[test]
    fn test_apply_limit() {
        assert_eq!(apply_limit(workspaces(10), 3).len(), 3);
        assert_eq!(apply_limit(workspaces(10), 0).len(), 10);
        assert_eq!(apply_limit(workspaces(2), 5).len(), 2);
    }

    #[test]
    fn test_apply_limit_keeps_order() {
        let limited = apply_limit(workspaces(5), 2);
        assert_eq!(limited[0].name, "svc0-dev");
        assert_eq!(limited[1].name, "svc1-dev");
    }

    #[tokio::test]
    async fn test_remote_enumeration_passes_filter() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_list_workspaces()
            .withf(|q| q.organization == "acme" && q.name.as_deref() == Some("svc1"))
            .times(1)
            .returning(|_| Ok(workspaces(4)));

        let use_case = EnumerateWorkspacesUseCase::new(
            Arc::new(mock),
            Arc::new(StaticManifestRepository { workspaces: vec![] }),
        );
        let source = WorkspaceSource::Remote {
            name_filter: Some("svc1".to_string()),
        };
        let result = use_case.execute("acme", &source, 0).await.unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.workspaces.len(), 4);
    }

    #[tokio::test]
    async fn test_manifest_enumeration_skips_remote() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_list_workspaces().never();

        let use_case = EnumerateWorkspacesUseCase::new(
            Arc::new(mock),
            Arc::new(StaticManifestRepository {
                workspaces: workspaces(3),
            }),
        );
        let source = WorkspaceSource::Manifest("retry.json".to_string());
        let result = use_case.execute("acme", &source, 2).await.unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.workspaces.len(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_list_workspaces()
            .returning(|_| Err(RemoteStateError::Unauthorized("401".into())));

        let use_case = EnumerateWorkspacesUseCase::new(
            Arc::new(mock),
            Arc::new(StaticManifestRepository { workspaces: vec![] }),
        );
        let source = WorkspaceSource::Remote { name_filter: None };
        let err = use_case.execute("acme", &source, 0).await.unwrap_err();
        assert!(matches!(err, MigrationError::Enumeration(_)));
    }
}
