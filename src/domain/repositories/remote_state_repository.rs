//! # Remote State Repository Trait
//!
//! 移行元のリモート状態サービス（ワークスペース列挙・ロック・状態取得）を抽象化

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::state_snapshot::StateSnapshot;
use crate::domain::entities::workspace::{Workspace, WorkspaceQuery};
use crate::domain::errors::RemoteStateError;

/// リモート状態リポジトリ
///
/// 本番実装はTerraform CloudのAPIを呼び出し、テストではインメモリの偽物を使う。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteStateRepository: Send + Sync {
    /// ワークスペースを列挙する
    ///
    /// # Arguments
    ///
    /// * `query` - 組織名と任意の名前フィルタ
    ///
    /// # Returns
    ///
    /// 列挙順に並んだワークスペース
    async fn list_workspaces(
        &self,
        query: &WorkspaceQuery,
    ) -> Result<Vec<Workspace>, RemoteStateError>;

    /// ワークスペースをロックする
    ///
    /// # Errors
    ///
    /// 既にロックされている場合は [`RemoteStateError::Conflict`]
    async fn lock(&self, workspace: &Workspace, reason: &str) -> Result<(), RemoteStateError>;

    /// ワークスペースのロックを解除する
    async fn unlock(&self, workspace: &Workspace) -> Result<(), RemoteStateError>;

    /// 現在の状態ペイロードとメタデータを取得する
    ///
    /// # Errors
    ///
    /// 状態が保存されていない場合は [`RemoteStateError::NotFound`]
    async fn get_state(&self, workspace: &Workspace) -> Result<StateSnapshot, RemoteStateError>;
}
