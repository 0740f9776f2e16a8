//! # Lock Coordinator
//!
//! ワークスペース単位の勧告ロックの取得と解放
//!
//! ロックを取得できた場合、処理がどう終わっても（成功・失敗・panic）必ず解放を試みる。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use log::{debug, info, warn};

use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::{LockError, RemoteStateError};
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;

/// ロック取得の証跡
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockToken {
    Held {
        workspace_id: String,
        acquired_at: DateTime<Utc>,
    },
    /// skip-lock モード
    Skipped,
}

impl LockToken {
    #[inline]
    pub fn is_held(&self) -> bool {
        matches!(self, LockToken::Held { .. })
    }
}

/// ロック区間の結果
#[derive(Debug)]
pub struct Scoped<T> {
    /// 区間内の処理の結果
    pub value: T,
    /// ロックを実際に保持していたかどうか
    pub held: bool,
    /// 解放の結果（skip-lock では常に `Ok`）
    pub release: Result<(), LockError>,
}

/// ロックコーディネーター
pub struct LockCoordinator<R: RemoteStateRepository> {
    remote: Arc<R>,
    skip_lock: bool,
    reason: String,
}

impl<R: RemoteStateRepository> LockCoordinator<R> {
    /// 新しいコーディネーターを作成
    ///
    /// # Arguments
    ///
    /// * `remote` - リモート状態リポジトリ
    /// * `skip_lock` - `true` の場合、取得・解放とも何もしない
    /// * `reason` - リモートに記録されるロック理由
    pub fn new(remote: Arc<R>, skip_lock: bool, reason: impl Into<String>) -> Self {
        Self {
            remote,
            skip_lock,
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// ロックを取得する
    ///
    /// # Errors
    ///
    /// 既にロックされている場合は [`LockError::Contention`]、
    /// 認証エラーは [`LockError::Unauthorized`]（致命的）
    pub async fn acquire(&self, workspace: &Workspace) -> Result<LockToken, LockError> {
        if self.skip_lock {
            debug!("[{}] Skipping workspace lock", workspace.name);
            return Ok(LockToken::Skipped);
        }

        info!("[{}] Locking workspace", workspace.name);
        self.remote
            .lock(workspace, &self.reason)
            .await
            .map_err(|e| match e {
                RemoteStateError::Conflict(msg) => LockError::Contention(msg),
                RemoteStateError::Unauthorized(msg) => LockError::Unauthorized(msg),
                other => LockError::Remote(other.to_string()),
            })?;

        Ok(LockToken::Held {
            workspace_id: workspace.id.clone(),
            acquired_at: Utc::now(),
        })
    }

    /// ロックを解放する
    pub async fn release(&self, workspace: &Workspace, token: LockToken) -> Result<(), LockError> {
        let LockToken::Held { acquired_at, .. } = token else {
            return Ok(());
        };

        info!("[{}] Unlocking workspace", workspace.name);
        let held_for = Utc::now().signed_duration_since(acquired_at);
        debug!(
            "[{}] Lock held for {}ms",
            workspace.name,
            held_for.num_milliseconds()
        );

        self.remote.unlock(workspace).await.map_err(|e| match e {
            RemoteStateError::Conflict(msg) => LockError::Contention(msg),
            RemoteStateError::Unauthorized(msg) => LockError::Unauthorized(msg),
            other => LockError::Remote(other.to_string()),
        })
    }

    /// ロックを取得して `work` を実行し、必ず解放する
    ///
    /// `work` が panic した場合も解放してから panic を再送出する。
    ///
    /// # Errors
    ///
    /// 取得に失敗した場合のみ。`work` は実行されない。
    pub async fn scoped<T, F, Fut>(
        &self,
        workspace: &Workspace,
        work: F,
    ) -> Result<Scoped<T>, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let token = self.acquire(workspace).await?;
        let held = token.is_held();

        let result = AssertUnwindSafe(work()).catch_unwind().await;
        let release = self.release(workspace, token).await;

        match result {
            Ok(value) => Ok(Scoped {
                value,
                held,
                release,
            }),
            Err(panic) => {
                if let Err(e) = &release {
                    warn!("[{}] Failed to unlock after panic: {}", workspace.name, e);
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::remote_state_repository::MockRemoteStateRepository;

    fn workspace() -> Workspace {
        Workspace::new("ws-1", "petstore_frontend-dev", "petstore-testing")
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock()
            .withf(|ws, reason| ws.id == "ws-1" && reason == "migration")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_unlock().times(1).returning(|_| Ok(()));

        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");
        let token = locks.acquire(&workspace()).await.unwrap();
        assert!(token.is_held());
        assert!(locks.release(&workspace(), token).await.is_ok());
    }

    #[tokio::test]
    async fn test_contention() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock()
            .returning(|_, _| Err(RemoteStateError::Conflict("already locked".into())));
        mock.expect_unlock().never();

        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");
        let err = locks.acquire(&workspace()).await.unwrap_err();
        assert_eq!(err, LockError::Contention("already locked".into()));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_unauthorized_is_fatal() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock()
            .returning(|_, _| Err(RemoteStateError::Unauthorized("401".into())));

        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");
        let err = locks.acquire(&workspace()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_skip_lock_never_calls_remote() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock().never();
        mock.expect_unlock().never();

        let locks = LockCoordinator::new(Arc::new(mock), true, "migration");
        let scoped = locks.scoped(&workspace(), || async { 42 }).await.unwrap();
        assert_eq!(scoped.value, 42);
        assert!(!scoped.held);
        assert!(scoped.release.is_ok());
    }

    #[tokio::test]
    async fn test_scoped_releases_once_on_inner_failure() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock().times(1).returning(|_, _| Ok(()));
        mock.expect_unlock().times(1).returning(|_| Ok(()));

        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");
        let scoped = locks
            .scoped(&workspace(), || async { Err::<(), _>("upload failed") })
            .await
            .unwrap();
        assert!(scoped.held);
        assert!(scoped.value.is_err());
        assert!(scoped.release.is_ok());
    }

    #[tokio::test]
    async fn test_scoped_reports_release_failure() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock().returning(|_, _| Ok(()));
        mock.expect_unlock()
            .times(1)
            .returning(|_| Err(RemoteStateError::Api { status: 500, message: "boom".into() }));

        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");
        let scoped = locks.scoped(&workspace(), || async { "ok" }).await.unwrap();
        assert_eq!(scoped.value, "ok");
        assert!(matches!(scoped.release, Err(LockError::Remote(_))));
    }

    #[tokio::test]
    async fn test_scoped_releases_on_panic() {
        let mut mock = MockRemoteStateRepository::new();
        mock.expect_lock().returning(|_, _| Ok(()));
        mock.expect_unlock().times(1).returning(|_| Ok(()));
        let locks = LockCoordinator::new(Arc::new(mock), false, "migration");

        let explode = true;
        let result = AssertUnwindSafe(locks.scoped(&workspace(), || async move {
            if explode {
                panic!("fetch exploded");
            }
            1
        }))
        .catch_unwind()
        .await;

        assert!(result.is_err());
    }
}
