//! # State Cache
//!
//! 任意のローカルステージング層
//!
//! キャッシュディレクトリが設定されていない場合は無効化され、`get` は常にミスを返す。

use std::sync::Arc;

use log::{debug, warn};

use crate::domain::entities::state_snapshot::StateSnapshot;
use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::CacheError;
use crate::domain::repositories::state_cache_repository::{CacheEntry, StateCacheRepository};

/// 状態キャッシュ
#[derive(Clone)]
pub struct StateCache {
    backend: Option<Arc<dyn StateCacheRepository>>,
}

impl StateCache {
    /// バックエンドを指定して有効なキャッシュを作成
    pub fn new(backend: Arc<dyn StateCacheRepository>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// 無効なキャッシュ
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// エントリを探す
    ///
    /// 読み込みエラーは警告を出してミスとして扱う。
    pub async fn get(&self, workspace: &Workspace) -> Option<CacheEntry> {
        let backend = self.backend.as_ref()?;
        match backend.get(workspace).await {
            Ok(Some(entry)) => {
                debug!(
                    "[{}] Cache hit (cached at {})",
                    workspace.name, entry.cached_at
                );
                Some(entry)
            }
            Ok(None) => {
                debug!("[{}] Cache miss", workspace.name);
                None
            }
            Err(e) => {
                warn!(
                    "[{}] Cache entry unreadable, falling back to remote: {}",
                    workspace.name, e
                );
                None
            }
        }
    }

    /// エントリを書き込む（無効な場合は `Ok(None)`）
    pub async fn put(
        &self,
        workspace: &Workspace,
        snapshot: &StateSnapshot,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(None);
        };
        let entry = backend.put(workspace, snapshot).await?;
        debug!("[{}] Cached {} bytes", workspace.name, snapshot.size());
        Ok(Some(entry))
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::disabled()
    }
}
