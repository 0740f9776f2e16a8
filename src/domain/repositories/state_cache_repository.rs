//! # State Cache Repository Trait
//!
//! ダウンロード済み状態のローカルキャッシュを抽象化

use async_trait::async_trait;

use crate::domain::entities::state_snapshot::StateSnapshot;
use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::CacheError;

/// キャッシュエントリ
///
/// ペイロードとメタデータの両方が書き込まれて初めて存在する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub workspace: String,
    pub snapshot: StateSnapshot,
    /// RFC 3339
    pub cached_at: String,
}

/// 状態キャッシュリポジトリ
#[async_trait]
pub trait StateCacheRepository: Send + Sync {
    /// 完全なエントリがあれば返す（破損・書きかけのエントリはミス扱い）
    async fn get(&self, workspace: &Workspace) -> Result<Option<CacheEntry>, CacheError>;

    /// エントリを書き込む（同じワークスペースの既存エントリは上書き）
    ///
    /// プロセスが途中で中断されても、書きかけのエントリがヒットとして見えてはならない。
    async fn put(
        &self,
        workspace: &Workspace,
        snapshot: &StateSnapshot,
    ) -> Result<CacheEntry, CacheError>;
}
