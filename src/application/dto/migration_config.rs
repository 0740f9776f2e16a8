//! # Migration Configuration DTO
//!
//! 移行バッチの設定のData Transfer Object

use std::path::PathBuf;

/// 既定のマニフェスト出力先
pub const DEFAULT_MANIFEST_PATH: &str = "skipped_workspaces.json";

/// ワークスペースの列挙元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSource {
    /// リモートサービスから列挙（任意のあいまい検索）
    Remote { name_filter: Option<String> },
    /// 以前の実行が書き出したマニフェストから読み込む
    Manifest(String),
}

/// 移行設定
///
/// CLI層が組み立てて BatchRunner に渡す。グローバル状態は持たない。
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// 移行元の組織名
    pub organization: String,
    /// 移行先バケット名
    pub bucket: String,
    /// ロックを取らない（高速だが競合の危険がある）
    pub skip_lock: bool,
    /// ロック理由
    pub lock_reason: String,
    /// キャッシュディレクトリ（`None` ならキャッシュ無効）
    pub cache_dir: Option<PathBuf>,
    pub source: WorkspaceSource,
    /// 処理するワークスペース数の上限（0 = 無制限）
    pub limit: usize,
    pub dry_run: bool,
    /// 最後に集計を表示する
    pub print_stats: bool,
    /// マニフェストの出力先
    pub manifest_path: String,
    /// 分類できなかったワークスペースもマニフェストに含める
    pub include_skipped_in_manifest: bool,
}

impl MigrationConfig {
    /// 既定値で新しい設定を作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use tfshift::application::dto::migration_config::{MigrationConfig, WorkspaceSource};
    ///
    /// let config = MigrationConfig::new("petstore-testing", "petstore-terraform-states");
    ///
    /// assert_eq!(config.limit, 0);
    /// assert!(!config.dry_run);
    /// assert!(config.cache_dir.is_none());
    /// assert_eq!(config.source, WorkspaceSource::Remote { name_filter: None });
    /// ```
    pub fn new(organization: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            bucket: bucket.into(),
            skip_lock: false,
            lock_reason: String::from("TFC to S3 migration"),
            cache_dir: None,
            source: WorkspaceSource::Remote { name_filter: None },
            limit: 0,
            dry_run: false,
            print_stats: false,
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            include_skipped_in_manifest: true,
        }
    }

    /// 上限が有効かどうか
    #[inline]
    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_config_new() {
        let config = MigrationConfig::new("acme", "states");

        assert_eq!(config.organization, "acme");
        assert_eq!(config.bucket, "states");
        assert!(!config.skip_lock);
        assert!(!config.is_limited());
        assert!(config.include_skipped_in_manifest);
        assert_eq!(config.manifest_path, DEFAULT_MANIFEST_PATH);
    }

    #[test]
    fn test_migration_config_limit() {
        let mut config = MigrationConfig::new("acme", "states");
        config.limit = 3;
        assert!(config.is_limited());
    }
}
