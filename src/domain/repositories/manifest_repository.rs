//! # Manifest Repository Trait
//!
//! リトライマニフェストの永続化を抽象化

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::retry_manifest::RetryManifest;

/// マニフェストリポジトリ
#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// マニフェストを読み込む
    ///
    /// # Arguments
    ///
    /// * `path` - マニフェストファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルが存在しない、または読み込み・パースに失敗した場合にエラーを返す
    async fn load(&self, path: &str) -> Result<RetryManifest>;

    /// マニフェストを保存する
    ///
    /// # Arguments
    ///
    /// * `path` - マニフェストファイルのパス
    /// * `manifest` - 保存するマニフェスト
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す
    async fn save(&self, path: &str, manifest: &RetryManifest) -> Result<()>;
}
