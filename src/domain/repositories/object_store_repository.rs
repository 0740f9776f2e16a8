//! # Object Store Repository Trait
//!
//! 移行先オブジェクトストアへの書き込みを抽象化

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::errors::ObjectStoreError;

/// オブジェクトストアリポジトリ
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStoreRepository: Send + Sync {
    /// `bucket` の `key` にペイロードを書き込む（既存オブジェクトは上書き）
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(), ObjectStoreError>;
}
