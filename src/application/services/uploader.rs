//! # Uploader
//!
//! 移行先ストアへの状態ペイロードの書き込み
//!
//! ドライランでは書き込みの代わりに予定（キーとサイズ）を記録する。
//! オーケストレーターから見た結果の分類は実際の書き込みと同じ。

use std::sync::{Arc, Mutex};

use log::info;

use crate::domain::entities::destination_key::DestinationKey;
use crate::domain::errors::{ObjectStoreError, UploadError};
use crate::domain::repositories::object_store_repository::ObjectStoreRepository;

/// ドライランで記録されるアップロード予定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub bucket: String,
    pub key: String,
    pub size_bytes: usize,
}

/// アップロード結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub size_bytes: usize,
    pub dry_run: bool,
}

/// アップローダー
pub struct Uploader<O: ObjectStoreRepository> {
    store: Arc<O>,
    bucket: String,
    dry_run: bool,
    planned: Mutex<Vec<PlannedUpload>>,
}

impl<O: ObjectStoreRepository> Uploader<O> {
    /// 新しいアップローダーを作成
    ///
    /// # Arguments
    ///
    /// * `store` - オブジェクトストアリポジトリ
    /// * `bucket` - 移行先バケット
    /// * `dry_run` - `true` の場合は書き込まずに予定だけ記録する
    pub fn new(store: Arc<O>, bucket: impl Into<String>, dry_run: bool) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            dry_run,
            planned: Mutex::new(Vec::new()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[inline]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// ペイロードを `key` に書き込む
    ///
    /// # Errors
    ///
    /// バケットなし・認証失敗は [`UploadError::Configuration`]（致命的）、
    /// それ以外は [`UploadError::Store`]
    pub async fn upload(
        &self,
        key: &DestinationKey,
        payload: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        let receipt = UploadReceipt {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            size_bytes: payload.len(),
            dry_run: self.dry_run,
        };

        if self.dry_run {
            info!(
                "Would upload tfstate to bucket {}: {} ({} bytes)",
                self.bucket,
                key,
                payload.len()
            );
            self.planned
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(PlannedUpload {
                    bucket: receipt.bucket.clone(),
                    key: receipt.key.clone(),
                    size_bytes: receipt.size_bytes,
                });
            return Ok(receipt);
        }

        self.store
            .put_object(&self.bucket, key.as_str(), payload)
            .await
            .map_err(|e| {
                if e.is_configuration_fault() {
                    UploadError::Configuration(e.to_string())
                } else {
                    match e {
                        ObjectStoreError::Other(msg) => UploadError::Store(msg),
                        other => UploadError::Store(other.to_string()),
                    }
                }
            })?;

        info!("Uploaded tfstate to bucket {}: {}", self.bucket, key);
        Ok(receipt)
    }

    /// ドライランで記録されたアップロード予定
    pub fn planned_uploads(&self) -> Vec<PlannedUpload> {
        self.planned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
