//! # State Fetcher
//!
//! リモートサービスから現在の状態ペイロードを取得する
//!
//! 空または壊れたペイロードは成功扱いにしない。空の状態をアップロードすると
//! 移行先の既存オブジェクトを破壊的に上書きしてしまう。

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::domain::entities::state_snapshot::StateSnapshot;
use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::{FetchError, RemoteStateError};
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;

/// 状態フェッチャー
pub struct StateFetcher<R: RemoteStateRepository> {
    remote: Arc<R>,
}

impl<R: RemoteStateRepository> StateFetcher<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// 状態を取得して検証する
    ///
    /// # Errors
    ///
    /// - 状態が保存されていない: [`FetchError::NoState`]
    /// - 空のペイロード: [`FetchError::Empty`]
    /// - Terraform状態として不正: [`FetchError::Malformed`]
    pub async fn fetch(&self, workspace: &Workspace) -> Result<StateSnapshot, FetchError> {
        info!("[{}] Fetching state", workspace.name);

        let snapshot = self
            .remote
            .get_state(workspace)
            .await
            .map_err(|e| match e {
                RemoteStateError::NotFound(_) => FetchError::NoState,
                RemoteStateError::Unauthorized(msg) => FetchError::Unauthorized(msg),
                other => FetchError::Remote(other.to_string()),
            })?;

        validate_payload(&snapshot)?;
        debug!(
            "[{}] Fetched state version {} ({} bytes)",
            workspace.name,
            snapshot.metadata.state_version_id,
            snapshot.size()
        );

        Ok(snapshot)
    }
}

/// ペイロードがTerraform状態として妥当か検証する
///
/// JSONオブジェクトで数値の `version` を持つこと。メタデータと本文の両方に
/// シリアル番号がある場合は一致すること。
pub fn validate_payload(snapshot: &StateSnapshot) -> Result<(), FetchError> {
    if snapshot.payload.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::Empty);
    }

    let document: Value = serde_json::from_slice(&snapshot.payload)
        .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;

    let Some(object) = document.as_object() else {
        return Err(FetchError::Malformed("not a JSON object".to_string()));
    };

    if !object.get("version").is_some_and(Value::is_u64) {
        return Err(FetchError::Malformed(
            "missing numeric `version` field".to_string(),
        ));
    }

    if let (Some(expected), Some(actual)) = (
        snapshot.metadata.serial,
        object.get("serial").and_then(Value::as_i64),
    ) {
        if expected != actual {
            return Err(FetchError::Malformed(format!(
                "serial mismatch: state version says {expected}, payload says {actual}"
            )));
        }
    }

    Ok(())
}
