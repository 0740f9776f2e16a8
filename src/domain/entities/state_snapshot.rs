//! # StateSnapshot Entity
//!
//! 取得済みの状態ペイロードとそのメタデータ

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 状態バージョンのメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateMetadata {
    /// 状態バージョンID（例: `sv-abc123`）
    pub state_version_id: String,
    /// 状態のシリアル番号
    pub serial: Option<i64>,
    pub terraform_version: Option<String>,
    pub created_at: Option<String>,
}

/// 状態ペイロードとメタデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub payload: Vec<u8>,
    pub metadata: StateMetadata,
}

impl StateSnapshot {
    pub fn new(payload: Vec<u8>, metadata: StateMetadata) -> Self {
        Self { payload, metadata }
    }

    /// ペイロードのバイト数
    #[inline]
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// ペイロードのSHA-256（16進文字列）
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.payload)
    }
}

/// バイト列のSHA-256を16進文字列で返す
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
