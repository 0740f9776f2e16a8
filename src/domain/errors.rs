//! # Domain Errors
//!
//! 移行処理のエラー分類
//!
//! ワークスペース単位のエラー（分類・ロック・取得・アップロード）はバッチを中断しない。
//! 設定レベルの障害（認証情報なし、バケットなし等）のみが [`MigrationError::Fatal`] として
//! 実行全体を停止させる。

use thiserror::Error;

/// ワークスペース名から移行先キーを導出できなかった
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("workspace name `{0}` does not end with a known environment suffix")]
    UnknownSuffix(String),
    #[error("workspace name `{0}` has an empty base name")]
    EmptyBaseName(String),
}

/// リモート状態サービスの呼び出し結果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteStateError {
    /// 401/403 or a missing token
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// 409, e.g. workspace already locked
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("remote API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// オブジェクトストアの呼び出し結果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    #[error("bucket `{0}` does not exist")]
    BucketNotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("object store tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("object store error: {0}")]
    Other(String),
}

impl ObjectStoreError {
    /// ワークスペース単位でリカバリできない障害かどうか
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            ObjectStoreError::BucketNotFound(_)
                | ObjectStoreError::AccessDenied(_)
                | ObjectStoreError::ToolUnavailable(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// 他の利用者が既にロックしている（再実行で解決しうる）
    #[error("lock contention: {0}")]
    Contention(String),
    #[error("lock error: {0}")]
    Remote(String),
    #[error("not authorized to lock: {0}")]
    Unauthorized(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("workspace has no stored state")]
    NoState,
    #[error("state payload is empty")]
    Empty,
    #[error("state payload is malformed: {0}")]
    Malformed(String),
    #[error("failed to fetch state: {0}")]
    Remote(String),
    #[error("not authorized to read state: {0}")]
    Unauthorized(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Store(String),
    /// バケットが存在しない・認証情報がない等
    #[error("object store misconfigured: {0}")]
    Configuration(String),
}

impl LockError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, LockError::Unauthorized(_))
    }
}

impl FetchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Unauthorized(_))
    }
}

impl UploadError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, UploadError::Configuration(_))
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("workspace name `{0}` cannot be used as a cache entry")]
    InvalidName(String),
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// バッチ全体を停止させるエラー
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("fatal configuration error while processing `{workspace}`: {reason}")]
    Fatal { workspace: String, reason: String },
    #[error("failed to enumerate workspaces: {0}")]
    Enumeration(String),
    #[error("failed to read retry manifest: {0}")]
    ManifestRead(String),
    #[error("failed to write retry manifest: {0}")]
    ManifestWrite(String),
}
