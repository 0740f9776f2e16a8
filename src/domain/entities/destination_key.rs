//! # DestinationKey Value Object
//!
//! 移行先オブジェクトキー

use std::fmt;

/// S3バックエンドの状態ファイル名
pub const STATE_FILE_NAME: &str = "terraform.tfstate";

/// S3バックエンドの `workspace_key_prefix` 既定値
pub const WORKSPACE_KEY_PREFIX: &str = "env:";

/// 移行先オブジェクトキー
///
/// ワークスペース名から決定的に導出される。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationKey {
    environment: String,
    base_name: String,
    key: String,
}

impl DestinationKey {
    /// 名前付き環境のキー: `env:/<environment>/<base-name>/terraform.tfstate`
    pub fn for_environment(environment: &str, base_name: &str) -> Self {
        Self {
            environment: environment.to_string(),
            base_name: base_name.to_string(),
            key: format!("{WORKSPACE_KEY_PREFIX}/{environment}/{base_name}/{STATE_FILE_NAME}"),
        }
    }

    /// `default` ワークスペースのキー: `<base-name>/terraform.tfstate`
    ///
    /// S3バックエンドは default ワークスペースをプレフィックスなしで保存する。
    pub fn for_default_workspace(base_name: &str) -> Self {
        Self {
            environment: "default".to_string(),
            base_name: base_name.to_string(),
            key: format!("{base_name}/{STATE_FILE_NAME}"),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for DestinationKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
