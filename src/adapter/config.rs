//! Configuration
//!
//! 設定ファイル（JSON）の読み込み。すべての項目に既定値があり、CLI引数で上書きされる。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::application::dto::migration_config::DEFAULT_MANIFEST_PATH;

pub const DEFAULT_TFC_ADDRESS: &str = "https://app.terraform.io";
pub const DEFAULT_SERVER_SIDE_ENCRYPTION: &str = "aws:kms";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Terraform Cloud organization
    pub tfc_org: Option<String>,
    /// Destination bucket
    pub s3_bucket_name: Option<String>,
    /// API base URL, overridden by `TFC_ADDRESS`
    pub tfc_address: String,
    /// Lock reason recorded on the remote; host and user are appended
    pub lock_reason: String,
    pub manifest_path: String,
    pub include_skipped_in_manifest: bool,
    pub cache_dir: Option<String>,
    /// `aws:kms`, `AES256`, or empty to let the bucket default apply
    pub server_side_encryption: String,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    /// Extra environment suffixes, checked before the built-in ones
    pub extra_suffixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tfc_org: None,
            s3_bucket_name: None,
            tfc_address: DEFAULT_TFC_ADDRESS.to_string(),
            lock_reason: "TFC to S3 migration".to_string(),
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            include_skipped_in_manifest: true,
            cache_dir: None,
            server_side_encryption: DEFAULT_SERVER_SIDE_ENCRYPTION.to_string(),
            aws_region: None,
            aws_profile: None,
            extra_suffixes: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }

    /// `path` が指定されていれば読み込み、なければ既定値
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// `TFC_ADDRESS` で上書きした API アドレス
    pub fn resolve_tfc_address(&self) -> String {
        std::env::var("TFC_ADDRESS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.tfc_address.clone())
    }

    /// 設定ファイルの cache_dir を展開する（`~` と環境変数）
    pub fn expanded_cache_dir(&self) -> Result<Option<String>> {
        self.cache_dir
            .as_deref()
            .map(expand_path)
            .transpose()
    }
}

/// `~` と `$VAR` を展開する
pub fn expand_path(path: &str) -> Result<String> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {}", path))?;
    Ok(expanded.into_owned())
}
