//! AWS CLI Object Store Repository Implementation
//!
//! ObjectStoreRepositoryの `aws s3api put-object` 実装

use async_trait::async_trait;
use log::debug;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::adapter::aws::command::{CommandRunner, SpawnError};
use crate::adapter::aws::errors::classify_stderr;
use crate::domain::errors::ObjectStoreError;
use crate::domain::repositories::object_store_repository::ObjectStoreRepository;

pub const AWS_PROGRAM: &str = "aws";

/// `aws` 呼び出しのオプション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsCliOptions {
    /// `--server-side-encryption`, omitted when `None`
    pub server_side_encryption: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// AWS CLIオブジェクトストアリポジトリ
pub struct AwsCliObjectStoreRepository {
    runner: Arc<dyn CommandRunner>,
    options: AwsCliOptions,
}

impl AwsCliObjectStoreRepository {
    pub fn new(runner: Arc<dyn CommandRunner>, options: AwsCliOptions) -> Self {
        Self { runner, options }
    }

    /// `put-object` の引数を組み立てる
    fn put_object_args(&self, bucket: &str, key: &str, body_path: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "s3api",
            "put-object",
            "--bucket",
            bucket,
            "--key",
            key,
            "--body",
            body_path,
            "--content-type",
            "application/json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(sse) = &self.options.server_side_encryption {
            args.push("--server-side-encryption".to_string());
            args.push(sse.clone());
        }
        if let Some(region) = &self.options.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.options.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

#[async_trait]
impl ObjectStoreRepository for AwsCliObjectStoreRepository {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(), ObjectStoreError> {
        // The body file lives until the command has finished
        let mut body = NamedTempFile::new()
            .map_err(|e| ObjectStoreError::Other(format!("failed to stage payload: {e}")))?;
        body.write_all(payload)
            .and_then(|_| body.flush())
            .map_err(|e| ObjectStoreError::Other(format!("failed to stage payload: {e}")))?;
        let body_path = body.path().to_string_lossy().into_owned();

        let args = self.put_object_args(bucket, key, &body_path);
        let output = self
            .runner
            .run(AWS_PROGRAM, &args)
            .await
            .map_err(|e| match e {
                SpawnError::NotFound(program) => ObjectStoreError::ToolUnavailable(program),
                other => ObjectStoreError::Other(other.to_string()),
            })?;

        if !output.success {
            return Err(classify_stderr(bucket, &output.stderr));
        }

        debug!("put-object s3://{}/{} ok", bucket, key);
        Ok(())
    }
}
