//! JSON Manifest Repository Implementation
//!
//! ManifestRepositoryのJSON実装（リトライマニフェストをJSONファイルで永続化）

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::fs;
use std::path::Path;

use crate::domain::entities::retry_manifest::RetryManifest;
use crate::domain::repositories::manifest_repository::ManifestRepository;

/// JSONファイルベースのマニフェストリポジトリ
pub struct JsonManifestRepository;

impl JsonManifestRepository {
    /// 新しいリポジトリを作成
    pub fn new() -> Self {
        Self
    }

    /// ファイルからマニフェストを読み込む（同期処理）
    fn load_sync(path: &str) -> Result<RetryManifest> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read retry manifest file: {}", path))?;

        let manifest: RetryManifest =
            serde_json::from_str(&content).context("Failed to parse retry manifest JSON")?;

        info!("Loaded retry manifest: {} workspaces", manifest.len());

        Ok(manifest)
    }

    /// ファイルにマニフェストを保存する（同期処理）
    ///
    /// 空のマニフェストも `[]` として書き出す。
    fn save_sync(path: &str, manifest: &RetryManifest) -> Result<()> {
        let path = Path::new(path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create manifest directory")?;
        }

        let json =
            serde_json::to_string_pretty(manifest).context("Failed to serialize retry manifest")?;

        fs::write(path, json).context("Failed to write retry manifest file")?;

        info!("Saved retry manifest: {} workspaces", manifest.len());

        Ok(())
    }
}

#[async_trait]
impl ManifestRepository for JsonManifestRepository {
    async fn load(&self, path: &str) -> Result<RetryManifest> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))?
    }

    async fn save(&self, path: &str, manifest: &RetryManifest) -> Result<()> {
        let path = path.to_string();
        let manifest = manifest.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &manifest))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))??;

        Ok(())
    }
}

impl Default for JsonManifestRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::workspace::Workspace;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_nonexistent_file() {
        let err = JsonManifestRepository::load_sync("/nonexistent/path/skipped.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read retry manifest file"));
    }

    #[test]
    fn test_load_valid_manifest() {
        let mut file = NamedTempFile::new().unwrap();
        let json = r#"[
            {"id": "ws-1", "name": "petstore_frontend-dev", "organization": "petstore-testing"},
            {"id": "ws-2", "name": "weird-name-xyz", "organization": "petstore-testing", "locked": true}
        ]"#;
        file.write_all(json.as_bytes()).unwrap();

        let manifest = JsonManifestRepository::load_sync(file.path().to_str().unwrap()).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.names(), vec!["petstore_frontend-dev", "weird-name-xyz"]);
        assert_eq!(manifest.workspaces()[1].locked, Some(true));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"not\": \"a list\"}").unwrap();
        assert!(JsonManifestRepository::load_sync(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_save_empty_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("skipped_workspaces.json");

        JsonManifestRepository::save_sync(path.to_str().unwrap(), &RetryManifest::default())
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("retry.json");
        let path = path.to_str().unwrap();

        let manifest = RetryManifest::new(vec![Workspace::new("ws-9", "api-stg", "acme")]);
        let repo = JsonManifestRepository::new();
        repo.save(path, &manifest).await.unwrap();

        let loaded = repo.load(path).await.unwrap();
        assert_eq!(loaded, manifest);
    }
}
