//! File State Cache Repository Implementation
//!
//! StateCacheRepositoryのファイルシステム実装
//!
//! ```text
//! <cache_dir>/<workspace-name>/terraform.tfstate
//! <cache_dir>/<workspace-name>/metadata.json
//! ```
//!
//! メタデータは最後に書き込まれ、エントリが完全であることを示す。

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::domain::entities::destination_key::STATE_FILE_NAME;
use crate::domain::entities::state_snapshot::{fingerprint, StateMetadata, StateSnapshot};
use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::CacheError;
use crate::domain::repositories::state_cache_repository::{CacheEntry, StateCacheRepository};

const METADATA_FILE_NAME: &str = "metadata.json";

/// キャッシュエントリのメタデータ（JSON永続化用の内部表現）
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
struct EntryMetadataJson {
    workspace: String,
    organization: String,
    state_version_id: String,
    serial: Option<i64>,
    terraform_version: Option<String>,
    created_at: Option<String>,
    sha256: String,
    size: usize,
    cached_at: String,
}

/// ファイルベースの状態キャッシュ
pub struct FileStateCacheRepository {
    root: PathBuf,
}

impl FileStateCacheRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// エントリのディレクトリ（名前がパスとして安全でない場合はエラー）
    fn entry_dir(root: &Path, name: &str) -> Result<PathBuf, CacheError> {
        let unsafe_name = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0');
        if unsafe_name {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(root.join(name))
    }

    fn io_error(path: &Path, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// エントリを読み込む（同期処理）
    fn get_sync(root: &Path, workspace: &Workspace) -> Result<Option<CacheEntry>, CacheError> {
        let dir = Self::entry_dir(root, &workspace.name)?;
        let metadata_path = dir.join(METADATA_FILE_NAME);
        let state_path = dir.join(STATE_FILE_NAME);

        let raw = match fs::read_to_string(&metadata_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&metadata_path, e)),
        };

        let metadata: EntryMetadataJson = match serde_json::from_str(&raw) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    "[{}] Ignoring cache entry with unreadable metadata: {}",
                    workspace.name, e
                );
                return Ok(None);
            }
        };

        let payload = match fs::read(&state_path) {
            Ok(payload) => payload,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("[{}] Ignoring cache entry without payload", workspace.name);
                return Ok(None);
            }
            Err(e) => return Err(Self::io_error(&state_path, e)),
        };

        if payload.len() != metadata.size || fingerprint(&payload) != metadata.sha256 {
            warn!(
                "[{}] Ignoring cache entry whose payload does not match its metadata",
                workspace.name
            );
            return Ok(None);
        }

        Ok(Some(CacheEntry {
            workspace: metadata.workspace,
            snapshot: StateSnapshot::new(
                payload,
                StateMetadata {
                    state_version_id: metadata.state_version_id,
                    serial: metadata.serial,
                    terraform_version: metadata.terraform_version,
                    created_at: metadata.created_at,
                },
            ),
            cached_at: metadata.cached_at,
        }))
    }

    /// エントリを書き込む（同期処理）
    fn put_sync(
        root: &Path,
        workspace: &Workspace,
        snapshot: &StateSnapshot,
    ) -> Result<CacheEntry, CacheError> {
        let dir = Self::entry_dir(root, &workspace.name)?;
        create_private_dir(&dir).map_err(|e| Self::io_error(&dir, e))?;

        let cached_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let metadata = EntryMetadataJson {
            workspace: workspace.name.clone(),
            organization: workspace.organization.clone(),
            state_version_id: snapshot.metadata.state_version_id.clone(),
            serial: snapshot.metadata.serial,
            terraform_version: snapshot.metadata.terraform_version.clone(),
            created_at: snapshot.metadata.created_at.clone(),
            sha256: snapshot.fingerprint(),
            size: snapshot.size(),
            cached_at: cached_at.clone(),
        };
        let metadata_json = serde_json::to_vec_pretty(&metadata)?;

        let state_path = dir.join(STATE_FILE_NAME);
        atomic_write(&state_path, &snapshot.payload).map_err(|e| Self::io_error(&state_path, e))?;

        let metadata_path = dir.join(METADATA_FILE_NAME);
        atomic_write(&metadata_path, &metadata_json)
            .map_err(|e| Self::io_error(&metadata_path, e))?;

        Ok(CacheEntry {
            workspace: workspace.name.clone(),
            snapshot: snapshot.clone(),
            cached_at,
        })
    }
}

#[async_trait]
impl StateCacheRepository for FileStateCacheRepository {
    async fn get(&self, workspace: &Workspace) -> Result<Option<CacheEntry>, CacheError> {
        let root = self.root.clone();
        let workspace = workspace.clone();
        tokio::task::spawn_blocking(move || Self::get_sync(&root, &workspace))
            .await
            .map_err(|e| Self::io_error(&self.root, std::io::Error::other(e)))?
    }

    async fn put(
        &self,
        workspace: &Workspace,
        snapshot: &StateSnapshot,
    ) -> Result<CacheEntry, CacheError> {
        let root = self.root.clone();
        let workspace = workspace.clone();
        let snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || Self::put_sync(&root, &workspace, &snapshot))
            .await
            .map_err(|e| Self::io_error(&self.root, std::io::Error::other(e)))?
    }
}

/// 0700 でディレクトリを作成する（Unix）
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// 同じディレクトリの一時ファイル（0600）に書いてから置き換える
///
/// 失敗した場合の一時ファイルは破棄される。
fn atomic_write(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(name: &str) -> Workspace {
        Workspace::new("ws-1", name, "petstore-testing")
    }

    fn snapshot(body: &str) -> StateSnapshot {
        StateSnapshot::new(
            body.as_bytes().to_vec(),
            StateMetadata {
                state_version_id: "sv-1".to_string(),
                serial: Some(5),
                terraform_version: Some("1.5.7".to_string()),
                created_at: None,
            },
        )
    }

    #[test]
    fn test_put_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace("petstore_frontend-dev");

        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("{\"version\":4}"))
            .unwrap();

        let entry = FileStateCacheRepository::get_sync(temp_dir.path(), &ws)
            .unwrap()
            .unwrap();
        assert_eq!(entry.snapshot.payload, b"{\"version\":4}".to_vec());
        assert_eq!(entry.snapshot.metadata.serial, Some(5));
        assert_eq!(entry.workspace, "petstore_frontend-dev");

        let dir = temp_dir.path().join("petstore_frontend-dev");
        assert!(dir.join("terraform.tfstate").exists());
        assert!(dir.join("metadata.json").exists());
    }

    #[test]
    fn test_miss_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let entry = FileStateCacheRepository::get_sync(temp_dir.path(), &workspace("api-dev")).unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn test_later_put_replaces_entry() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace("api-dev");
        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("first")).unwrap();
        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("second")).unwrap();

        let entry = FileStateCacheRepository::get_sync(temp_dir.path(), &ws)
            .unwrap()
            .unwrap();
        assert_eq!(entry.snapshot.payload, b"second".to_vec());

        // No temp files are left behind
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("api-dev"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_tampered_payload_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace("api-dev");
        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("{\"version\":4}"))
            .unwrap();
        fs::write(
            temp_dir.path().join("api-dev").join("terraform.tfstate"),
            "{\"version\":5}",
        )
        .unwrap();

        assert!(FileStateCacheRepository::get_sync(temp_dir.path(), &ws)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_payload_without_metadata_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("api-dev");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("terraform.tfstate"), "{}").unwrap();

        assert!(
            FileStateCacheRepository::get_sync(temp_dir.path(), &workspace("api-dev"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_corrupt_metadata_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("api-dev");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("terraform.tfstate"), "{}").unwrap();
        fs::write(dir.join("metadata.json"), "{ truncated").unwrap();

        assert!(
            FileStateCacheRepository::get_sync(temp_dir.path(), &workspace("api-dev"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_rejects_path_like_names() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["..", ".", "a/b", "a\\b"] {
            let err = FileStateCacheRepository::put_sync(temp_dir.path(), &workspace(name), &snapshot("{}"))
                .unwrap_err();
            assert!(matches!(err, CacheError::InvalidName(_)), "{name}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        FileStateCacheRepository::put_sync(temp_dir.path(), &workspace("api-dev"), &snapshot("{}"))
            .unwrap();

        let dir = temp_dir.path().join("api-dev");
        let dir_mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(dir.join("terraform.tfstate"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
        assert_eq!(file_mode, 0o600);
    }

    #[test]
    fn test_put_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace("api-dev");
        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("{}")).unwrap();
        FileStateCacheRepository::put_sync(temp_dir.path(), &ws, &snapshot("{\"version\":4}"))
            .unwrap();

        let mut names: Vec<String> = fs::read_dir(temp_dir.path().join("api-dev"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["metadata.json", "terraform.tfstate"]);
    }

    #[tokio::test]
    async fn test_survives_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace("api-prod");

        FileStateCacheRepository::new(temp_dir.path())
            .put(&ws, &snapshot("{\"version\":4}"))
            .await
            .unwrap();

        let entry = FileStateCacheRepository::new(temp_dir.path())
            .get(&ws)
            .await
            .unwrap();
        assert!(entry.is_some());
    }
}
