//! # Batch Runner
//!
//! 移行バッチのオーケストレーション
//!
//! 各ワークスペースを順番に次の状態遷移で処理する:
//!
//! ```text
//! Pending → Classified → Locked → Fetched → Uploaded → Unlocked → Done(succeeded)
//!    │            │          │         │
//!    └ skipped    └──────────┴─────────┴─→ Done(failed, reason)
//! ```
//!
//! ロックを取得できた場合、`Locked → Unlocked` の区間は [`LockCoordinator::scoped`] で
//! 包まれ、アップロードの成否・中断・panic に関わらず解放される。
//! ワークスペース単位のエラーはバッチを止めない。成功しなかったワークスペースは
//! 最後にリトライマニフェストとして書き出される。

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::application::dto::migration_config::MigrationConfig;
use crate::application::services::lock_coordinator::{LockCoordinator, Scoped};
use crate::application::services::state_cache::StateCache;
use crate::application::services::state_fetcher::StateFetcher;
use crate::application::services::uploader::{PlannedUpload, Uploader};
use crate::application::use_cases::enumerate_workspaces::EnumerateWorkspacesUseCase;
use crate::domain::entities::destination_key::DestinationKey;
use crate::domain::entities::migration_outcome::{
    FailureReason, MigrationOutcome, MigrationStage, MigrationSummary, OutcomeStatus,
};
use crate::domain::entities::retry_manifest::RetryManifest;
use crate::domain::entities::workspace::Workspace;
use crate::domain::errors::MigrationError;
use crate::domain::repositories::manifest_repository::ManifestRepository;
use crate::domain::repositories::object_store_repository::ObjectStoreRepository;
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;
use crate::domain::services::key_mapper::KeyMapper;

/// バッチ実行の結果
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// 処理順の結果
    pub outcomes: Vec<MigrationOutcome>,
    pub summary: MigrationSummary,
    /// 書き出したリトライマニフェスト
    pub manifest: RetryManifest,
    /// 上限適用前に列挙されたワークスペース数
    pub total_enumerated: usize,
    /// 中断されて途中で止まったかどうか
    pub interrupted: bool,
    /// 中断により手を付けなかったワークスペース数（マニフェストに含まれる）
    pub unattempted: usize,
    /// ドライランで記録されたアップロード予定
    pub planned_uploads: Vec<PlannedUpload>,
}

/// ロック区間内の処理結果
#[derive(Debug)]
struct Transfer {
    cache_hit: bool,
    bytes: usize,
}

#[derive(Debug)]
enum TransferError {
    Failed {
        stage: MigrationStage,
        reason: FailureReason,
    },
    Fatal(String),
}

impl TransferError {
    fn at(stage: MigrationStage, reason: FailureReason, fatal: bool) -> Self {
        if fatal {
            TransferError::Fatal(reason.to_string())
        } else {
            TransferError::Failed { stage, reason }
        }
    }
}

/// バッチランナー
pub struct BatchRunner<R, O, M>
where
    R: RemoteStateRepository,
    O: ObjectStoreRepository,
    M: ManifestRepository,
{
    config: MigrationConfig,
    key_mapper: KeyMapper,
    enumerate: EnumerateWorkspacesUseCase<R, M>,
    locks: LockCoordinator<R>,
    fetcher: StateFetcher<R>,
    cache: StateCache,
    uploader: Uploader<O>,
    manifests: Arc<M>,
    interrupt: Option<watch::Receiver<bool>>,
}

impl<R, O, M> BatchRunner<R, O, M>
where
    R: RemoteStateRepository,
    O: ObjectStoreRepository,
    M: ManifestRepository,
{
    /// 新しいランナーを作成
    ///
    /// # Arguments
    ///
    /// * `config` - 移行設定
    /// * `remote` - リモート状態リポジトリ（列挙・ロック・取得）
    /// * `store` - オブジェクトストアリポジトリ
    /// * `manifests` - マニフェストリポジトリ
    /// * `cache` - 状態キャッシュ（無効でもよい）
    pub fn new(
        config: MigrationConfig,
        remote: Arc<R>,
        store: Arc<O>,
        manifests: Arc<M>,
        cache: StateCache,
    ) -> Self {
        let locks = LockCoordinator::new(
            remote.clone(),
            config.skip_lock,
            config.lock_reason.clone(),
        );
        let uploader = Uploader::new(store, config.bucket.clone(), config.dry_run);

        Self {
            key_mapper: KeyMapper::default(),
            enumerate: EnumerateWorkspacesUseCase::new(remote.clone(), manifests.clone()),
            locks,
            fetcher: StateFetcher::new(remote),
            cache,
            uploader,
            manifests,
            interrupt: None,
            config,
        }
    }

    /// サフィックス表を差し替える
    pub fn with_key_mapper(mut self, key_mapper: KeyMapper) -> Self {
        self.key_mapper = key_mapper;
        self
    }

    /// 中断シグナルを受け取る（`true` になったら中断）
    pub fn with_interrupt(mut self, interrupt: watch::Receiver<bool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// バッチを実行する
    ///
    /// # Errors
    ///
    /// 列挙の失敗、マニフェストの書き込み失敗、設定レベルの致命的エラー。
    /// 致命的エラーの場合、保持していたロックは解放済みでマニフェストは書き出されない。
    pub async fn run(&self) -> Result<BatchReport, MigrationError> {
        if self.config.dry_run {
            info!(" === DRY RUN MODE === ");
        }

        let enumeration = self
            .enumerate
            .execute(
                &self.config.organization,
                &self.config.source,
                self.config.limit,
            )
            .await?;
        let count = enumeration.workspaces.len();
        info!(
            "Processing {} of {} workspaces",
            count, enumeration.total
        );

        let mut outcomes = Vec::with_capacity(count);
        let mut interrupted = false;
        let mut pending = enumeration.workspaces.into_iter().peekable();

        while pending.peek().is_some() {
            if self.is_interrupted() {
                interrupted = true;
                break;
            }
            let Some(workspace) = pending.next() else {
                break;
            };

            let outcome = self.migrate_workspace(workspace).await?;
            let stop = matches!(
                outcome.status,
                OutcomeStatus::Failed(FailureReason::Interrupted)
            );
            log_outcome(&outcome);
            outcomes.push(outcome);
            info!("Processed: {} out of {}", outcomes.len(), count);

            if stop {
                interrupted = true;
                break;
            }
        }

        // Never attempted; a rerun from the manifest must still cover them
        let unattempted: Vec<Workspace> = pending
            .filter(|ws| {
                self.config.include_skipped_in_manifest || self.key_mapper.map(&ws.name).is_ok()
            })
            .collect();
        if interrupted {
            warn!(
                "Interrupted; stopping after {} workspaces, {} left unattempted",
                outcomes.len(),
                unattempted.len()
            );
        }

        let mut manifest =
            RetryManifest::from_outcomes(&outcomes, self.config.include_skipped_in_manifest);
        let unattempted_count = unattempted.len();
        manifest.extend(unattempted);
        info!(
            "Saving list of {} unresolved workspaces to file: {}",
            manifest.len(),
            self.config.manifest_path
        );
        self.manifests
            .save(&self.config.manifest_path, &manifest)
            .await
            .map_err(|e| MigrationError::ManifestWrite(format!("{e:#}")))?;

        Ok(BatchReport {
            summary: MigrationSummary::from_outcomes(&outcomes),
            outcomes,
            manifest,
            total_enumerated: enumeration.total,
            interrupted,
            unattempted: unattempted_count,
            planned_uploads: self.uploader.planned_uploads(),
        })
    }

    /// 1つのワークスペースを状態遷移に沿って処理する
    ///
    /// # Errors
    ///
    /// 設定レベルの致命的エラーのみ。それ以外は結果として返す。
    pub async fn migrate_workspace(
        &self,
        workspace: Workspace,
    ) -> Result<MigrationOutcome, MigrationError> {
        let name = workspace.name.clone();

        // Pending → Classified
        let key = match self.key_mapper.map(&name) {
            Ok(key) => key,
            Err(e) => return Ok(MigrationOutcome::skipped(workspace, e)),
        };
        transition(&name, MigrationStage::Pending, MigrationStage::Classified);
        debug!("[{}] Destination key: {}", name, key);

        // Classified → Locked → Fetched → Uploaded → Unlocked
        let scoped = match self
            .locks
            .scoped(&workspace, || self.transfer(&workspace, &key))
            .await
        {
            Ok(scoped) => scoped,
            Err(e) if e.is_fatal() => {
                return Err(MigrationError::Fatal {
                    workspace: name,
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                return Ok(MigrationOutcome::failed(
                    workspace,
                    key,
                    MigrationStage::Classified,
                    e.into(),
                ))
            }
        };

        let Scoped {
            value,
            held,
            release,
        } = scoped;

        let release_warning = match release {
            Ok(()) => {
                if held {
                    transition(&name, MigrationStage::Uploaded, MigrationStage::Unlocked);
                }
                None
            }
            Err(e) => {
                warn!("[{}] Failed to unlock workspace: {}", name, e);
                Some(e.to_string())
            }
        };

        // Unlocked → Done
        let mut outcome = match value {
            Ok(transfer) => {
                let mut outcome = MigrationOutcome::succeeded(workspace, key, transfer.bytes);
                outcome.cache_hit = transfer.cache_hit;
                outcome
            }
            Err(TransferError::Fatal(reason)) => {
                return Err(MigrationError::Fatal {
                    workspace: name,
                    reason,
                })
            }
            Err(TransferError::Failed { stage, reason }) => {
                MigrationOutcome::failed(workspace, key, stage, reason)
            }
        };
        outcome.lock_release_warning = release_warning;

        Ok(outcome)
    }

    /// ロック区間内の処理（キャッシュ確認 → 取得 → アップロード）
    async fn transfer(
        &self,
        workspace: &Workspace,
        key: &DestinationKey,
    ) -> Result<Transfer, TransferError> {
        let work = async {
            transition(&workspace.name, MigrationStage::Classified, MigrationStage::Locked);

            // Locked → Fetched
            let (snapshot, cache_hit) = match self.cache.get(workspace).await {
                Some(entry) => {
                    info!("[{}] Using cached tfstate", workspace.name);
                    (entry.snapshot, true)
                }
                None => {
                    let snapshot = self.fetcher.fetch(workspace).await.map_err(|e| {
                        let fatal = e.is_fatal();
                        TransferError::at(MigrationStage::Locked, e.into(), fatal)
                    })?;
                    if self.config.dry_run {
                        debug!("[{}] Dry run; not caching tfstate", workspace.name);
                    } else if let Err(e) = self.cache.put(workspace, &snapshot).await {
                        warn!("[{}] Failed to cache tfstate: {}", workspace.name, e);
                    }
                    (snapshot, false)
                }
            };
            transition(&workspace.name, MigrationStage::Locked, MigrationStage::Fetched);

            // Fetched → Uploaded
            let receipt = self
                .uploader
                .upload(key, &snapshot.payload)
                .await
                .map_err(|e| {
                    let fatal = e.is_fatal();
                    TransferError::at(MigrationStage::Fetched, e.into(), fatal)
                })?;
            transition(&workspace.name, MigrationStage::Fetched, MigrationStage::Uploaded);

            Ok::<_, TransferError>(Transfer {
                cache_hit,
                bytes: receipt.size_bytes,
            })
        };

        let Some(mut interrupt) = self.interrupt.clone() else {
            return work.await;
        };

        tokio::select! {
            result = work => result,
            _ = wait_for_interrupt(&mut interrupt) => {
                warn!("[{}] Interrupted; abandoning in-flight work", workspace.name);
                Err(TransferError::Failed {
                    stage: MigrationStage::Locked,
                    reason: FailureReason::Interrupted,
                })
            }
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// 中断されるまで待つ（送信側が破棄された場合は永久に待つ）
async fn wait_for_interrupt(interrupt: &mut watch::Receiver<bool>) {
    if interrupt.wait_for(|interrupted| *interrupted).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn transition(workspace: &str, from: MigrationStage, to: MigrationStage) {
    debug!("[{}] {} -> {}", workspace, from, to);
}

fn log_outcome(outcome: &MigrationOutcome) {
    let name = &outcome.workspace.name;
    match &outcome.status {
        OutcomeStatus::Succeeded => {
            if let Some(key) = &outcome.key {
                info!("[{}] Migrated to {}", name, key);
            }
        }
        OutcomeStatus::Skipped(e) => warn!("[{}] Skipped: {}", name, e),
        OutcomeStatus::Failed(e) => {
            warn!("[{}] Failed after stage {}: {}", name, outcome.stage, e)
        }
    }
}
