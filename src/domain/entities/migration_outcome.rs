//! # MigrationOutcome Entity
//!
//! ワークスペース単位の移行結果

use std::fmt;

use thiserror::Error;

use super::destination_key::DestinationKey;
use super::workspace::Workspace;
use crate::domain::errors::{ClassificationError, FetchError, LockError, UploadError};

/// ワークスペース移行の状態遷移
///
/// `Pending → Classified → Locked → Fetched → Uploaded → Unlocked → Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MigrationStage {
    Pending,
    Classified,
    Locked,
    Fetched,
    Uploaded,
    Unlocked,
    Done,
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStage::Pending => "pending",
            MigrationStage::Classified => "classified",
            MigrationStage::Locked => "locked",
            MigrationStage::Fetched => "fetched",
            MigrationStage::Uploaded => "uploaded",
            MigrationStage::Unlocked => "unlocked",
            MigrationStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// 失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("interrupted")]
    Interrupted,
}

/// 結果の分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    /// 名前を分類できなかった（ロックは一度も試みていない）
    Skipped(ClassificationError),
    Failed(FailureReason),
}

/// ワークスペース単位の移行結果
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub workspace: Workspace,
    pub key: Option<DestinationKey>,
    pub status: OutcomeStatus,
    /// 最後に到達した状態
    pub stage: MigrationStage,
    pub cache_hit: bool,
    /// アップロードした（ドライランではアップロード予定の）バイト数
    pub bytes: Option<usize>,
    /// ロック解除の失敗（結果を失敗に格下げしない）
    pub lock_release_warning: Option<String>,
}

impl MigrationOutcome {
    /// 分類できなかったワークスペースの結果
    pub fn skipped(workspace: Workspace, error: ClassificationError) -> Self {
        Self {
            workspace,
            key: None,
            status: OutcomeStatus::Skipped(error),
            stage: MigrationStage::Pending,
            cache_hit: false,
            bytes: None,
            lock_release_warning: None,
        }
    }

    /// 失敗したワークスペースの結果
    pub fn failed(
        workspace: Workspace,
        key: DestinationKey,
        stage: MigrationStage,
        reason: FailureReason,
    ) -> Self {
        Self {
            workspace,
            key: Some(key),
            status: OutcomeStatus::Failed(reason),
            stage,
            cache_hit: false,
            bytes: None,
            lock_release_warning: None,
        }
    }

    /// 成功したワークスペースの結果
    pub fn succeeded(workspace: Workspace, key: DestinationKey, bytes: usize) -> Self {
        Self {
            workspace,
            key: Some(key),
            status: OutcomeStatus::Succeeded,
            stage: MigrationStage::Done,
            cache_hit: false,
            bytes: Some(bytes),
            lock_release_warning: None,
        }
    }

    #[inline]
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped(_))
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }

    /// 人が読むための理由（成功時は `None`）
    pub fn reason(&self) -> Option<String> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Skipped(e) => Some(e.to_string()),
            OutcomeStatus::Failed(e) => Some(e.to_string()),
        }
    }
}

/// バッチ全体の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub lock_release_warnings: usize,
}

impl MigrationSummary {
    /// 結果のリストから集計を作成
    pub fn from_outcomes(outcomes: &[MigrationOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, o| {
            acc.processed += 1;
            match o.status {
                OutcomeStatus::Succeeded => acc.succeeded += 1,
                OutcomeStatus::Skipped(_) => acc.skipped += 1,
                OutcomeStatus::Failed(_) => acc.failed += 1,
            }
            if o.cache_hit {
                acc.cache_hits += 1;
            }
            if o.lock_release_warning.is_some() {
                acc.lock_release_warnings += 1;
            }
            acc
        })
    }
}
