//! # RetryManifest Value Object
//!
//! 移行が完了しなかったワークスペースの一覧（再実行用）

use serde::{Deserialize, Serialize};

use super::migration_outcome::MigrationOutcome;
use super::workspace::Workspace;

/// リトライマニフェスト
///
/// JSONではワークスペースの配列としてそのまま永続化される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryManifest {
    workspaces: Vec<Workspace>,
}

impl RetryManifest {
    pub fn new(workspaces: Vec<Workspace>) -> Self {
        Self { workspaces }
    }

    /// 成功しなかったワークスペースを処理順に集める
    ///
    /// # Arguments
    ///
    /// * `outcomes` - バッチの結果
    /// * `include_skipped` - 分類できなかったワークスペースも含めるかどうか
    pub fn from_outcomes(outcomes: &[MigrationOutcome], include_skipped: bool) -> Self {
        let workspaces = outcomes
            .iter()
            .filter(|o| !o.is_succeeded())
            .filter(|o| include_skipped || !o.is_skipped())
            .map(|o| o.workspace.clone())
            .collect();
        Self { workspaces }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn into_workspaces(self) -> Vec<Workspace> {
        self.workspaces
    }

    pub fn names(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.name.as_str()).collect()
    }
}

/// 末尾に追加する（順序は保たれる）
impl Extend<Workspace> for RetryManifest {
    fn extend<I: IntoIterator<Item = Workspace>>(&mut self, iter: I) {
        self.workspaces.extend(iter);
    }
}

impl From<Vec<Workspace>> for RetryManifest {
    fn from(workspaces: Vec<Workspace>) -> Self {
        Self::new(workspaces)
    }
}
