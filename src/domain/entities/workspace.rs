//! # Workspace Entity
//!
//! 移行元サービスのワークスペース

use serde::{Deserialize, Serialize};

/// ワークスペース
///
/// 名前で一意に識別される。1回の移行試行の間は不変。
/// リトライマニフェストにはこの形のまま書き出される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// リモートサービス上のID（例: `ws-abc123`）
    pub id: String,
    /// ワークスペース名（識別子）
    pub name: String,
    /// 所属する組織
    pub organization: String,
    /// 列挙時点でのロック状態（不明な場合は `None`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl Workspace {
    /// 新しいワークスペースを作成
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization: organization.into(),
            locked: None,
        }
    }
}

/// ワークスペース列挙の条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceQuery {
    pub organization: String,
    /// あいまい検索（リモートAPIは部分一致で返す）
    pub name: Option<String>,
}

impl WorkspaceQuery {
    pub fn new(organization: impl Into<String>, name: Option<String>) -> Self {
        Self {
            organization: organization.into(),
            name,
        }
    }
}
