//! # Plan Keys Use Case
//!
//! 移行前の確認用に、ワークスペースを環境ごとにグループ化する
//!
//! 何も書き込まず、ロックもしない。

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::dto::migration_config::WorkspaceSource;
use crate::application::use_cases::enumerate_workspaces::EnumerateWorkspacesUseCase;
use crate::domain::entities::workspace::Workspace;
use crate::domain::repositories::manifest_repository::ManifestRepository;
use crate::domain::repositories::remote_state_repository::RemoteStateRepository;
use crate::domain::services::key_mapper::KeyMapper;

/// 分類できなかった名前のグループ名
pub const UNCLASSIFIED_GROUP: &str = "unclassified";

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPlanFormat {
    /// `<env>\t<base>` を1行ずつ
    #[default]
    Text,
    /// `{"<env>": ["<base>", ...]}`
    Json,
}

/// 環境ごとのベース名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPlan {
    groups: BTreeMap<String, Vec<String>>,
}

impl KeyPlan {
    /// ワークスペース名をグループ化する（入力順を保つ）
    pub fn from_workspaces(mapper: &KeyMapper, workspaces: &[Workspace]) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for workspace in workspaces {
            let (group, base) = match mapper.map(&workspace.name) {
                Ok(key) => (key.environment().to_string(), key.base_name().to_string()),
                Err(_) => (UNCLASSIFIED_GROUP.to_string(), workspace.name.clone()),
            };
            groups.entry(group).or_default().push(base);
        }
        Self { groups }
    }

    /// 各グループ内のベース名をソートする
    pub fn sorted(mut self) -> Self {
        for bases in self.groups.values_mut() {
            bases.sort();
        }
        self
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn get(&self, environment: &str) -> Option<&[String]> {
        self.groups.get(environment).map(Vec::as_slice)
    }

    /// 出力形式に従って文字列化する
    ///
    /// # Errors
    ///
    /// JSONシリアライズに失敗した場合
    pub fn render(&self, format: KeyPlanFormat) -> Result<String> {
        match format {
            KeyPlanFormat::Text => {
                let mut out = String::new();
                for (environment, bases) in &self.groups {
                    for base in bases {
                        out.push_str(environment);
                        out.push('\t');
                        out.push_str(base);
                        out.push('\n');
                    }
                }
                Ok(out)
            }
            KeyPlanFormat::Json => {
                let mut out = serde_json::to_string(&self.groups)
                    .context("Failed to serialize key plan")?;
                out.push('\n');
                Ok(out)
            }
        }
    }
}

/// キー計画ユースケース
pub struct PlanKeysUseCase<R: RemoteStateRepository, M: ManifestRepository> {
    enumerate: EnumerateWorkspacesUseCase<R, M>,
    mapper: KeyMapper,
}

impl<R: RemoteStateRepository, M: ManifestRepository> PlanKeysUseCase<R, M> {
    pub fn new(remote: Arc<R>, manifests: Arc<M>, mapper: KeyMapper) -> Self {
        Self {
            enumerate: EnumerateWorkspacesUseCase::new(remote, manifests),
            mapper,
        }
    }

    /// ワークスペースを列挙してグループ化する
    ///
    /// # Arguments
    ///
    /// * `organization` - 組織名
    /// * `source` - 列挙元
    /// * `sort` - グループ内をソートするかどうか
    pub async fn execute(
        &self,
        organization: &str,
        source: &WorkspaceSource,
        sort: bool,
    ) -> Result<KeyPlan> {
        let enumeration = self.enumerate.execute(organization, source, 0).await?;
        let plan = KeyPlan::from_workspaces(&self.mapper, &enumeration.workspaces);
        Ok(if sort { plan.sorted() } else { plan })
    }
}
