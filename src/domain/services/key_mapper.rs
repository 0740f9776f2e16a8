//! # Key Mapper Service
//!
//! ワークスペース名から移行先キーを導出するドメインサービス
//!
//! `petstore_frontend-dev` → `env:/dev/petstore_frontend/terraform.tfstate`

use crate::domain::entities::destination_key::DestinationKey;
use crate::domain::errors::ClassificationError;

/// 既定のサフィックス表（優先順）
pub const DEFAULT_SUFFIXES: &[&str] = &["prod", "stg", "dev", "default"];

/// 既定の区切り文字
pub const DEFAULT_SEPARATORS: &[char] = &['-', '_'];

/// S3バックエンドの default ワークスペースを表すサフィックス
const DEFAULT_WORKSPACE: &str = "default";

/// 環境サフィックスの規則
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRule {
    /// 正規化された（小文字の）サフィックス
    suffix: String,
}

impl SuffixRule {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_ascii_lowercase(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn is_default_workspace(&self) -> bool {
        self.suffix == DEFAULT_WORKSPACE
    }
}

/// キーマッパー
///
/// 純粋関数。同じ名前からは常に同じキーが得られる。
#[derive(Debug, Clone)]
pub struct KeyMapper {
    rules: Vec<SuffixRule>,
    separators: Vec<char>,
}

impl KeyMapper {
    /// サフィックス表と区切り文字を指定して作成
    ///
    /// # Arguments
    ///
    /// * `rules` - 優先順に並んだサフィックス規則（先にマッチしたものが勝つ）
    /// * `separators` - ベース名とサフィックスの間に置かれる文字
    pub fn new(rules: Vec<SuffixRule>, separators: Vec<char>) -> Self {
        Self { rules, separators }
    }

    /// サフィックス名のリストから作成
    pub fn from_suffixes<S: AsRef<str>>(suffixes: &[S]) -> Self {
        Self::new(
            suffixes.iter().map(|s| SuffixRule::new(s.as_ref())).collect(),
            DEFAULT_SEPARATORS.to_vec(),
        )
    }

    pub fn rules(&self) -> &[SuffixRule] {
        &self.rules
    }

    /// ワークスペース名を移行先キーに変換
    ///
    /// # Errors
    ///
    /// 既知のサフィックスで終わらない場合、またはベース名が空の場合
    pub fn map(&self, workspace_name: &str) -> Result<DestinationKey, ClassificationError> {
        for rule in &self.rules {
            let Some(head) = self.strip_suffix(workspace_name, rule.suffix()) else {
                continue;
            };
            let Some(base_name) = self.strip_separator(head) else {
                continue;
            };
            if base_name.is_empty() {
                return Err(ClassificationError::EmptyBaseName(workspace_name.to_string()));
            }
            return Ok(if rule.is_default_workspace() {
                DestinationKey::for_default_workspace(base_name)
            } else {
                DestinationKey::for_environment(rule.suffix(), base_name)
            });
        }

        Err(ClassificationError::UnknownSuffix(workspace_name.to_string()))
    }

    /// 大文字小文字を区別せずにサフィックスを取り除く
    fn strip_suffix<'a>(&self, name: &'a str, suffix: &str) -> Option<&'a str> {
        let split = name.len().checked_sub(suffix.len())?;
        if !name.is_char_boundary(split) {
            return None;
        }
        let (head, tail) = name.split_at(split);
        tail.eq_ignore_ascii_case(suffix).then_some(head)
    }

    fn strip_separator<'a>(&self, head: &'a str) -> Option<&'a str> {
        let last = head.chars().last()?;
        self.separators
            .contains(&last)
            .then(|| &head[..head.len() - last.len_utf8()])
    }
}

impl Default for KeyMapper {
    fn default() -> Self {
        Self::from_suffixes(DEFAULT_SUFFIXES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_dev_workspace() {
        let key = KeyMapper::default().map("petstore_frontend-dev").unwrap();
        assert_eq!(key.as_str(), "env:/dev/petstore_frontend/terraform.tfstate");
    }

    #[test]
    fn test_map_known_environments() {
        let mapper = KeyMapper::default();
        assert_eq!(
            mapper.map("billing-prod").unwrap().as_str(),
            "env:/prod/billing/terraform.tfstate"
        );
        assert_eq!(
            mapper.map("billing_stg").unwrap().as_str(),
            "env:/stg/billing/terraform.tfstate"
        );
    }

    #[test]
    fn test_map_default_workspace_has_no_prefix() {
        let key = KeyMapper::default().map("billing-default").unwrap();
        assert_eq!(key.as_str(), "billing/terraform.tfstate");
    }

    #[test]
    fn test_map_is_case_insensitive_and_canonical() {
        let key = KeyMapper::default().map("Billing-PROD").unwrap();
        assert_eq!(key.as_str(), "env:/prod/Billing/terraform.tfstate");
    }

    #[test]
    fn test_map_is_deterministic() {
        let mapper = KeyMapper::default();
        let names = ["a-dev", "svc_api-prod", "x-y-z-stg", "core-default"];
        for name in names {
            assert_eq!(mapper.map(name).unwrap(), mapper.map(name).unwrap());
        }
    }

    #[test]
    fn test_map_unknown_suffix() {
        let err = KeyMapper::default().map("weird-name-xyz").unwrap_err();
        assert_eq!(err, ClassificationError::UnknownSuffix("weird-name-xyz".to_string()));
    }

    #[test]
    fn test_map_requires_separator() {
        let mapper = KeyMapper::default();
        assert!(mapper.map("devprod").is_err());
        assert!(mapper.map("dev").is_err());
        assert!(mapper.map("frontend.dev").is_err());
    }

    #[test]
    fn test_map_empty_base_name() {
        let err = KeyMapper::default().map("-dev").unwrap_err();
        assert_eq!(err, ClassificationError::EmptyBaseName("-dev".to_string()));
    }

    #[test]
    fn test_map_unknown_names_never_yield_key() {
        let mapper = KeyMapper::default();
        for name in ["", "-", "prod-", "service", "svc-qa", "svc-production", "ñandú-dév"] {
            assert!(mapper.map(name).is_err(), "{name} should not classify");
        }
    }

    #[test]
    fn test_suffix_priority() {
        // `api-test_dev` matches both `dev` and `test_dev`
        let specific_first = KeyMapper::from_suffixes(&["test_dev", "dev"]);
        let key = specific_first.map("api-test_dev").unwrap();
        assert_eq!(key.as_str(), "env:/test_dev/api/terraform.tfstate");

        let generic_first = KeyMapper::from_suffixes(&["dev", "test_dev"]);
        let key = generic_first.map("api-test_dev").unwrap();
        assert_eq!(key.as_str(), "env:/dev/api-test/terraform.tfstate");

        for _ in 0..3 {
            assert_eq!(
                specific_first.map("api-test_dev").unwrap().environment(),
                "test_dev"
            );
        }
    }

    #[test]
    fn test_custom_separators() {
        let mapper = KeyMapper::new(vec![SuffixRule::new("dev")], vec!['.']);
        assert_eq!(
            mapper.map("frontend.dev").unwrap().as_str(),
            "env:/dev/frontend/terraform.tfstate"
        );
        assert!(mapper.map("frontend-dev").is_err());
    }
}
