//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **Workspace**: 移行元のワークスペース
//! - **DestinationKey**: 移行先オブジェクトキー
//! - **StateSnapshot**: 状態ペイロードとメタデータ
//! - **MigrationOutcome**: ワークスペース単位の移行結果
//! - **RetryManifest**: 再実行用のワークスペース一覧

pub mod destination_key;
pub mod migration_outcome;
pub mod retry_manifest;
pub mod state_snapshot;
pub mod workspace;
