//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **EnumerateWorkspacesUseCase**: 処理対象ワークスペースの列挙
//! - **BatchRunner**: 移行バッチの実行
//! - **PlanKeysUseCase**: 環境ごとの移行先キーの確認
//! - **LockWorkspacesUseCase**: 移行後の一括ロック

pub mod enumerate_workspaces;
pub mod lock_workspaces;
pub mod plan_keys;
pub mod run_batch;
