//! # tfshift
//!
//! Terraform Cloud のワークスペース状態を S3 バックエンドへ移行するツール
//!
//! このプロジェクトはクリーンアーキテクチャを採用しており、以下の4層で構成されています：
//!
//! - **Domain層**: キー導出規則・エンティティ・エラー分類（外部依存なし）
//! - **Application層**: ロック・取得・キャッシュ・アップロードとバッチ実行（ユースケース）
//! - **Adapter層**: 外部システムとの統合（Terraform Cloud API, AWS CLI, ファイルシステム）
//! - **Driver層**: CLI、依存性注入

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
// カバレッジ計測時に外部サービス依存コードを除外するために使用
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

// Domain層（純粋なビジネスロジック）
pub mod domain;

// Application層（ユースケース）
pub mod application;

// Adapter層（Infrastructure）
pub mod adapter;

// Driver層（Presentation）
pub mod driver;

/// `LOG_LEVEL`（なければ `RUST_LOG`）でログを初期化する。既定は `info`。
pub fn init_logging() {
    let filter = std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(|level| level.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());

    env_logger::Builder::new()
        .parse_filters(&filter)
        .format_timestamp_secs()
        .init();
}
