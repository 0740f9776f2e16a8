//! # Application Services
//!
//! 外部コラボレーターを包むワークスペース単位の処理部品
//!
//! - **LockCoordinator**: 勧告ロックの取得・解放
//! - **StateFetcher**: 状態ペイロードの取得と検証
//! - **StateCache**: 任意のローカルキャッシュ
//! - **Uploader**: 移行先への書き込み（ドライラン対応）

pub mod lock_coordinator;
pub mod state_cache;
pub mod state_fetcher;
pub mod uploader;
