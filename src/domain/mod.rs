//! # Domain Layer
//!
//! このモジュールは移行処理の核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - 外部システムについて何も知らない
//! - リモートAPI・オブジェクトストア・ファイルシステムはtraitとしてのみ現れる
//! - 純粋なビジネスロジック
//!
//! ## 構成要素
//!
//! - **entities**: ビジネスエンティティ（Workspace, DestinationKeyなど）
//! - **errors**: エラー分類
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: Domain Service（KeyMapper）

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;
