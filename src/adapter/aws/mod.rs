//! AWS CLI Adapter Modules
//!
//! `aws` コマンド経由のオブジェクトストア統合

pub mod command;
pub mod errors;
