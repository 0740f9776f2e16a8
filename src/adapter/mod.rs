//! Adapter Layer
//!
//! 外部システム（Terraform Cloud API, AWS CLI, ファイルシステム）との統合

pub mod aws;
pub mod config;
pub mod repositories;
pub mod terraform_cloud;
