//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod aws_cli_object_store_repository;
pub mod file_state_cache_repository;
pub mod json_manifest_repository;
pub mod terraform_cloud_repository;
