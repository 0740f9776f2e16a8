//! Terraform Cloud Adapter Modules
//!
//! Terraform Cloud API（JSON:API）との統合

pub mod client;
pub mod models;
