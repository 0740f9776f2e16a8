//! # Data Transfer Objects

pub mod migration_config;
