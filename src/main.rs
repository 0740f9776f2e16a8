//! tfshift - Terraform Cloud to S3 state migration
//!
//! Terraform Cloud の状態を S3 バックエンドへ移行

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use anyhow::Result;
use clap::Parser;

use tfshift::adapter::config::Config;
use tfshift::driver::{Args, MigrationWorkflow};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    tfshift::init_logging();

    let args = Args::parse();

    // Load configuration
    let config = Config::load_or_default(args.config.as_deref())?;

    // Create workflow with injected dependencies
    let workflow = MigrationWorkflow::new(config);

    let code = workflow.execute(args).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
