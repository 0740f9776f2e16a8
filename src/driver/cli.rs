//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::application::use_cases::lock_workspaces::FREEZE_LOCK_REASON;
use crate::application::use_cases::plan_keys::KeyPlanFormat;

/// Terraform Cloud の状態を S3 バックエンドへ移行するCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "tfshift", version)]
#[command(
    about = "Migrate Terraform state from Terraform Cloud to Amazon S3",
    long_about = "Migrate Terraform state from Terraform Cloud to Amazon S3.\n\n\
                  WARNING: existing objects in the target bucket are overwritten. \
                  Back up the bucket or enable object versioning first.",
    after_help = "Environment variables:\n  \
                  TFC_TOKEN    API token (required)\n  \
                  TFC_ADDRESS  API address (default: https://app.terraform.io)\n  \
                  LOG_LEVEL    log filter (default: info)"
)]
pub struct Args {
    /// Config file path (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Copy each workspace's current state into the bucket
    Migrate(MigrateArgs),
    /// Show the destination key of every workspace, grouped by environment
    Keys(KeysArgs),
    /// Lock every workspace so nobody keeps writing to the old backend
    LockAll(LockAllArgs),
}

/// Where workspaces come from
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Terraform Cloud organization
    #[arg(short = 't', long)]
    pub tfc_org: Option<String>,

    /// Only workspaces matching this name (the API matches fuzzily)
    #[arg(short = 'w', long, conflicts_with = "retry_workspaces_file")]
    pub search_workspace: Option<String>,

    /// Run against the workspaces listed in a retry manifest
    #[arg(short = 'r', long)]
    pub retry_workspaces_file: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Target bucket
    #[arg(short = 'b', long)]
    pub s3_bucket_name: Option<String>,

    /// Do not lock workspaces (faster, but state may change mid-copy)
    #[arg(short = 's', long)]
    pub skip_lock: bool,

    /// Directory for cached state payloads (disabled when omitted)
    #[arg(short = 'd', long)]
    pub cache_dir: Option<String>,

    /// Process at most this many workspaces (0 = no limit)
    #[arg(short = 'l', long, default_value_t = 0)]
    pub limit_workspaces: usize,

    /// Do not write to the bucket, only show what would be uploaded
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print statistics at the end
    #[arg(long)]
    pub stats: bool,

    /// Leave unclassifiable workspaces out of the retry manifest
    #[arg(long)]
    pub exclude_skipped: bool,

    /// Where to write the retry manifest
    #[arg(long)]
    pub manifest_out: Option<String>,

    /// Lock reason recorded on each workspace
    #[arg(long)]
    pub lock_reason: Option<String>,

    /// AWS region passed to the aws CLI
    #[arg(long)]
    pub region: Option<String>,

    /// AWS profile passed to the aws CLI
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<OutputFormat> for KeyPlanFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => KeyPlanFormat::Text,
            OutputFormat::Json => KeyPlanFormat::Json,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct KeysArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Sort base names within each environment
    #[arg(long)]
    pub sort: bool,

    /// Write to this file instead of stdout
    #[arg(short = 'o', long)]
    pub output_file: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LockAllArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Lock reason recorded on each workspace
    #[arg(long, default_value = FREEZE_LOCK_REASON)]
    pub reason: String,

    /// Only show what would be locked
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
