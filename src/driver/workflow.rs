//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション（依存性注入とサブコマンドの実行）

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use crate::adapter::aws::command::ProcessRunner;
use crate::adapter::config::{expand_path, Config};
use crate::adapter::repositories::aws_cli_object_store_repository::{
    AwsCliObjectStoreRepository, AwsCliOptions,
};
use crate::adapter::repositories::file_state_cache_repository::FileStateCacheRepository;
use crate::adapter::repositories::json_manifest_repository::JsonManifestRepository;
use crate::adapter::repositories::terraform_cloud_repository::TerraformCloudRepository;
use crate::adapter::terraform_cloud::client::TfcHttpClient;
use crate::application::dto::migration_config::{MigrationConfig, WorkspaceSource};
use crate::application::services::state_cache::StateCache;
use crate::application::use_cases::lock_workspaces::LockWorkspacesUseCase;
use crate::application::use_cases::plan_keys::PlanKeysUseCase;
use crate::application::use_cases::run_batch::{BatchReport, BatchRunner};
use crate::domain::services::key_mapper::{KeyMapper, DEFAULT_SUFFIXES};

use super::cli::{Args, Command, KeysArgs, LockAllArgs, MigrateArgs, SourceArgs};

/// Exit code after Ctrl-C (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

/// `"<reason> running by <user>@<host>"`
pub fn compose_lock_reason(reason: &str) -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{} running by {}@{}", reason, user, host)
}

/// Configured suffixes first, then the built-in ones
pub fn build_key_mapper(config: &Config) -> KeyMapper {
    let mut suffixes: Vec<String> = config.extra_suffixes.clone();
    for suffix in DEFAULT_SUFFIXES {
        if !suffixes.iter().any(|s| s.eq_ignore_ascii_case(suffix)) {
            suffixes.push(suffix.to_string());
        }
    }
    KeyMapper::from_suffixes(&suffixes)
}

/// Organization from the CLI, falling back to the config file
pub fn resolve_organization(source: &SourceArgs, config: &Config) -> Result<String> {
    source
        .tfc_org
        .clone()
        .or_else(|| config.tfc_org.clone())
        .filter(|org| !org.trim().is_empty())
        .context("Terraform Cloud organization is required (--tfc-org or tfc_org in config)")
}

pub fn workspace_source(source: &SourceArgs) -> WorkspaceSource {
    match &source.retry_workspaces_file {
        Some(path) => WorkspaceSource::Manifest(path.clone()),
        None => WorkspaceSource::Remote {
            name_filter: source.search_workspace.clone(),
        },
    }
}

/// CLI引数と設定ファイルから移行設定を組み立てる（CLIが優先）
pub fn build_migration_config(args: &MigrateArgs, config: &Config) -> Result<MigrationConfig> {
    let organization = resolve_organization(&args.source, config)?;
    let bucket = args
        .s3_bucket_name
        .clone()
        .or_else(|| config.s3_bucket_name.clone())
        .filter(|b| !b.trim().is_empty())
        .context("Target bucket is required (--s3-bucket-name or s3_bucket_name in config)")?;

    let cache_dir = match &args.cache_dir {
        Some(dir) => Some(expand_path(dir)?),
        None => config.expanded_cache_dir()?,
    };

    let reason = args.lock_reason.as_deref().unwrap_or(&config.lock_reason);

    let mut migration = MigrationConfig::new(organization, bucket);
    migration.skip_lock = args.skip_lock;
    migration.lock_reason = compose_lock_reason(reason);
    migration.cache_dir = cache_dir.map(PathBuf::from);
    migration.source = workspace_source(&args.source);
    migration.limit = args.limit_workspaces;
    migration.dry_run = args.dry_run;
    migration.print_stats = args.stats;
    migration.manifest_path = args
        .manifest_out
        .clone()
        .unwrap_or_else(|| config.manifest_path.clone());
    migration.include_skipped_in_manifest =
        config.include_skipped_in_manifest && !args.exclude_skipped;

    Ok(migration)
}

/// Migration Workflow
pub struct MigrationWorkflow {
    config: Config,
    manifests: Arc<JsonManifestRepository>,
}

impl MigrationWorkflow {
    /// Create a new workflow instance with dependency injection
    pub fn new(config: Config) -> Self {
        Self {
            config,
            manifests: Arc::new(JsonManifestRepository::new()),
        }
    }

    /// Execute the selected subcommand, returning the process exit code
    pub async fn execute(&self, args: Args) -> Result<i32> {
        match args.command {
            Command::Migrate(migrate) => self.migrate(&migrate).await,
            Command::Keys(keys) => self.keys(&keys).await.map(|_| 0),
            Command::LockAll(lock_all) => self.lock_all(&lock_all).await.map(|_| 0),
        }
    }

    fn remote(&self) -> Result<Arc<TerraformCloudRepository>> {
        let token = std::env::var("TFC_TOKEN").ok();
        let address = self.config.resolve_tfc_address();
        let client = TfcHttpClient::new(&address, token)
            .context("Failed to create Terraform Cloud client")?;
        Ok(Arc::new(TerraformCloudRepository::new(Arc::new(client))))
    }

    fn object_store(&self, args: &MigrateArgs) -> Arc<AwsCliObjectStoreRepository> {
        let options = AwsCliOptions {
            server_side_encryption: Some(self.config.server_side_encryption.clone())
                .filter(|sse| !sse.is_empty()),
            region: args.region.clone().or_else(|| self.config.aws_region.clone()),
            profile: args.profile.clone().or_else(|| self.config.aws_profile.clone()),
        };
        Arc::new(AwsCliObjectStoreRepository::new(
            Arc::new(ProcessRunner::new()),
            options,
        ))
    }

    async fn migrate(&self, args: &MigrateArgs) -> Result<i32> {
        let migration = build_migration_config(args, &self.config)?;

        println!("✓ Using configuration:");
        println!("  Organization: {}", migration.organization);
        println!("  Bucket: {}", migration.bucket);
        if migration.dry_run {
            println!("  Dry run: nothing will be written to the bucket");
        }
        if migration.skip_lock {
            println!("⚠ Workspaces will not be locked");
        }

        let cache = match &migration.cache_dir {
            Some(dir) => {
                info!("Caching tfstate and metadata files to {}", dir.display());
                StateCache::new(Arc::new(FileStateCacheRepository::new(dir.clone())))
            }
            None => StateCache::disabled(),
        };

        let (interrupt_tx, interrupt_rx) = watch::channel(false);
        let runner = BatchRunner::new(
            migration,
            self.remote()?,
            self.object_store(args),
            self.manifests.clone(),
            cache,
        )
        .with_key_mapper(build_key_mapper(&self.config))
        .with_interrupt(interrupt_rx);

        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, releasing the current workspace lock");
                let _ = interrupt_tx.send(true);
            }
        });

        let result = runner.run().await;
        signal_task.abort();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                println!("✗ Migration aborted: {}", e);
                return Err(e.into());
            }
        };

        print_report(&report, runner.config());

        if report.interrupted {
            println!("✗ Interrupted");
            return Ok(EXIT_INTERRUPTED);
        }
        Ok(0)
    }

    async fn keys(&self, args: &KeysArgs) -> Result<()> {
        let organization = match &args.source.retry_workspaces_file {
            // The manifest already carries the organization
            Some(_) => resolve_organization(&args.source, &self.config).unwrap_or_default(),
            None => resolve_organization(&args.source, &self.config)?,
        };

        let use_case = PlanKeysUseCase::new(
            self.remote()?,
            self.manifests.clone(),
            build_key_mapper(&self.config),
        );
        let plan = use_case
            .execute(&organization, &workspace_source(&args.source), args.sort)
            .await?;
        let rendered = plan.render(args.output_format.into())?;

        match &args.output_file {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("Failed to write output file: {}", path))?;
                println!("✓ Wrote key plan to {}", path);
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }

    async fn lock_all(&self, args: &LockAllArgs) -> Result<()> {
        let organization = resolve_organization(&args.source, &self.config)?;
        let use_case = LockWorkspacesUseCase::new(self.remote()?, self.manifests.clone());
        let summary = use_case
            .execute(
                &organization,
                &workspace_source(&args.source),
                &args.reason,
                args.dry_run,
            )
            .await?;

        if summary.dry_run {
            println!("✓ Dry-run: would lock {} workspaces", summary.locked.len());
            return Ok(());
        }

        println!("✓ Locked {} workspaces", summary.locked.len());
        if !summary.already_locked.is_empty() {
            println!("⚠ Already locked: {}", summary.already_locked.len());
        }
        for (name, reason) in &summary.failed {
            println!("✗ {}: {}", name, reason);
        }
        if !summary.failed.is_empty() {
            bail!("{} workspaces could not be locked", summary.failed.len());
        }
        Ok(())
    }
}

fn print_report(report: &BatchReport, config: &MigrationConfig) {
    let summary = &report.summary;
    if config.dry_run {
        println!(
            "✓ Dry-run complete: {} of {} workspaces would be uploaded",
            report.planned_uploads.len(),
            summary.processed
        );
    } else {
        println!(
            "✓ Migration complete: {} of {} workspaces uploaded",
            summary.succeeded, summary.processed
        );
    }

    if !report.manifest.is_empty() {
        println!(
            "⚠ {} workspaces did not complete, see {}",
            report.manifest.len(),
            config.manifest_path
        );
    }
    if report.unattempted > 0 {
        println!(
            "⚠ {} workspaces were not attempted before the interrupt",
            report.unattempted
        );
    }
    if summary.lock_release_warnings > 0 {
        println!(
            "⚠ {} workspaces may still be locked",
            summary.lock_release_warnings
        );
    }

    if config.print_stats {
        println!("  Total workspaces: {}", report.total_enumerated);
        println!("  Processed: {}", summary.processed);
        println!("  Succeeded: {}", summary.succeeded);
        println!("  Skipped: {}", summary.skipped);
        println!("  Failed: {}", summary.failed);
        println!("  Cache hits: {}", summary.cache_hits);
    }
}
