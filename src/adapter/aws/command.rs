//! External Command Runner
//!
//! 外部コマンド実行の抽象化

use std::io::ErrorKind;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Failure to start a process at all
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("`{0}` was not found on PATH")]
    NotFound(String),
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for running external programs
/// This enables mocking in tests while spawning real processes in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, SpawnError>;
}

/// tokio process runner
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, SpawnError> {
        debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SpawnError::NotFound(program.to_string()),
                _ => SpawnError::Io {
                    program: program.to_string(),
                    source: e,
                },
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
